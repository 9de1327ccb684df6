//! Robots.txt handling module
//!
//! The site's robots.txt is fetched once per run. Each candidate page is then
//! checked against it with its own URL before it is scraped.

mod gate;
mod parser;

pub use gate::CrawlPolicyGate;
pub use parser::ParsedRobots;

use crate::{Result, TrawlError};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Supplies the robots.txt policy of a website
#[async_trait]
pub trait PolicySource: Send + Sync {
    /// Fetches the policy for a homepage of the form `scheme://host/`
    async fn fetch_policy(&self, homepage: &str) -> Result<ParsedRobots>;
}

/// Fetches robots.txt over HTTP
///
/// A 2xx response is parsed, a 4xx response means there is no policy and
/// everything is allowed. Transport failures and 5xx responses are errors.
#[derive(Debug, Clone)]
pub struct HttpPolicySource {
    client: Client,
}

impl HttpPolicySource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PolicySource for HttpPolicySource {
    async fn fetch_policy(&self, homepage: &str) -> Result<ParsedRobots> {
        let url = robots_url(homepage);
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| TrawlError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|source| TrawlError::Http { url, source })?;
            Ok(ParsedRobots::from_content(&body))
        } else if status.is_client_error() {
            debug!("{} returned {}, allowing all", url, status);
            Ok(ParsedRobots::allow_all())
        } else {
            Err(TrawlError::Robots(format!("{} returned status {}", url, status)))
        }
    }
}

/// Builds the robots.txt URL for a homepage
pub fn robots_url(homepage: &str) -> String {
    format!("{}/robots.txt", homepage.trim_end_matches('/'))
}

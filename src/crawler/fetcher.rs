//! Page fetching
//!
//! This module handles the page requests of a scrape run:
//! - Building the HTTP client with the configured user agent
//! - GET requests for page HTML
//! - Classifying failures into per-page extraction errors

use crate::config::Config;
use crate::recipe::ExtractError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Fetches page HTML
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ExtractError>;
}

/// Builds the client shared by every request of a run
///
/// Requests carry the configured user agent and request timeout; responses
/// may be gzip or brotli encoded.
///
/// # Example
///
/// ```no_run
/// use recipe_trawl::config::load_config;
/// use recipe_trawl::crawler::build_http_client;
/// use std::path::Path;
///
/// let config = load_config(Path::new("trawl.toml")).unwrap();
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(Duration::from_secs(config.scraper.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages with a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    /// GETs a page
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx with HTML or no Content-Type | Body |
    /// | 2xx with other Content-Type | Fetch error |
    /// | Non-2xx status | Fetch error |
    /// | Timeout or connection failure | Fetch error |
    async fn fetch(&self, url: &str) -> Result<String, ExtractError> {
        let fail = |message: String| ExtractError::Fetch {
            url: url.to_string(),
            message,
        };

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                fail("Request timeout".to_string())
            } else if e.is_connect() {
                fail("Connection refused".to_string())
            } else {
                fail(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("HTTP {}", status)));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.is_empty() && !content_type.contains("html") {
            return Err(fail(format!("Unexpected Content-Type {}", content_type)));
        }

        response.text().await.map_err(|e| fail(e.to_string()))
    }
}

use crate::robots::{ParsedRobots, PolicySource};
use tracing::{debug, warn};

/// Answers whether a page may be fetched under the site's robots.txt
#[derive(Debug, Clone)]
pub struct CrawlPolicyGate {
    robots: ParsedRobots,
    user_agent: String,
}

impl CrawlPolicyGate {
    pub fn new(robots: ParsedRobots, user_agent: impl Into<String>) -> Self {
        Self {
            robots,
            user_agent: user_agent.into(),
        }
    }

    pub fn allow_all(user_agent: impl Into<String>) -> Self {
        Self::new(ParsedRobots::allow_all(), user_agent)
    }

    /// Loads the policy for `homepage`
    ///
    /// A policy that cannot be retrieved degrades to allow-all with a warning
    /// instead of aborting the run.
    pub async fn load(source: &dyn PolicySource, homepage: &str, user_agent: &str) -> Self {
        match source.fetch_policy(homepage).await {
            Ok(robots) => {
                debug!("Loaded robots.txt policy for {}", homepage);
                Self::new(robots, user_agent)
            }
            Err(e) => {
                warn!(
                    "Unable to retrieve robots.txt for {}, treating every page as allowed: {}",
                    homepage, e
                );
                Self::allow_all(user_agent)
            }
        }
    }

    /// True if the page URL may be fetched
    pub fn can_fetch(&self, url: &str) -> bool {
        self.robots.is_allowed(url, &self.user_agent)
    }

    /// Crawl delay requested for this agent, in seconds
    pub fn crawl_delay(&self) -> Option<f64> {
        self.robots.crawl_delay(&self.user_agent)
    }

    pub fn robots(&self) -> &ParsedRobots {
        &self.robots
    }
}

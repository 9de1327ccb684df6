use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default file name of the exclusion store
pub const DEFAULT_EXCLUSIONS_FILE: &str = "_recipe_scraper_exclusions.json";

/// Main configuration structure for Recipe-Trawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scraper: ScraperConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

/// Scrape run behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Homepage of the site to scrape, e.g. "https://example.com"
    pub homepage: String,

    /// Flush progress to disk every N processed pages
    #[serde(rename = "batch-size", default)]
    pub batch_size: Option<usize>,

    /// Maximum number of live page fetches in flight
    #[serde(rename = "max-concurrent-fetches", default = "default_concurrency")]
    pub max_concurrent_fetches: u32,

    /// Timeout for a single HTTP request (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_timeout")]
    pub request_timeout_secs: u64,
}

fn default_concurrency() -> u32 {
    1
}

fn default_timeout() -> u64 {
    30
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output and input file configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// JSON file the recipe database is written to
    #[serde(rename = "output-file", default)]
    pub output_file: Option<String>,

    /// JSON file holding the output of a previous run
    #[serde(rename = "input-file", default)]
    pub input_file: Option<String>,

    /// JSON file holding the per-homepage exclusion lists
    #[serde(rename = "exclusions-file", default)]
    pub exclusions_file: Option<String>,
}

impl OutputConfig {
    /// Resolves where the exclusion store lives
    ///
    /// An explicit `exclusions-file` wins; otherwise the default file name is
    /// placed next to the output file, or in the working directory.
    pub fn exclusions_path(&self) -> PathBuf {
        if let Some(path) = &self.exclusions_file {
            return PathBuf::from(path);
        }

        let dir = self
            .output_file
            .as_deref()
            .and_then(|f| Path::new(f).parent())
            .map(Path::to_path_buf)
            .unwrap_or_default();

        dir.join(DEFAULT_EXCLUSIONS_FILE)
    }
}

/// Additional keywords appended to the built-in filter tables
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    #[serde(rename = "sitemap-keywords", default)]
    pub sitemap_keywords: Vec<String>,

    #[serde(rename = "url-keywords", default)]
    pub url_keywords: Vec<String>,
}

/// Recipe extractor configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractorConfig {
    /// Hosts with dedicated extraction support
    #[serde(rename = "supported-hosts", default)]
    pub supported_hosts: Vec<String>,
}

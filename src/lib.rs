//! Recipe-Trawl: a sitemap-driven recipe harvester
//!
//! This crate walks a website's sitemap tree, filters out pages that cannot hold
//! a recipe, checks each remaining page against robots.txt and scrapes schema.org
//! recipe data into an incremental, resumable JSON database keyed by page URL.

pub mod config;
pub mod crawler;
pub mod output;
pub mod recipe;
pub mod robots;
pub mod sitemap;
pub mod state;
pub mod storage;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Recipe-Trawl operations
#[derive(Debug, Error)]
pub enum TrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error(
        "Unable to retrieve sitemaps for {homepage} (fetched as {stripped_homepage}): {source}"
    )]
    Sitemap {
        homepage: String,
        stripped_homepage: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Robots.txt error: {0}")]
    Robots(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised for malformed input snapshots or conflicting input options
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Unable to determine whether to use input from the config input-file or --input. Please use only 1 input option")]
    Conflicting,

    #[error("Input file must be of json format, e.g. 'example.json': {0}")]
    NotJson(String),

    #[error("Provided input {0} is not a valid JSON object")]
    NotAnObject(String),

    #[error("Reserved key '{0}' must hold an array of URL strings")]
    InvalidReservedKey(String),
}

/// URL-specific errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("URL is empty.")]
    Empty,

    #[error("Scheme must be set. Please prefix http:// or https://")]
    MissingScheme,

    #[error("Scheme must be http:// or https://")]
    InvalidScheme(String),

    #[error("Cannot determine domain name from {0}")]
    MissingDomain(String),

    #[error("Invalid URL: {0}")]
    Malformed(String),

    #[error("Unable to parse URL {url}: {message}")]
    Parse { url: String, message: String },
}

/// Result type alias for Recipe-Trawl operations
pub type Result<T> = std::result::Result<T, TrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{scrape_site, Coordinator};
pub use recipe::{RecipeRecord, RecipesDatabase, PAGES_WITHOUT_RECIPE_KEY};
pub use sitemap::{Page, PageSet, SitemapNode, SitemapWalker, UrlClassifier};
pub use state::PageOutcome;
pub use url::{extract_domain, is_valid_url, strip_url_to_homepage};

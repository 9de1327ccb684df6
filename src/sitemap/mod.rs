//! Sitemap discovery module
//!
//! This module turns a site's sitemap tree into the set of pages worth
//! scraping:
//! - `SitemapSource` supplies the raw tree (the HTTP implementation reads
//!   robots.txt declarations and well-known sitemap locations)
//! - `UrlClassifier` decides which sub-sitemaps and page URLs cannot hold recipes
//! - `SitemapWalker` walks the tree and splits it into kept pages and filtered URLs

mod classifier;
mod fetcher;
mod page;
mod walker;
mod xml;

pub use classifier::{UrlClassifier, SITEMAP_FILTER_KEYWORDS, URL_FILTER_KEYWORDS};
pub use fetcher::{HttpSitemapSource, MAX_SITEMAP_DEPTH};
pub use page::{Page, PageSet, SitemapNode};
pub use walker::{discover_pages, SitemapWalk, SitemapWalker, MAX_WALK_DEPTH};
pub use xml::{normalize_last_modified, parse_sitemap, SitemapDocument};

use crate::Result;
use async_trait::async_trait;

/// Supplies the sitemap tree of a website
#[async_trait]
pub trait SitemapSource: Send + Sync {
    /// Fetches the sitemap tree for a homepage URL (already stripped to `scheme://host/`)
    async fn fetch_tree(&self, homepage: &str) -> Result<SitemapNode>;
}

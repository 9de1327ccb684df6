//! HTTP sitemap source
//!
//! Candidate sitemaps come from `Sitemap:` lines in robots.txt followed by the
//! well-known locations. Each sitemap URL is fetched at most once per tree.

use crate::robots::{robots_url, ParsedRobots};
use crate::sitemap::{parse_sitemap, SitemapDocument, SitemapNode, SitemapSource};
use crate::{Result, TrawlError};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use std::collections::HashSet;
use std::io::Read;
use tracing::{debug, warn};

/// Maximum nesting of sitemap indexes followed from a top-level sitemap
pub const MAX_SITEMAP_DEPTH: usize = 10;

const WELL_KNOWN_SITEMAPS: &[&str] = &[
    "sitemap.xml",
    "sitemap_index.xml",
    "sitemap-index.xml",
    "wp-sitemap.xml",
];

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Decodes a response body, inflating gzipped sitemaps
///
/// `Content-Encoding: gzip` is already undone by the client, so a `.gz` URL
/// may arrive as plain text. Only bodies with the gzip magic are inflated.
fn decode_body(bytes: &[u8]) -> Result<String> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut decoder = GzDecoder::new(bytes);
        let mut content = String::new();
        decoder.read_to_string(&mut content)?;
        Ok(content)
    } else {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Retrieves sitemap trees over HTTP
#[derive(Debug, Clone)]
pub struct HttpSitemapSource {
    client: Client,
    max_depth: usize,
}

impl HttpSitemapSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            max_depth: MAX_SITEMAP_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// GETs a URL; `Ok(None)` for non-success statuses, `Err` for transport failures
    async fn fetch_text(&self, url: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| TrawlError::Http {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            debug!("{} returned {}", url, response.status());
            return Ok(None);
        }

        let bytes = response.bytes().await.map_err(|source| TrawlError::Http {
            url: url.to_string(),
            source,
        })?;
        decode_body(&bytes).map(Some)
    }

    /// Candidate top-level sitemaps for a homepage, deduplicated in order
    async fn candidates(&self, homepage: &str) -> (Vec<String>, Option<TrawlError>) {
        let mut candidates = Vec::new();
        let mut robots_error = None;

        match self.fetch_text(&robots_url(homepage)).await {
            Ok(Some(body)) => candidates.extend(ParsedRobots::from_content(&body).sitemaps()),
            Ok(None) => {}
            Err(e) => {
                debug!("robots.txt unavailable for sitemap discovery: {}", e);
                robots_error = Some(e);
            }
        }

        let base = homepage.trim_end_matches('/');
        candidates.extend(WELL_KNOWN_SITEMAPS.iter().map(|name| format!("{}/{}", base, name)));

        let mut seen = HashSet::new();
        candidates.retain(|url| seen.insert(url.clone()));
        (candidates, robots_error)
    }

    /// Fetches one sitemap and, for an index, its children
    ///
    /// Returns `Ok(None)` when the URL does not serve a sitemap. Failures of
    /// child sitemaps are logged and skipped.
    fn fetch_node<'a>(
        &'a self,
        url: String,
        depth: usize,
        visited: &'a mut HashSet<String>,
    ) -> BoxFuture<'a, Result<Option<SitemapNode>>> {
        async move {
            visited.insert(url.clone());

            let Some(body) = self.fetch_text(&url).await? else {
                return Ok(None);
            };

            match parse_sitemap(&body) {
                SitemapDocument::UrlSet(pages) => {
                    debug!("Sitemap {} lists {} pages", url, pages.len());
                    Ok(Some(SitemapNode::new(url).with_pages(pages)))
                }
                SitemapDocument::Index(children) => {
                    let mut node = SitemapNode::new(url.clone());
                    for child in children {
                        if depth >= self.max_depth {
                            warn!("Sitemap index {} nested too deeply, skipping {}", url, child);
                            continue;
                        }
                        if visited.contains(&child) {
                            continue;
                        }
                        match self.fetch_node(child.clone(), depth + 1, &mut *visited).await {
                            Ok(Some(sub)) => node.sub_sitemaps.push(sub),
                            Ok(None) => debug!("Skipping sitemap {}: no sitemap content", child),
                            Err(e) => warn!("Failed to fetch sitemap {}: {}", child, e),
                        }
                    }
                    Ok(Some(node))
                }
                SitemapDocument::Unrecognized => {
                    debug!("{} is not a sitemap", url);
                    Ok(None)
                }
            }
        }
        .boxed()
    }
}

#[async_trait]
impl SitemapSource for HttpSitemapSource {
    async fn fetch_tree(&self, homepage: &str) -> Result<SitemapNode> {
        let (candidates, robots_error) = self.candidates(homepage).await;

        let mut root = SitemapNode::new(homepage);
        let mut visited = HashSet::new();
        let mut last_error = robots_error;
        let mut transport_failures = 0;

        for candidate in &candidates {
            if visited.contains(candidate) {
                continue;
            }
            match self.fetch_node(candidate.clone(), 1, &mut visited).await {
                Ok(Some(node)) => root.sub_sitemaps.push(node),
                Ok(None) => {}
                Err(e) => {
                    debug!("Failed to fetch sitemap {}: {}", candidate, e);
                    transport_failures += 1;
                    last_error = Some(e);
                }
            }
        }

        if transport_failures == candidates.len() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        if root.sub_sitemaps.is_empty() {
            warn!("No sitemaps found for {}", homepage);
        }

        Ok(root)
    }
}

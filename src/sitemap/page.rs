use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A page listed in a sitemap
///
/// Identity is the exact URL string; no normalization happens here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub last_modified: Option<String>,
}

impl Page {
    pub fn new(url: impl Into<String>, last_modified: Option<String>) -> Self {
        Self {
            url: url.into(),
            last_modified,
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "URL: {}, Last Modified: {}",
            self.url,
            self.last_modified.as_deref().unwrap_or("Unknown")
        )
    }
}

/// Ordered collection of pages, deduplicated by URL
///
/// Inserting a URL that is already present replaces the stored record in place,
/// so the latest `last_modified` seen wins while the first-seen position is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSet {
    pages: Vec<Page>,
    index: HashMap<String, usize>,
}

impl PageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a page; returns false if the URL was already present
    pub fn insert(&mut self, page: Page) -> bool {
        match self.index.get(&page.url) {
            Some(&position) => {
                self.pages[position] = page;
                false
            }
            None => {
                self.index.insert(page.url.clone(), self.pages.len());
                self.pages.push(page);
                true
            }
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    pub fn get(&self, url: &str) -> Option<&Page> {
        self.index.get(url).map(|&i| &self.pages[i])
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Page> {
        self.pages.iter()
    }
}

impl<'a> IntoIterator for &'a PageSet {
    type Item = &'a Page;
    type IntoIter = std::slice::Iter<'a, Page>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter()
    }
}

impl FromIterator<Page> for PageSet {
    fn from_iter<I: IntoIterator<Item = Page>>(iter: I) -> Self {
        let mut set = PageSet::new();
        for page in iter {
            set.insert(page);
        }
        set
    }
}

/// A node of the sitemap tree: its own pages plus nested sub-sitemaps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SitemapNode {
    pub url: String,
    pub pages: Vec<Page>,
    pub sub_sitemaps: Vec<SitemapNode>,
}

impl SitemapNode {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_pages(mut self, pages: Vec<Page>) -> Self {
        self.pages = pages;
        self
    }

    pub fn with_sub_sitemaps(mut self, sub_sitemaps: Vec<SitemapNode>) -> Self {
        self.sub_sitemaps = sub_sitemaps;
        self
    }

    /// Every page under this node, direct pages first, then each sub-sitemap depth-first
    pub fn all_pages(&self) -> Vec<&Page> {
        let mut pages: Vec<&Page> = self.pages.iter().collect();
        for sub in &self.sub_sitemaps {
            pages.extend(sub.all_pages());
        }
        pages
    }
}

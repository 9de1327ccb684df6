use crate::sitemap::{Page, PageSet, SitemapNode, SitemapSource, UrlClassifier};
use crate::url::strip_url_to_homepage;
use crate::{Result, TrawlError};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Nesting depth beyond which sub-sitemaps are ignored
pub const MAX_WALK_DEPTH: usize = 64;

/// Result of walking a sitemap tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SitemapWalk {
    /// Pages worth scraping, in first-seen order
    pub pages: PageSet,
    /// URLs excluded because of their sitemap or their own URL
    pub filtered_urls: BTreeSet<String>,
}

/// Collected state of one subtree, merged into its parent's
#[derive(Default)]
struct WalkAccumulator {
    seen: Vec<Page>,
    filtered: BTreeSet<String>,
}

impl WalkAccumulator {
    fn merge(&mut self, child: WalkAccumulator) {
        self.seen.extend(child.seen);
        self.filtered.extend(child.filtered);
    }
}

/// Walks a sitemap tree and splits its pages into kept and filtered sets
///
/// A page is filtered when any sitemap on its path matches a sitemap keyword,
/// or when its own URL matches a page keyword. The root node is never
/// classified itself since its URL is the homepage.
#[derive(Debug, Clone)]
pub struct SitemapWalker {
    classifier: UrlClassifier,
    max_depth: usize,
}

impl Default for SitemapWalker {
    fn default() -> Self {
        Self::new(UrlClassifier::default())
    }
}

impl SitemapWalker {
    pub fn new(classifier: UrlClassifier) -> Self {
        Self {
            classifier,
            max_depth: MAX_WALK_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn classifier(&self) -> &UrlClassifier {
        &self.classifier
    }

    /// Walks the tree rooted at `root`
    pub fn walk(&self, root: &SitemapNode) -> SitemapWalk {
        let mut ancestors = vec![root.url.as_str()];
        let acc = self.visit(root, false, 0, &mut ancestors);

        let mut pages = PageSet::new();
        for page in acc.seen {
            if !acc.filtered.contains(&page.url) {
                pages.insert(page);
            }
        }

        debug!(
            "Sitemap walk kept {} pages, filtered {} URLs",
            pages.len(),
            acc.filtered.len()
        );

        SitemapWalk {
            pages,
            filtered_urls: acc.filtered,
        }
    }

    fn visit<'a>(
        &self,
        node: &'a SitemapNode,
        inherited_filter: bool,
        depth: usize,
        ancestors: &mut Vec<&'a str>,
    ) -> WalkAccumulator {
        let mut acc = WalkAccumulator::default();

        for page in &node.pages {
            if inherited_filter || self.classifier.is_filtered_page(&page.url) {
                acc.filtered.insert(page.url.clone());
            }
            acc.seen.push(page.clone());
        }

        for sub in &node.sub_sitemaps {
            if depth + 1 > self.max_depth {
                warn!("Sitemap {} exceeds maximum nesting depth, skipping", sub.url);
                continue;
            }
            if ancestors.contains(&sub.url.as_str()) {
                warn!("Sitemap {} references one of its ancestors, skipping", sub.url);
                continue;
            }

            let filtered = inherited_filter || self.classifier.is_filtered_sitemap(&sub.url);
            if filtered && !inherited_filter {
                debug!("Filtering sitemap {}", sub.url);
            }

            ancestors.push(sub.url.as_str());
            let child = self.visit(sub, filtered, depth + 1, ancestors);
            ancestors.pop();
            acc.merge(child);
        }

        acc
    }
}

/// Fetches the sitemap tree of `homepage` and walks it
///
/// The homepage is stripped to `scheme://host/` before fetching. A failed
/// fetch is reported with both the original and the stripped homepage.
pub async fn discover_pages(
    source: &dyn SitemapSource,
    walker: &SitemapWalker,
    homepage: &str,
) -> Result<SitemapWalk> {
    let stripped = strip_url_to_homepage(homepage)?;
    info!("Fetching sitemaps for {}", stripped);

    let tree = source
        .fetch_tree(&stripped)
        .await
        .map_err(|e| TrawlError::Sitemap {
            homepage: homepage.to_string(),
            stripped_homepage: stripped.clone(),
            source: Box::new(e),
        })?;

    Ok(walker.walk(&tree))
}

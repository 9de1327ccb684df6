//! Scrape coordinator - main run orchestration logic
//!
//! This module contains the run loop that coordinates:
//! - Loading the exclusion list and prior snapshot
//! - Sitemap discovery and filtering
//! - Resolving each kept page (policy, exclusion, snapshot reuse, live fetch)
//! - Periodic batch flushes and the final write

use crate::config::{validate, Config};
use crate::crawler::fetcher::{build_http_client, HttpPageFetcher, PageFetcher};
use crate::crawler::reconcile::{handle_exclusions_list, handle_input_dict, url_in_input_data};
use crate::output::{BatchWriter, RunStatistics};
use crate::recipe::{
    ExtractError, JsonLdExtractor, PriorSnapshot, RecipeExtractor, RecipeRecord, RecipesDatabase,
};
use crate::robots::{CrawlPolicyGate, HttpPolicySource, PolicySource};
use crate::sitemap::{
    discover_pages, HttpSitemapSource, Page, SitemapSource, SitemapWalker, UrlClassifier,
};
use crate::state::PageOutcome;
use crate::storage::{read_json, ExclusionStore};
use crate::url::strip_url_to_homepage;
use crate::{InputError, Result};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How a page was resolved, with the data it produced
enum Resolution {
    PolicyDenied,
    Excluded,
    Reused(RecipeRecord),
    Scraped(RecipeRecord),
    NoRecipe(ExtractError),
}

impl Resolution {
    fn outcome(&self) -> PageOutcome {
        match self {
            Self::PolicyDenied => PageOutcome::PolicyDenied,
            Self::Excluded => PageOutcome::Excluded,
            Self::Reused(_) => PageOutcome::Reused,
            Self::Scraped(_) => PageOutcome::Scraped,
            Self::NoRecipe(_) => PageOutcome::NoRecipe,
        }
    }
}

/// Decision taken for a page before any fetch is dispatched
enum Plan {
    Resolved(Resolution),
    Fetch,
}

/// Results of a completed run
#[derive(Debug)]
pub struct RunReport {
    pub database: RecipesDatabase,
    pub statistics: RunStatistics,
}

/// Main scrape coordinator structure
pub struct Coordinator {
    homepage: String,
    user_agent: String,
    walker: SitemapWalker,
    sitemaps: Arc<dyn SitemapSource>,
    policy: Arc<dyn PolicySource>,
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn RecipeExtractor>,
    exclusions: ExclusionStore,
    batch_size: Option<usize>,
    output_path: Option<PathBuf>,
    max_concurrent_fetches: usize,
}

impl Coordinator {
    /// Creates a coordinator with HTTP collaborators built from the configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(TrawlError)` - The HTTP client could not be built
    pub fn new(config: &Config) -> Result<Self> {
        let client = build_http_client(config)?;

        Ok(Self::with_collaborators(
            config,
            Arc::new(HttpSitemapSource::new(client.clone())),
            Arc::new(HttpPolicySource::new(client.clone())),
            Arc::new(HttpPageFetcher::new(client)),
            Arc::new(JsonLdExtractor::new(&config.extractor.supported_hosts)),
        ))
    }

    /// Creates a coordinator with the given collaborators
    pub fn with_collaborators(
        config: &Config,
        sitemaps: Arc<dyn SitemapSource>,
        policy: Arc<dyn PolicySource>,
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn RecipeExtractor>,
    ) -> Self {
        Self {
            homepage: config.scraper.homepage.clone(),
            user_agent: config.user_agent.crawler_name.clone(),
            walker: SitemapWalker::new(UrlClassifier::from_config(&config.filters)),
            sitemaps,
            policy,
            fetcher,
            extractor,
            exclusions: ExclusionStore::new(config.output.exclusions_path()),
            batch_size: config.scraper.batch_size,
            output_path: config.output.output_file.as_ref().map(PathBuf::from),
            max_concurrent_fetches: config.scraper.max_concurrent_fetches.max(1) as usize,
        }
    }

    /// Runs a complete scrape
    ///
    /// 1. Merge the stored exclusion list with the snapshot's pages without recipe
    /// 2. Validate the snapshot entries
    /// 3. Discover pages through the sitemap tree
    /// 4. Load the crawl policy
    /// 5. Plan every kept page in discovery order:
    ///    policy-deny > exclusion > fresh snapshot entry > live fetch
    /// 6. Run live fetches, bounded by `max_concurrent_fetches`, and apply
    ///    results in discovery order with a batch flush check per page
    /// 7. Write the final output and exclusion list
    pub async fn run(&self, snapshot: Option<PriorSnapshot>) -> Result<RunReport> {
        let start_time = Instant::now();
        let supported_only = self.check_support();

        let stored = self.exclusions.load(&self.homepage)?;
        let store_name = self
            .exclusions
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let merged = handle_exclusions_list(stored, snapshot.as_ref(), &store_name);
        let excluded: HashSet<&str> = merged.iter().map(String::as_str).collect();

        let input = snapshot
            .map(|s| handle_input_dict(s.entries))
            .unwrap_or_default();

        let walk = discover_pages(self.sitemaps.as_ref(), &self.walker, &self.homepage).await?;
        let total = walk.pages.len();
        tracing::info!(
            "Found {} pages ({} filtered out)",
            total,
            walk.filtered_urls.len()
        );

        let stripped = strip_url_to_homepage(&self.homepage)?;
        let gate = CrawlPolicyGate::load(self.policy.as_ref(), &stripped, &self.user_agent).await;
        let crawl_delay = gate
            .crawl_delay()
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(Duration::from_secs_f64);
        let concurrency = match crawl_delay {
            Some(delay) => {
                tracing::info!("Honoring robots.txt crawl delay of {:?}", delay);
                1
            }
            None => self.max_concurrent_fetches,
        };

        let mut statistics = RunStatistics {
            kept_pages: total as u64,
            filtered_urls: walk.filtered_urls.len() as u64,
            ..Default::default()
        };
        let mut database = RecipesDatabase::new();
        database.add_non_recipe_pages(&walk.filtered_urls);

        let mut writer = BatchWriter::new(
            self.batch_size,
            self.output_path.clone(),
            self.exclusions.clone(),
            self.homepage.clone(),
        );

        let plans: Vec<(usize, &Page, Plan)> = walk
            .pages
            .iter()
            .enumerate()
            .map(|(i, page)| (i + 1, page, self.plan(page, &gate, &excluded, &input)))
            .collect();

        let fetcher = self.fetcher.as_ref();
        let extractor = self.extractor.as_ref();
        let mut resolved = stream::iter(plans)
            .map(|(index, page, plan)| async move {
                let resolution = match plan {
                    Plan::Resolved(resolution) => resolution,
                    Plan::Fetch => {
                        if let Some(delay) = crawl_delay {
                            tokio::time::sleep(delay).await;
                        }
                        fetch_recipe(fetcher, extractor, page, supported_only).await
                    }
                };
                (index, page, resolution)
            })
            .buffered(concurrency);

        while let Some((index, page, resolution)) = resolved.next().await {
            let outcome = resolution.outcome();
            self.apply(&mut database, index, total, page, resolution);
            statistics.record(outcome);

            if writer.maybe_flush(&database, &merged)? {
                statistics.flushes += 1;
            }

            if index % 50 == 0 {
                let rate = index as f64 / start_time.elapsed().as_secs_f64();
                tracing::info!(
                    "Progress: {}/{} pages resolved, {:.2} pages/sec",
                    index,
                    total,
                    rate
                );
            }
        }

        writer.finish(&database, &merged)?;

        statistics.log_summary();
        tracing::info!(
            "Scrape completed: {} pages resolved in {:?}",
            total,
            start_time.elapsed()
        );

        Ok(RunReport {
            database,
            statistics,
        })
    }

    /// Logs a notice when the site has no dedicated extraction support
    fn check_support(&self) -> bool {
        let supported = self.extractor.supports_site(&self.homepage);
        if !supported {
            tracing::warn!(
                "The website '{}' has no dedicated extraction support. Pages with Recipe \
                 schema markup are still scraped, but without a site-specific data format. \
                 Please verify the output contains all expected fields.",
                self.homepage
            );
        }
        supported
    }

    fn plan(
        &self,
        page: &Page,
        gate: &CrawlPolicyGate,
        excluded: &HashSet<&str>,
        input: &HashMap<String, RecipeRecord>,
    ) -> Plan {
        if !gate.can_fetch(&page.url) {
            return Plan::Resolved(Resolution::PolicyDenied);
        }
        if excluded.contains(page.url.as_str()) {
            return Plan::Resolved(Resolution::Excluded);
        }
        if let Some(record) = url_in_input_data(page, input) {
            return Plan::Resolved(Resolution::Reused(record.clone()));
        }
        Plan::Fetch
    }

    fn apply(
        &self,
        database: &mut RecipesDatabase,
        index: usize,
        total: usize,
        page: &Page,
        resolution: Resolution,
    ) {
        let progress = format!("[{}/{}]:", index, total);

        match resolution {
            Resolution::PolicyDenied => {
                tracing::info!(
                    "{} Robots.txt does not allow user agent '{}' to scrape {}",
                    progress,
                    self.user_agent,
                    page
                );
            }
            Resolution::Excluded => {
                tracing::info!("{} Known page without recipe, skipping {}", progress, page.url);
                database.add_non_recipe_page(&page.url);
            }
            Resolution::Reused(record) => {
                tracing::info!(
                    "{} Recipe data up-to-date, fetching from input file URL: {}",
                    progress,
                    page.url
                );
                database.add_recipe(&page.url, record);
            }
            Resolution::Scraped(record) => {
                tracing::info!("{} Scraping {}", progress, page);
                database.add_recipe(&page.url, record);
            }
            Resolution::NoRecipe(e) => {
                tracing::info!("{} Scraping {}", progress, page);
                match e {
                    ExtractError::NoRecipe | ExtractError::MissingField(_) => {
                        tracing::warn!("No Recipe Schema found at {}", page.url)
                    }
                    other => tracing::warn!("No recipe recorded for {}: {}", page.url, other),
                }
                database.add_non_recipe_page(&page.url);
            }
        }
    }
}

/// Fetches a page and extracts its recipe
async fn fetch_recipe(
    fetcher: &dyn PageFetcher,
    extractor: &dyn RecipeExtractor,
    page: &Page,
    supported_only: bool,
) -> Resolution {
    tracing::debug!("Fetching {}", page.url);

    let extracted = match fetcher.fetch(&page.url).await {
        Ok(html) => extractor.extract(&html, &page.url, supported_only),
        Err(e) => Err(e),
    };

    match extracted {
        Ok(mut record) => {
            record.set_page_url(&page.url);
            record.set_last_modified(page.last_modified.as_deref());
            Resolution::Scraped(record)
        }
        Err(e) => Resolution::NoRecipe(e),
    }
}

/// Loads the prior snapshot from the configured or overriding input file
///
/// # Returns
///
/// * `Ok(Some(PriorSnapshot))` - The input file was read
/// * `Ok(None)` - No input file given, or it does not exist yet
/// * `Err(TrawlError)` - Both input options given, or the file is malformed
pub fn load_input(config: &Config, input_override: Option<&Path>) -> Result<Option<PriorSnapshot>> {
    let path = match (config.output.input_file.as_deref(), input_override) {
        (Some(_), Some(_)) => return Err(InputError::Conflicting.into()),
        (Some(configured), None) => PathBuf::from(configured),
        (None, Some(given)) => given.to_path_buf(),
        (None, None) => return Ok(None),
    };

    let source = path.display().to_string();
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(InputError::NotJson(source).into());
    }

    match read_json(&path)? {
        Some(value) => Ok(Some(PriorSnapshot::from_json(value, &source)?)),
        None => {
            tracing::warn!(
                "Input file {} does not exist, continuing without prior data",
                source
            );
            Ok(None)
        }
    }
}

/// Runs a complete scrape of the configured homepage
///
/// Validates the configuration and input before any network activity, runs
/// the coordinator and writes the final output when an output file is
/// configured.
///
/// # Example
///
/// ```no_run
/// use recipe_trawl::config::load_config;
/// use recipe_trawl::crawler::scrape_site;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("trawl.toml"))?;
/// let database = scrape_site(&config, None).await?;
/// println!("{} recipes", database.recipe_count());
/// # Ok(())
/// # }
/// ```
pub async fn scrape_site(config: &Config, input_override: Option<&Path>) -> Result<RecipesDatabase> {
    validate(config)?;
    let snapshot = load_input(config, input_override)?;

    let coordinator = Coordinator::new(config)?;
    let report = coordinator.run(snapshot).await?;
    Ok(report.database)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        ExtractorConfig, FilterConfig, OutputConfig, ScraperConfig, UserAgentConfig,
    };
    use crate::recipe::PAGES_WITHOUT_RECIPE_KEY;
    use crate::robots::ParsedRobots;
    use crate::sitemap::SitemapNode;
    use crate::TrawlError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const HOMEPAGE: &str = "https://site.com";
    const LM: &str = "2024-05-01T00:00:00+00:00";

    fn test_config(dir: &TempDir, batch_size: Option<usize>, concurrency: u32) -> Config {
        Config {
            scraper: ScraperConfig {
                homepage: HOMEPAGE.to_string(),
                batch_size,
                max_concurrent_fetches: concurrency,
                request_timeout_secs: 5,
            },
            user_agent: UserAgentConfig {
                crawler_name: "RecipeTrawl".to_string(),
                crawler_version: "1.0".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "admin@example.com".to_string(),
            },
            output: OutputConfig {
                output_file: Some(dir.path().join("recipes.json").display().to_string()),
                input_file: None,
                exclusions_file: None,
            },
            filters: FilterConfig::default(),
            extractor: ExtractorConfig::default(),
        }
    }

    struct StaticSitemaps(Option<SitemapNode>);

    #[async_trait]
    impl SitemapSource for StaticSitemaps {
        async fn fetch_tree(&self, _homepage: &str) -> Result<SitemapNode> {
            self.0
                .clone()
                .ok_or_else(|| TrawlError::Robots("connection refused".to_string()))
        }
    }

    struct StaticPolicy(&'static str);

    #[async_trait]
    impl PolicySource for StaticPolicy {
        async fn fetch_policy(&self, _homepage: &str) -> Result<ParsedRobots> {
            Ok(ParsedRobots::from_content(self.0))
        }
    }

    /// Serves recipe markup for URLs containing "recipe", plain HTML otherwise
    #[derive(Default)]
    struct FakeFetcher {
        calls: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> std::result::Result<String, ExtractError> {
            self.calls.lock().unwrap().push(url.to_string());
            if url.contains("broken") {
                return Err(ExtractError::Fetch {
                    url: url.to_string(),
                    message: "HTTP 500".to_string(),
                });
            }
            if url.contains("recipe") {
                Ok(format!(
                    r#"<script type="application/ld+json">{{"@type": "Recipe", "name": "Dish at {}"}}</script>"#,
                    url
                ))
            } else {
                Ok("<html><body>About us</body></html>".to_string())
            }
        }
    }

    fn tree(pages: &[&str]) -> SitemapNode {
        SitemapNode::new("https://site.com/").with_sub_sitemaps(vec![
            SitemapNode::new("https://site.com/post-sitemap.xml").with_pages(
                pages
                    .iter()
                    .map(|u| Page::new(*u, Some(LM.to_string())))
                    .collect(),
            ),
            SitemapNode::new("https://site.com/tag-sitemap.xml")
                .with_pages(vec![Page::new("https://site.com/tag/soup/", None)]),
        ])
    }

    fn coordinator(
        config: &Config,
        pages: &[&str],
        robots: &'static str,
        fetcher: Arc<FakeFetcher>,
    ) -> Coordinator {
        Coordinator::with_collaborators(
            config,
            Arc::new(StaticSitemaps(Some(tree(pages)))),
            Arc::new(StaticPolicy(robots)),
            fetcher,
            Arc::new(JsonLdExtractor::default()),
        )
    }

    #[tokio::test]
    async fn test_fresh_run_scrapes_and_records() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, None, 1);
        let fetcher = Arc::new(FakeFetcher::default());
        let coordinator = coordinator(
            &config,
            &[
                "https://site.com/recipe/cake/",
                "https://site.com/about/",
                "https://site.com/photo.jpg",
                "https://site.com/recipe/broken/",
            ],
            "",
            fetcher.clone(),
        );

        let report = coordinator.run(None).await.unwrap();
        let db = &report.database;

        let cake = db.recipe("https://site.com/recipe/cake/").unwrap();
        assert_eq!(cake.title(), Some("Dish at https://site.com/recipe/cake/"));
        assert_eq!(cake.page_url(), Some("https://site.com/recipe/cake/"));
        assert_eq!(cake.last_modified(), Some(LM));

        assert!(db.is_without_recipe("https://site.com/about/"));
        assert!(db.is_without_recipe("https://site.com/recipe/broken/"));
        assert!(db.is_without_recipe("https://site.com/photo.jpg"));
        assert!(db.is_without_recipe("https://site.com/tag/soup/"));

        assert_eq!(fetcher.calls().len(), 3);
        assert_eq!(report.statistics.count(PageOutcome::Scraped), 1);
        assert_eq!(report.statistics.count(PageOutcome::NoRecipe), 2);
        assert_eq!(report.statistics.filtered_urls, 2);

        let written = read_json(&dir.path().join("recipes.json")).unwrap().unwrap();
        assert_eq!(written, db.to_json());
        assert_eq!(written[PAGES_WITHOUT_RECIPE_KEY].as_array().unwrap().len(), 4);

        let store = ExclusionStore::new(dir.path().join("_recipe_scraper_exclusions.json"));
        assert_eq!(store.load(HOMEPAGE).unwrap().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_resolution_precedence() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, None, 1);

        let store = ExclusionStore::new(config.output.exclusions_path());
        store
            .save(
                HOMEPAGE,
                &[
                    "https://site.com/recipe/excluded/".to_string(),
                    "https://site.com/private/recipe/".to_string(),
                ],
            )
            .unwrap();

        let snapshot = PriorSnapshot::from_json(
            json!({
                "https://site.com/recipe/excluded/": {"title": "Old", "last_modified": LM},
                "https://site.com/recipe/fresh/": {"title": "Kept", "last_modified": LM},
                "https://site.com/recipe/stale/": {"title": "Stale", "last_modified": "2023-01-01T00:00:00+00:00"}
            }),
            "previous.json",
        )
        .unwrap();

        let fetcher = Arc::new(FakeFetcher::default());
        let coordinator = coordinator(
            &config,
            &[
                "https://site.com/private/recipe/",
                "https://site.com/recipe/excluded/",
                "https://site.com/recipe/fresh/",
                "https://site.com/recipe/stale/",
            ],
            "User-agent: *\nDisallow: /private/",
            fetcher.clone(),
        );

        let report = coordinator.run(Some(snapshot)).await.unwrap();
        let db = &report.database;

        // Policy wins over exclusion: nothing recorded
        assert!(db.recipe("https://site.com/private/recipe/").is_none());
        assert!(!db.is_without_recipe("https://site.com/private/recipe/"));

        // Exclusion wins over a fresh snapshot entry
        assert!(db.is_without_recipe("https://site.com/recipe/excluded/"));
        assert!(db.recipe("https://site.com/recipe/excluded/").is_none());

        assert_eq!(db.recipe("https://site.com/recipe/fresh/").unwrap().title(), Some("Kept"));
        assert_eq!(
            db.recipe("https://site.com/recipe/stale/").unwrap().title(),
            Some("Dish at https://site.com/recipe/stale/")
        );

        assert_eq!(fetcher.calls(), vec!["https://site.com/recipe/stale/".to_string()]);
        assert_eq!(report.statistics.count(PageOutcome::PolicyDenied), 1);
        assert_eq!(report.statistics.count(PageOutcome::Excluded), 1);
        assert_eq!(report.statistics.count(PageOutcome::Reused), 1);
        assert_eq!(report.statistics.count(PageOutcome::Scraped), 1);

        // The stored list never shrinks
        let stored = store.load(HOMEPAGE).unwrap().unwrap();
        assert!(stored.contains(&"https://site.com/private/recipe/".to_string()));
        assert!(stored.contains(&"https://site.com/tag/soup/".to_string()));
    }

    #[tokio::test]
    async fn test_batch_flushes() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, Some(2), 1);
        let coordinator = coordinator(
            &config,
            &[
                "https://site.com/recipe/a/",
                "https://site.com/recipe/b/",
                "https://site.com/recipe/c/",
                "https://site.com/recipe/d/",
                "https://site.com/recipe/e/",
            ],
            "",
            Arc::new(FakeFetcher::default()),
        );

        let report = coordinator.run(None).await.unwrap();
        assert_eq!(report.statistics.flushes, 2);
        assert_eq!(report.database.recipe_count(), 5);
    }

    #[tokio::test]
    async fn test_result_independent_of_concurrency() {
        let pages = [
            "https://site.com/recipe/a/",
            "https://site.com/b/",
            "https://site.com/recipe/c/",
            "https://site.com/recipe/broken/",
            "https://site.com/e/",
        ];

        let mut outputs = Vec::new();
        for concurrency in [1, 4] {
            let dir = TempDir::new().unwrap();
            let config = test_config(&dir, Some(2), concurrency);
            let report = coordinator(&config, &pages, "", Arc::new(FakeFetcher::default()))
                .run(None)
                .await
                .unwrap();
            outputs.push(report.database.to_json());
        }
        assert_eq!(outputs[0], outputs[1]);
    }

    #[tokio::test]
    async fn test_sitemap_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, None, 1);
        let coordinator = Coordinator::with_collaborators(
            &config,
            Arc::new(StaticSitemaps(None)),
            Arc::new(StaticPolicy("")),
            Arc::new(FakeFetcher::default()),
            Arc::new(JsonLdExtractor::default()),
        );

        let result = coordinator.run(None).await;
        assert!(matches!(result, Err(TrawlError::Sitemap { .. })));
        assert!(!dir.path().join("recipes.json").exists());
    }

    #[test]
    fn test_load_input_options() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir, None, 1);
        assert!(load_input(&config, None).unwrap().is_none());

        let input = dir.path().join("previous.json");
        std::fs::write(
            &input,
            json!({"Pages without Recipe": ["https://site.com/about/"]}).to_string(),
        )
        .unwrap();

        let snapshot = load_input(&config, Some(&input)).unwrap().unwrap();
        assert_eq!(snapshot.pages_without_recipe, vec!["https://site.com/about/"]);

        config.output.input_file = Some(input.display().to_string());
        assert!(matches!(
            load_input(&config, Some(&input)),
            Err(TrawlError::Input(InputError::Conflicting))
        ));
        assert!(load_input(&config, None).unwrap().is_some());

        config.output.input_file = None;
        assert!(matches!(
            load_input(&config, Some(Path::new("previous.csv"))),
            Err(TrawlError::Input(InputError::NotJson(_)))
        ));
        assert!(load_input(&config, Some(&dir.path().join("missing.json")))
            .unwrap()
            .is_none());
    }
}

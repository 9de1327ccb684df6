//! Integration tests for the scraper
//!
//! These tests use wiremock to serve a small recipe site and run the full
//! scrape cycle end-to-end: robots.txt, sitemap discovery, page fetching and
//! the JSON output and exclusion files.

use recipe_trawl::config::{
    Config, ExtractorConfig, FilterConfig, OutputConfig, ScraperConfig, UserAgentConfig,
};
use recipe_trawl::crawler::scrape_site;
use recipe_trawl::storage::{read_json, ExclusionStore};
use recipe_trawl::{TrawlError, PAGES_WITHOUT_RECIPE_KEY};
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LAST_MODIFIED: &str = "2024-05-01T10:00:00+00:00";

const CAKE_PAGE: &str = r#"<html><head><title>Chocolate Cake</title>
<script type="application/ld+json">
{
  "@context": "https://schema.org",
  "@type": "Recipe",
  "name": "Chocolate Cake",
  "recipeIngredient": ["200 g flour", "100 g cocoa"],
  "recipeInstructions": [{"@type": "HowToStep", "text": "Mix."}, {"@type": "HowToStep", "text": "Bake."}],
  "totalTime": "PT1H10M"
}
</script></head><body>Cake</body></html>"#;

/// Creates a test configuration writing into `dir`
fn create_test_config(homepage: &str, dir: &Path, output: Option<&str>) -> Config {
    Config {
        scraper: ScraperConfig {
            homepage: homepage.to_string(),
            batch_size: None,
            max_concurrent_fetches: 2,
            request_timeout_secs: 5,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            output_file: output.map(|name| dir.join(name).display().to_string()),
            input_file: None,
            exclusions_file: Some(dir.join("exclusions.json").display().to_string()),
        },
        filters: FilterConfig::default(),
        extractor: ExtractorConfig::default(),
    }
}

async fn mount_text(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_html(server: &MockServer, route: &str, body: &str, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
        .expect(expected_hits)
        .mount(server)
        .await;
}

/// Serves robots.txt, a sitemap index with a post and a tag sitemap, and pages
///
/// Every page is expected to be fetched at most once across all runs.
async fn mount_recipe_site(server: &MockServer) {
    let base = server.uri();

    mount_text(
        server,
        "/robots.txt",
        format!(
            "User-agent: *\nDisallow: /private/\n\nSitemap: {}/sitemap_index.xml\n",
            base
        ),
    )
    .await;

    mount_text(
        server,
        "/sitemap_index.xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>{base}/post-sitemap.xml</loc></sitemap>
  <sitemap><loc>{base}/tag-sitemap.xml</loc></sitemap>
</sitemapindex>"#
        ),
    )
    .await;

    mount_text(
        server,
        "/post-sitemap.xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{base}/recipe/cake/</loc><lastmod>{LAST_MODIFIED}</lastmod></url>
  <url><loc>{base}/about/</loc><lastmod>{LAST_MODIFIED}</lastmod></url>
  <url><loc>{base}/private/recipe/</loc><lastmod>{LAST_MODIFIED}</lastmod></url>
  <url><loc>{base}/uploads/cake.jpg</loc></url>
</urlset>"#
        ),
    )
    .await;

    mount_text(
        server,
        "/tag-sitemap.xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{base}/tag/chocolate/</loc></url>
</urlset>"#
        ),
    )
    .await;

    mount_html(server, "/recipe/cake/", CAKE_PAGE, 1).await;
    mount_html(server, "/about/", "<html><body>About us</body></html>", 1).await;
    mount_html(server, "/private/recipe/", CAKE_PAGE, 0).await;
    mount_html(server, "/tag/chocolate/", "<html></html>", 0).await;
}

fn without_recipe(output: &Value) -> Vec<String> {
    output[PAGES_WITHOUT_RECIPE_KEY]
        .as_array()
        .expect("reserved key holds an array")
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn test_full_scrape_then_incremental_rerun() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    mount_recipe_site(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let cake_url = format!("{}/recipe/cake/", base);
    let about_url = format!("{}/about/", base);
    let private_url = format!("{}/private/recipe/", base);

    // First run: fresh scrape
    let config = create_test_config(&base, dir.path(), Some("recipes.json"));
    let database = scrape_site(&config, None).await.expect("Scrape failed");

    let cake = database.recipe(&cake_url).expect("cake recipe scraped");
    assert_eq!(cake.title(), Some("Chocolate Cake"));
    assert_eq!(cake.page_url(), Some(cake_url.as_str()));
    assert_eq!(cake.last_modified(), Some(LAST_MODIFIED));
    assert_eq!(cake.get("total_time"), Some(&json!(70)));

    assert!(database.is_without_recipe(&about_url));
    assert!(database.is_without_recipe(&format!("{}/uploads/cake.jpg", base)));
    assert!(database.is_without_recipe(&format!("{}/tag/chocolate/", base)));

    // Disallowed pages are neither scraped nor excluded
    assert!(database.recipe(&private_url).is_none());
    assert!(!database.is_without_recipe(&private_url));

    let output_path = dir.path().join("recipes.json");
    let output = read_json(&output_path).unwrap().expect("output written");
    assert_eq!(output, database.to_json());
    assert_eq!(output[cake_url.as_str()]["title"], json!("Chocolate Cake"));
    assert_eq!(without_recipe(&output).len(), 3);

    let store = ExclusionStore::new(dir.path().join("exclusions.json"));
    let excluded = store.load(&base).unwrap().expect("exclusions stored");
    assert!(excluded.contains(&about_url));
    assert!(!excluded.contains(&private_url));

    // Second run: reuse the first run's output, nothing is fetched again
    let rerun_config = create_test_config(&base, dir.path(), Some("recipes-rerun.json"));
    let rerun = scrape_site(&rerun_config, Some(&output_path))
        .await
        .expect("Rerun failed");

    assert_eq!(rerun.recipe(&cake_url), database.recipe(&cake_url));
    assert!(rerun.is_without_recipe(&about_url));
    assert_eq!(rerun.to_json(), database.to_json());
}

#[tokio::test]
async fn test_site_without_sitemaps_yields_empty_output() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base, dir.path(), Some("recipes.json"));
    let database = scrape_site(&config, None).await.expect("Scrape failed");

    assert!(database.is_empty());
    let output = read_json(&dir.path().join("recipes.json")).unwrap().unwrap();
    assert_eq!(output, json!({}));
}

#[tokio::test]
async fn test_unreachable_site_fails_before_writing() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config("http://127.0.0.1:1", dir.path(), Some("recipes.json"));

    let result = scrape_site(&config, None).await;

    assert!(matches!(result, Err(TrawlError::Sitemap { .. })));
    assert!(!dir.path().join("recipes.json").exists());
}

#[tokio::test]
async fn test_conflicting_input_options_rejected() {
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config("http://127.0.0.1:1", dir.path(), Some("recipes.json"));
    config.output.input_file = Some(dir.path().join("a.json").display().to_string());

    let result = scrape_site(&config, Some(&dir.path().join("b.json"))).await;

    assert!(matches!(result, Err(TrawlError::Input(_))));
}

#[tokio::test]
async fn test_invalid_config_rejected_before_network() {
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config("http://127.0.0.1:1", dir.path(), None);
    config.scraper.batch_size = Some(5);

    let result = scrape_site(&config, None).await;

    assert!(matches!(result, Err(TrawlError::Config(_))));
}

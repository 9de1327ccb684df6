//! Recipe-Trawl main entry point
//!
//! This is the command-line interface for the Recipe-Trawl sitemap scraper.

use anyhow::{bail, Context};
use clap::Parser;
use recipe_trawl::config::{load_config_with_hash, Config};
use recipe_trawl::crawler::{load_input, scrape_site};
use recipe_trawl::output::{print_output_statistics, summarize_output_file};
use recipe_trawl::sitemap::{SITEMAP_FILTER_KEYWORDS, URL_FILTER_KEYWORDS};
use recipe_trawl::{extract_domain, strip_url_to_homepage};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Recipe-Trawl: a sitemap-driven recipe harvester
///
/// Recipe-Trawl walks a website's sitemaps, respects robots.txt and scrapes
/// schema.org recipes into a JSON database that later runs reuse.
#[derive(Parser, Debug)]
#[command(name = "recipe-trawl")]
#[command(version = "1.0.0")]
#[command(about = "A sitemap-driven recipe harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Output of a previous run to reuse up-to-date recipes from
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Validate config and show what would be scraped without scraping
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics of the configured output file and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config, cli.input.as_deref())
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_scrape(&config, cli.input.as_deref()).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so that JSON printed to stdout stays clean.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("recipe_trawl=info,warn"),
            1 => EnvFilter::new("recipe_trawl=debug,info"),
            2 => EnvFilter::new("recipe_trawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and input, prints the plan
fn handle_dry_run(config: &Config, input: Option<&Path>) -> anyhow::Result<()> {
    println!("=== Recipe-Trawl Dry Run ===\n");

    let stripped = strip_url_to_homepage(&config.scraper.homepage)?;
    println!("Site:");
    println!("  Homepage: {}", config.scraper.homepage);
    println!("  Domain: {}", extract_domain(&config.scraper.homepage)?);
    println!("  Sitemaps fetched from: {}", stripped);

    println!("\nScraper Configuration:");
    match config.scraper.batch_size {
        Some(size) => println!("  Batch size: {}", size),
        None => println!("  Batch size: none (single write at the end)"),
    }
    println!(
        "  Max concurrent fetches: {}",
        config.scraper.max_concurrent_fetches
    );
    println!("  Request timeout: {}s", config.scraper.request_timeout_secs);

    println!("\nUser Agent:");
    println!("  Header: {}", config.user_agent.header_value());

    println!("\nFiles:");
    match &config.output.output_file {
        Some(path) => println!("  Output: {}", path),
        None => println!("  Output: stdout"),
    }
    println!(
        "  Exclusions: {}",
        config.output.exclusions_path().display()
    );

    let snapshot = load_input(config, input)?;
    match snapshot {
        Some(s) => println!(
            "  Input: {} recipes, {} pages without recipe",
            s.entries.len(),
            s.pages_without_recipe.len()
        ),
        None => println!("  Input: none"),
    }

    println!("\nFilters:");
    println!(
        "  Sitemap keywords: {} built-in, {} configured",
        SITEMAP_FILTER_KEYWORDS.len(),
        config.filters.sitemap_keywords.len()
    );
    println!(
        "  URL keywords: {} built-in, {} configured",
        URL_FILTER_KEYWORDS.len(),
        config.filters.url_keywords.len()
    );
    println!(
        "  Supported hosts: {}",
        config.extractor.supported_hosts.len()
    );

    println!("\n✓ Configuration is valid");
    println!("✓ Would scrape recipes from {}", config.scraper.homepage);

    Ok(())
}

/// Handles the --stats mode: summarizes the configured output file
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let Some(output_file) = &config.output.output_file else {
        bail!("--stats requires an output-file in the configuration");
    };
    let path = Path::new(output_file);

    let stats = summarize_output_file(path)
        .with_context(|| format!("Failed to summarize {}", path.display()))?;
    print_output_statistics(path, &stats);

    Ok(())
}

/// Handles the main scrape operation
async fn handle_scrape(config: &Config, input: Option<&Path>) -> anyhow::Result<()> {
    tracing::info!("Starting scrape of {}", config.scraper.homepage);

    let database = match scrape_site(config, input).await {
        Ok(database) => database,
        Err(e) => {
            tracing::error!("Scrape failed: {}", e);
            return Err(e.into());
        }
    };

    tracing::info!(
        "Scrape completed successfully: {} recipes, {} pages without recipe",
        database.recipe_count(),
        database.pages_without_recipe().len()
    );

    if config.output.output_file.is_none() {
        let json = serde_json::to_string_pretty(&database.to_json())?;
        println!("{}", json);
    }

    Ok(())
}

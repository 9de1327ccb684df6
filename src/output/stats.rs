//! Statistics for scrape runs and output files
//!
//! `RunStatistics` is collected while a run resolves its pages;
//! `OutputStatistics` summarizes an output file written by an earlier run.

use crate::recipe::RecipesDatabase;
use crate::state::PageOutcome;
use crate::storage::read_json;
use crate::Result;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::info;

/// Counters for one scrape run
#[derive(Debug, Clone, Default)]
pub struct RunStatistics {
    /// Pages kept after sitemap filtering
    pub kept_pages: u64,

    /// URLs removed by sitemap or page filters
    pub filtered_urls: u64,

    /// Count of kept pages by how they were resolved
    pub pages_by_outcome: HashMap<PageOutcome, u64>,

    /// Number of batch flushes
    pub flushes: u64,
}

impl RunStatistics {
    pub fn record(&mut self, outcome: PageOutcome) {
        *self.pages_by_outcome.entry(outcome).or_insert(0) += 1;
    }

    pub fn count(&self, outcome: PageOutcome) -> u64 {
        self.pages_by_outcome.get(&outcome).copied().unwrap_or(0)
    }

    /// Pages resolved so far
    pub fn resolved(&self) -> u64 {
        self.pages_by_outcome.values().sum()
    }

    /// Pages that needed a network fetch
    pub fn fetched(&self) -> u64 {
        PageOutcome::ALL
            .iter()
            .filter(|o| o.is_fetched())
            .map(|o| self.count(*o))
            .sum()
    }

    /// Logs the run summary
    pub fn log_summary(&self) {
        info!(
            "Run finished: {} kept pages, {} filtered URLs, {} fetched, {} flushes",
            self.kept_pages,
            self.filtered_urls,
            self.fetched(),
            self.flushes
        );
        for outcome in PageOutcome::ALL {
            let count = self.count(outcome);
            if count > 0 {
                info!("  {}: {}", outcome, count);
            }
        }
    }
}

/// Summary of an output file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputStatistics {
    pub recipes: u64,
    pub pages_without_recipe: u64,
    /// Recipe count per host, for records carrying a `host` field
    pub recipes_by_host: BTreeMap<String, u64>,
    /// Recipes whose record has no `last_modified` timestamp
    pub recipes_without_timestamp: u64,
}

/// Summarizes the output file at `path`
///
/// # Returns
///
/// * `Ok(OutputStatistics)` - Summary of the file's contents
/// * `Err(TrawlError)` - The file is missing, unreadable or not an output file
pub fn summarize_output_file(path: &Path) -> Result<OutputStatistics> {
    let source = path.display().to_string();
    let value = read_json(path)?.ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("output file {} does not exist", source),
        )
    })?;
    let database = RecipesDatabase::from_json(value, &source)?;

    let mut stats = OutputStatistics {
        recipes: database.recipe_count() as u64,
        pages_without_recipe: database.pages_without_recipe().len() as u64,
        ..Default::default()
    };

    for (_, record) in database.recipes() {
        if let Some(host) = record.get("host").and_then(|h| h.as_str()) {
            *stats.recipes_by_host.entry(host.to_string()).or_insert(0) += 1;
        }
        if record.last_modified().is_none() {
            stats.recipes_without_timestamp += 1;
        }
    }

    Ok(stats)
}

/// Prints output file statistics to stdout
pub fn print_output_statistics(path: &Path, stats: &OutputStatistics) {
    println!("=== Output Statistics: {} ===\n", path.display());

    let total = stats.recipes + stats.pages_without_recipe;
    println!("Overview:");
    println!("  Pages recorded: {}", total);
    println!("  Recipes: {}", stats.recipes);
    println!("  Pages without recipe: {}", stats.pages_without_recipe);
    println!(
        "  Recipes without last-modified timestamp: {}",
        stats.recipes_without_timestamp
    );
    println!();

    if !stats.recipes_by_host.is_empty() {
        println!("Recipes by Host:");
        let mut hosts: Vec<_> = stats.recipes_by_host.iter().collect();
        hosts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (host, count) in hosts {
            println!("  {}: {}", host, count);
        }
        println!();
    }

    let recipe_rate = if total > 0 {
        (stats.recipes as f64 / total as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Recipe Rate: {:.1}% ({} / {} pages hold a recipe)",
        recipe_rate, stats.recipes, total
    );
}

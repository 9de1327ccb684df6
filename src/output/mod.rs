//! Output module for persisting and summarizing scrape results
//!
//! This module handles:
//! - Periodic flushes of the recipe database and exclusion list (`BatchWriter`)
//! - Writing the final output file
//! - Run statistics and summaries of existing output files

mod batch;
pub mod stats;

pub use batch::{exclusion_union, BatchWriter};
pub use stats::{
    print_output_statistics, summarize_output_file, OutputStatistics, RunStatistics,
};

use crate::recipe::RecipesDatabase;
use crate::storage::write_json_atomic;
use crate::Result;
use std::path::Path;
use tracing::info;

/// Writes the recipe database to `path` in the output file format
pub fn write_output(path: &Path, database: &RecipesDatabase) -> Result<()> {
    write_json_atomic(path, &database.to_json())?;
    info!(
        "Wrote {} recipes and {} pages without recipe to {}",
        database.recipe_count(),
        database.pages_without_recipe().len(),
        path.display()
    );
    Ok(())
}

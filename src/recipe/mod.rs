//! Recipe data model and extraction
//!
//! - `RecipeRecord` is an opaque string-keyed record; only `page_url` and
//!   `last_modified` carry meaning for reconciliation
//! - `RecipesDatabase` holds one run's results and owns the output wire format
//! - `RecipeExtractor` turns page HTML into a record

mod database;
mod extractor;
mod record;

pub use database::{PriorSnapshot, RecipesDatabase, PAGES_WITHOUT_RECIPE_KEY};
pub use extractor::{
    parse_duration_minutes, ExtractError, JsonLdExtractor, RecipeExtractor,
};
pub use record::RecipeRecord;

use crate::recipe::RecipeRecord;
use crate::InputError;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

/// Reserved top-level key holding the non-recipe page list in output files
pub const PAGES_WITHOUT_RECIPE_KEY: &str = "Pages without Recipe";

/// Results of a scrape run
///
/// A URL is either a recipe or a page without recipe, never both. The
/// non-recipe list is a separate field and is only folded into the output
/// object under [`PAGES_WITHOUT_RECIPE_KEY`] by [`RecipesDatabase::to_json`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipesDatabase {
    recipes: BTreeMap<String, RecipeRecord>,
    pages_without_recipe: Vec<String>,
    without_recipe_index: HashSet<String>,
}

impl RecipesDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a recipe for `url`, replacing any earlier entry for it
    pub fn add_recipe(&mut self, url: &str, record: RecipeRecord) {
        if self.without_recipe_index.remove(url) {
            self.pages_without_recipe.retain(|u| u != url);
        }
        self.recipes.insert(url.to_string(), record);
    }

    /// Records `url` as a page without recipe; returns false if already recorded
    pub fn add_non_recipe_page(&mut self, url: &str) -> bool {
        if !self.without_recipe_index.insert(url.to_string()) {
            return false;
        }
        self.recipes.remove(url);
        self.pages_without_recipe.push(url.to_string());
        true
    }

    pub fn add_non_recipe_pages<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for url in urls {
            self.add_non_recipe_page(url.as_ref());
        }
    }

    pub fn recipe(&self, url: &str) -> Option<&RecipeRecord> {
        self.recipes.get(url)
    }

    pub fn recipes(&self) -> impl Iterator<Item = (&String, &RecipeRecord)> {
        self.recipes.iter()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn pages_without_recipe(&self) -> &[String] {
        &self.pages_without_recipe
    }

    pub fn is_without_recipe(&self, url: &str) -> bool {
        self.without_recipe_index.contains(url)
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty() && self.pages_without_recipe.is_empty()
    }

    /// Serializes to the output file shape
    ///
    /// Recipes are keyed by page URL; the reserved key is appended only when
    /// there are pages without recipe.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        for (url, record) in &self.recipes {
            object.insert(url.clone(), record.clone().into_value());
        }
        if !self.pages_without_recipe.is_empty() {
            object.insert(
                PAGES_WITHOUT_RECIPE_KEY.to_string(),
                Value::from(self.pages_without_recipe.clone()),
            );
        }
        Value::Object(object)
    }

    /// Reads an output file object back into a database
    ///
    /// Entries whose value is not an object are skipped with a warning.
    pub fn from_json(value: Value, source: &str) -> Result<Self, InputError> {
        let snapshot = PriorSnapshot::from_json(value, source)?;

        let mut database = RecipesDatabase::new();
        for (url, entry) in snapshot.entries {
            match RecipeRecord::from_value(entry) {
                Some(record) => database.add_recipe(&url, record),
                None => warn!("Skipping {} in {}: not a recipe object", url, source),
            }
        }
        database.add_non_recipe_pages(&snapshot.pages_without_recipe);
        Ok(database)
    }
}

/// A previous run's output, split into raw entries and the reserved list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriorSnapshot {
    pub entries: Map<String, Value>,
    pub pages_without_recipe: Vec<String>,
}

impl PriorSnapshot {
    /// Splits an output object into its entries and the reserved key
    ///
    /// # Errors
    ///
    /// * `InputError::NotAnObject` - The value is not a JSON object
    /// * `InputError::InvalidReservedKey` - The reserved key holds anything
    ///   other than an array of strings
    pub fn from_json(value: Value, source: &str) -> Result<Self, InputError> {
        let Value::Object(mut entries) = value else {
            return Err(InputError::NotAnObject(source.to_string()));
        };

        let pages_without_recipe = match entries.remove(PAGES_WITHOUT_RECIPE_KEY) {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(url) => Ok(url),
                    _ => Err(InputError::InvalidReservedKey(
                        PAGES_WITHOUT_RECIPE_KEY.to_string(),
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => {
                return Err(InputError::InvalidReservedKey(
                    PAGES_WITHOUT_RECIPE_KEY.to_string(),
                ))
            }
        };

        Ok(Self {
            entries,
            pages_without_recipe,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.pages_without_recipe.is_empty()
    }
}

use crate::output::write_output;
use crate::recipe::RecipesDatabase;
use crate::storage::ExclusionStore;
use crate::Result;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

/// Union of the run's merged exclusion list and its pages without recipe
///
/// Order is the merged list first, then newly recorded pages.
pub fn exclusion_union(merged: &[String], database: &RecipesDatabase) -> Vec<String> {
    let mut seen = HashSet::new();
    merged
        .iter()
        .chain(database.pages_without_recipe())
        .filter(|url| seen.insert(url.as_str()))
        .cloned()
        .collect()
}

/// Persists progress every `batch_size` processed pages
///
/// A flush writes the recipe database to the output file and stores the
/// exclusion union for the homepage. Progress since the last flush is lost
/// if the process dies before the next one.
#[derive(Debug)]
pub struct BatchWriter {
    batch_size: Option<usize>,
    counter: usize,
    flushes: usize,
    output_path: Option<PathBuf>,
    exclusions: ExclusionStore,
    homepage: String,
}

impl BatchWriter {
    pub fn new(
        batch_size: Option<usize>,
        output_path: Option<PathBuf>,
        exclusions: ExclusionStore,
        homepage: impl Into<String>,
    ) -> Self {
        Self {
            batch_size,
            counter: 0,
            flushes: 0,
            output_path,
            exclusions,
            homepage: homepage.into(),
        }
    }

    /// Counts one processed page and flushes once the batch is full
    ///
    /// Returns whether a flush happened. Without a batch size this never flushes.
    pub fn maybe_flush(&mut self, database: &RecipesDatabase, merged: &[String]) -> Result<bool> {
        let Some(batch_size) = self.batch_size else {
            return Ok(false);
        };

        self.counter += 1;
        if self.counter < batch_size {
            return Ok(false);
        }

        info!("Writing batch of {} pages", self.counter);
        self.persist(database, merged)?;
        self.counter = 0;
        self.flushes += 1;
        Ok(true)
    }

    /// Final write at the end of a run
    ///
    /// The exclusion store is always updated; the output file only when one
    /// is configured.
    pub fn finish(&mut self, database: &RecipesDatabase, merged: &[String]) -> Result<()> {
        self.persist(database, merged)?;
        self.counter = 0;
        Ok(())
    }

    fn persist(&self, database: &RecipesDatabase, merged: &[String]) -> Result<()> {
        if let Some(path) = &self.output_path {
            write_output(path, database)?;
        }
        self.exclusions
            .save(&self.homepage, &exclusion_union(merged, database))
    }

    /// Pages counted since the last flush
    pub fn pending(&self) -> usize {
        self.counter
    }

    pub fn flush_count(&self) -> usize {
        self.flushes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::RecipeRecord;
    use crate::storage::read_json;
    use serde_json::json;
    use tempfile::TempDir;

    const HOMEPAGE: &str = "https://site.com";

    fn writer(dir: &TempDir, batch_size: Option<usize>) -> BatchWriter {
        BatchWriter::new(
            batch_size,
            Some(dir.path().join("recipes.json")),
            ExclusionStore::new(dir.path().join("_recipe_scraper_exclusions.json")),
            HOMEPAGE,
        )
    }

    #[test]
    fn test_batch_boundary() {
        let dir = TempDir::new().unwrap();
        let mut writer = writer(&dir, Some(3));
        let db = RecipesDatabase::new();

        assert!(!writer.maybe_flush(&db, &[]).unwrap());
        assert!(!writer.maybe_flush(&db, &[]).unwrap());
        assert_eq!(writer.flush_count(), 0);
        assert!(!dir.path().join("recipes.json").exists());

        assert!(writer.maybe_flush(&db, &[]).unwrap());
        assert_eq!(writer.flush_count(), 1);
        assert_eq!(writer.pending(), 0);
        assert!(dir.path().join("recipes.json").exists());

        assert!(!writer.maybe_flush(&db, &[]).unwrap());
        assert_eq!(writer.pending(), 1);
    }

    #[test]
    fn test_no_batch_size_never_flushes() {
        let dir = TempDir::new().unwrap();
        let mut writer = writer(&dir, None);
        for _ in 0..10 {
            assert!(!writer.maybe_flush(&RecipesDatabase::new(), &[]).unwrap());
        }
        assert_eq!(writer.flush_count(), 0);
    }

    #[test]
    fn test_flush_writes_database_and_exclusions() {
        let dir = TempDir::new().unwrap();
        let mut writer = writer(&dir, Some(1));

        let mut db = RecipesDatabase::new();
        db.add_recipe(
            "https://site.com/cake/",
            RecipeRecord::from_value(json!({"title": "Cake"})).unwrap(),
        );
        db.add_non_recipe_page("https://site.com/about/");
        db.add_non_recipe_page("https://site.com/old/");

        let merged = vec!["https://site.com/old/".to_string()];
        assert!(writer.maybe_flush(&db, &merged).unwrap());

        let output = read_json(&dir.path().join("recipes.json")).unwrap().unwrap();
        assert_eq!(output["https://site.com/cake/"]["title"], "Cake");

        let store = ExclusionStore::new(dir.path().join("_recipe_scraper_exclusions.json"));
        assert_eq!(
            store.load(HOMEPAGE).unwrap(),
            Some(vec![
                "https://site.com/old/".to_string(),
                "https://site.com/about/".to_string()
            ])
        );
    }

    #[test]
    fn test_finish_without_output_file() {
        let dir = TempDir::new().unwrap();
        let store = ExclusionStore::new(dir.path().join("ex.json"));
        let mut writer = BatchWriter::new(None, None, store.clone(), HOMEPAGE);

        let mut db = RecipesDatabase::new();
        db.add_non_recipe_page("https://site.com/about/");
        writer.finish(&db, &[]).unwrap();

        assert_eq!(
            store.load(HOMEPAGE).unwrap(),
            Some(vec!["https://site.com/about/".to_string()])
        );
        assert!(!dir.path().join("recipes.json").exists());
    }
}

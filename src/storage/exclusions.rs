use crate::storage::{read_json, write_json_atomic};
use crate::{InputError, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Persisted lists of pages known to hold no recipe, keyed by homepage
///
/// Several homepages share one file. Saving one homepage rewrites the whole
/// store with every other entry preserved.
#[derive(Debug, Clone)]
pub struct ExclusionStore {
    path: PathBuf,
}

impl ExclusionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole store; a missing file is an empty store
    pub fn load_all(&self) -> Result<Map<String, Value>> {
        match read_json(&self.path)? {
            None => Ok(Map::new()),
            Some(Value::Object(store)) => Ok(store),
            Some(_) => Err(InputError::NotAnObject(self.path.display().to_string()).into()),
        }
    }

    /// Loads the exclusion list for `homepage`
    ///
    /// Returns `Ok(None)` when the store or the homepage entry does not exist.
    /// Non-string items in a stored list are ignored.
    pub fn load(&self, homepage: &str) -> Result<Option<Vec<String>>> {
        let store = self.load_all()?;
        let Some(entry) = store.get(homepage) else {
            return Ok(None);
        };

        let urls = entry
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(Some(urls))
    }

    /// Sets the exclusion list for `homepage`, keeping every other entry
    pub fn save(&self, homepage: &str, urls: &[String]) -> Result<()> {
        let mut store = self.load_all()?;
        store.insert(homepage.to_string(), Value::from(urls.to_vec()));
        write_json_atomic(&self.path, &Value::Object(store))?;
        debug!(
            "Saved {} excluded pages for {} to {}",
            urls.len(),
            homepage,
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrawlError;
    use serde_json::json;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ExclusionStore {
        ExclusionStore::new(dir.path().join("_recipe_scraper_exclusions.json"))
    }

    #[test]
    fn test_load_absent() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert_eq!(store.load("https://x.com").unwrap(), None);

        store.save("https://y.com", &["https://y.com/p".to_string()]).unwrap();
        assert_eq!(store.load("https://x.com").unwrap(), None);
    }

    #[test]
    fn test_save_preserves_other_homepages() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store.save("https://x.com", &["https://x.com/p1".to_string()]).unwrap();
        store.save("https://y.com", &["https://y.com/p1".to_string()]).unwrap();
        store
            .save(
                "https://x.com",
                &["https://x.com/p1".to_string(), "https://x.com/p2".to_string()],
            )
            .unwrap();

        assert_eq!(
            store.load("https://x.com").unwrap(),
            Some(vec!["https://x.com/p1".to_string(), "https://x.com/p2".to_string()])
        );
        assert_eq!(
            store.load("https://y.com").unwrap(),
            Some(vec!["https://y.com/p1".to_string()])
        );

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        let keys: Vec<&str> = raw.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["https://x.com", "https://y.com"]);
    }

    #[test]
    fn test_rejects_non_object_store() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        std::fs::write(store.path(), json!(["a"]).to_string()).unwrap();

        assert!(matches!(store.load("https://x.com"), Err(TrawlError::Input(_))));
        assert!(store.save("https://x.com", &[]).is_err());
    }
}

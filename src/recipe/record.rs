use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const PAGE_URL: &str = "page_url";
const LAST_MODIFIED: &str = "last_modified";

/// A scraped recipe
///
/// Fields vary by site and extractor version, so the record is kept as an
/// ordered JSON object and round-trips unknown fields untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeRecord(Map<String, Value>);

impl RecipeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Builds a record from a JSON value; `None` unless it is an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn page_url(&self) -> Option<&str> {
        self.0.get(PAGE_URL).and_then(Value::as_str)
    }

    /// The stored timestamp; JSON null and a missing field both read as `None`
    pub fn last_modified(&self) -> Option<&str> {
        self.0.get(LAST_MODIFIED).and_then(Value::as_str)
    }

    pub fn set_page_url(&mut self, url: &str) {
        self.0.insert(PAGE_URL.to_string(), Value::String(url.to_string()));
    }

    pub fn set_last_modified(&mut self, last_modified: Option<&str>) {
        let value = last_modified
            .map(|lm| Value::String(lm.to_string()))
            .unwrap_or(Value::Null);
        self.0.insert(LAST_MODIFIED.to_string(), value);
    }

    pub fn title(&self) -> Option<&str> {
        self.0.get("title").and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

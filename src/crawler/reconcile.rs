//! Reconciliation of discovered pages against earlier results
//!
//! A run consults two sources before fetching anything: the persisted
//! exclusion list and a prior output snapshot. These helpers prepare both.

use crate::recipe::{PriorSnapshot, RecipeRecord};
use crate::sitemap::Page;
use crate::url::is_valid_url;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

/// Merges the stored exclusion list with the snapshot's pages without recipe
///
/// Stored entries come first; duplicates are dropped. `store_name` names the
/// exclusion file in the log line reporting where exclusions were found.
pub fn handle_exclusions_list(
    stored: Option<Vec<String>>,
    snapshot: Option<&PriorSnapshot>,
    store_name: &str,
) -> Vec<String> {
    let from_store = stored.unwrap_or_default();
    let from_input: &[String] = snapshot
        .map(|s| s.pages_without_recipe.as_slice())
        .unwrap_or_default();

    let mut seen = HashSet::new();
    let merged: Vec<String> = from_store
        .iter()
        .chain(from_input)
        .filter(|url| seen.insert(url.as_str()))
        .cloned()
        .collect();

    if merged.is_empty() {
        return merged;
    }

    info!(
        "{}",
        exclusion_summary(store_name, from_store.len(), from_input.len(), merged.len())
    );

    merged
}

/// Log line for a non-empty exclusion merge, with counts per source
fn exclusion_summary(
    store_name: &str,
    from_store: usize,
    from_input: usize,
    merged: usize,
) -> String {
    match (from_store, from_input) {
        (0, _) => format!("Found {} pages to exclude in input dict", merged),
        (_, 0) => format!("Found {} pages to exclude in {} file", merged, store_name),
        _ => format!(
            "Found {} pages to exclude: {} in {} file, {} in input file",
            merged, from_store, store_name, from_input
        ),
    }
}

/// Validates prior snapshot entries and indexes them by URL
///
/// Entries with an invalid URL key, a non-object value or a missing or
/// unparseable `last_modified` are dropped with a warning; they are treated
/// as absent from the snapshot.
pub fn handle_input_dict(entries: Map<String, Value>) -> HashMap<String, RecipeRecord> {
    info!("Found {} pages with recipe in input dict", entries.len());

    let mut valid = HashMap::new();
    let mut invalid = Vec::new();

    for (url, value) in entries {
        if let Err(e) = is_valid_url(&url) {
            warn!("Input key error: {}: {}", url, e);
            invalid.push(url);
            continue;
        }

        let Some(record) = RecipeRecord::from_value(value) else {
            warn!("Input key error: {}: entry is not an object", url);
            invalid.push(url);
            continue;
        };

        match record.last_modified() {
            Some(lm) if is_iso_timestamp(lm) => {
                valid.insert(url, record);
            }
            Some(lm) => {
                warn!("Input key error: {}: invalid last_modified '{}'", url, lm);
                invalid.push(url);
            }
            None => {
                warn!("Input key error: {}: missing last_modified", url);
                invalid.push(url);
            }
        }
    }

    if !invalid.is_empty() {
        warn!(
            "Found {} invalid urls in input dict. Entries must look like \
             'url': {{'title': ..., 'last_modified': 'xxxx-xx-xxTxx:xx:xx+xx:xx'}}. \
             Continuing without input data for: {:?}",
            invalid.len(),
            invalid
        );
    }

    valid
}

/// Returns the snapshot record for `page` if it is still up to date
///
/// Up to date means the stored `last_modified` equals the page's as a string.
/// A missing timestamp on either side never matches.
pub fn url_in_input_data<'a>(
    page: &Page,
    input: &'a HashMap<String, RecipeRecord>,
) -> Option<&'a RecipeRecord> {
    let record = input.get(&page.url)?;
    match (page.last_modified.as_deref(), record.last_modified()) {
        (Some(discovered), Some(stored)) if discovered == stored => Some(record),
        _ => None,
    }
}

/// True for ISO-8601 dates and datetimes, with or without an offset
fn is_iso_timestamp(value: &str) -> bool {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value).is_ok()
        || DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%:z").is_ok()
        || DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").is_ok()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

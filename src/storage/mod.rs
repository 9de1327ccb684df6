//! Storage module for persisting scrape data
//!
//! This module handles the JSON files a run reads and writes:
//! - Output and input snapshot files (`read_json` / `write_json_atomic`)
//! - The per-homepage exclusion store (`ExclusionStore`)
//!
//! Writes go to a temporary file in the target directory that is then renamed
//! over the target, so a failed write never leaves a truncated file behind.

mod exclusions;

pub use exclusions::ExclusionStore;

use crate::{Result, TrawlError};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads a JSON file
///
/// # Returns
///
/// * `Ok(Some(Value))` - The parsed document
/// * `Ok(None)` - The file does not exist
/// * `Err(TrawlError)` - The file could not be read or is not valid JSON
pub fn read_json(path: &Path) -> Result<Option<Value>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| TrawlError::Json {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes a JSON document, replacing the target in a single rename
pub fn write_json_atomic(path: &Path, value: &Value) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(|source| TrawlError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    bytes.push(b'\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let temp = temp_path(path);
    fs::write(&temp, &bytes)?;
    if let Err(e) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

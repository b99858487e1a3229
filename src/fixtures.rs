//! JSON fixture decoding shared by the catalog and library loaders.
//!
//! Fixtures are JSON arrays. A malformed entry (wrong type, non-numeric
//! rating) is skipped with a warning instead of failing the whole file.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use tracing::warn;

use crate::error::{Error, Result};

/// Read and decode a fixture file
pub fn read_entries<T: DeserializeOwned>(path: &Path, kind: &str) -> Result<Vec<T>> {
    let raw = std::fs::read_to_string(path).map_err(|e| Error::io(path.display().to_string(), e))?;
    decode_entries(&raw, kind)
}

/// Decode a JSON array, keeping only the entries that parse as `T`
pub fn decode_entries<T: DeserializeOwned>(raw: &str, kind: &str) -> Result<Vec<T>> {
    let values: Vec<Value> = serde_json::from_str(raw)?;
    let total = values.len();

    let entries: Vec<T> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping malformed {} entry #{}: {}", kind, index, e);
                None
            }
        })
        .collect();

    if entries.len() < total {
        warn!(
            "Decoded {}/{} {} entries",
            entries.len(),
            total,
            kind
        );
    }

    Ok(entries)
}

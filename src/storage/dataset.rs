//! Dataset-import collaborator
//!
//! Seed datasets (books, users) come from a resource identifier. A
//! resource that does not exist, or cannot be fetched, yields an empty
//! sequence: the caller simply sees "zero items imported", never an
//! error.

use std::fs;
use std::path::PathBuf;

use serde_json::Value;

/// Fetches book or user snapshots by resource identifier
#[cfg_attr(test, mockall::automock)]
pub trait DatasetSource: Send + Sync {
    fn fetch(&self, resource: &str) -> Vec<Value>;
}

/// Reads `<dataset_dir>/<resource>.json` from disk
pub struct JsonDatasetSource {
    dir: PathBuf,
}

impl JsonDatasetSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DatasetSource for JsonDatasetSource {
    fn fetch(&self, resource: &str) -> Vec<Value> {
        let path = self.dir.join(format!("{}.json", resource));
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(_) => {
                tracing::debug!("Dataset {} not available, importing nothing", path.display());
                return Vec::new();
            }
        };
        match serde_json::from_str(&text) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Dataset {} is not valid JSON: {}", path.display(), e);
                Vec::new()
            }
        }
    }
}

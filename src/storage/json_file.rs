//! JSON-file storage backend
//!
//! One JSON document per record kind, named after the kind's key, under a
//! configurable data directory. A missing file is an empty collection,
//! matching the "first run" behavior of the storage contract.

use std::fs;
use std::path::PathBuf;

use serde_json::Value;

use super::{RecordKind, StorageBackend};
use crate::error::{AppError, AppResult};

pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, kind: RecordKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.key()))
    }
}

impl StorageBackend for JsonFileStorage {
    fn load_all(&self, kind: RecordKind) -> AppResult<Vec<Value>> {
        let path = self.path(kind);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Reading {} failed: {}",
                    path.display(),
                    e
                )))
            }
        };
        let records = serde_json::from_str(&text)?;
        Ok(records)
    }

    fn save_all(&self, kind: RecordKind, records: Vec<Value>) -> AppResult<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| AppError::Storage(format!("Creating data dir failed: {}", e)))?;
        let path = self.path(kind);
        let text = serde_json::to_string_pretty(&records)?;
        fs::write(&path, text).map_err(|e| {
            AppError::Storage(format!("Writing {} failed: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());
        assert!(storage.load_all(RecordKind::Books).unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());
        let records = vec![json!({"book_id": 0, "title": "A"})];
        storage
            .save_all(RecordKind::Books, records.clone())
            .unwrap();
        assert_eq!(storage.load_all(RecordKind::Books).unwrap(), records);
        // kinds are kept apart
        assert!(storage.load_all(RecordKind::Users).unwrap().is_empty());
    }
}

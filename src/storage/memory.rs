//! In-memory storage backend
//!
//! The default backend for embedding and tests: collections live in a
//! mutex-guarded map and die with the process.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use super::{RecordKind, StorageBackend};
use crate::error::{AppError, AppResult};

#[derive(Default)]
pub struct MemoryStorage {
    collections: Mutex<HashMap<RecordKind, Vec<Value>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot of a collection, for assertions in tests
    pub fn snapshot(&self, kind: RecordKind) -> Vec<Value> {
        self.collections
            .lock()
            .map(|map| map.get(&kind).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

impl StorageBackend for MemoryStorage {
    fn load_all(&self, kind: RecordKind) -> AppResult<Vec<Value>> {
        let map = self
            .collections
            .lock()
            .map_err(|_| AppError::Storage("Storage mutex poisoned".to_string()))?;
        Ok(map.get(&kind).cloned().unwrap_or_default())
    }

    fn save_all(&self, kind: RecordKind, records: Vec<Value>) -> AppResult<()> {
        let mut map = self
            .collections
            .lock()
            .map_err(|_| AppError::Storage("Storage mutex poisoned".to_string()))?;
        map.insert(kind, records);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collections_are_independent() {
        let storage = MemoryStorage::new();
        storage
            .save_all(RecordKind::Users, vec![json!({"user_id": 1})])
            .unwrap();
        assert_eq!(storage.load_all(RecordKind::Users).unwrap().len(), 1);
        assert!(storage.load_all(RecordKind::Books).unwrap().is_empty());
    }
}

//! Persistence collaborators
//!
//! The core never talks to a concrete store; it goes through
//! [`StorageBackend`], a load-all/save-all contract over plain JSON
//! snapshots. Saves are fire-and-forget: the in-memory mutation has
//! already happened by the time a save is issued, so a failing backend is
//! logged and never rolls the domain back.

pub mod dataset;
pub mod json_file;
pub mod memory;
pub mod notify;

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::AppResult;

pub use dataset::{DatasetSource, JsonDatasetSource};
pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;
pub use notify::{LogNotificationSender, NotificationSender};

/// The three kinds of persisted record collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Books,
    Users,
    LoanRecords,
}

impl RecordKind {
    /// Stable key a backend may use to address the collection
    pub fn key(&self) -> &'static str {
        match self {
            RecordKind::Books => "library_books",
            RecordKind::Users => "library_users",
            RecordKind::LoanRecords => "library_borrowing_records",
        }
    }
}

/// Load-all/save-all contract implemented by concrete stores
#[cfg_attr(test, mockall::automock)]
pub trait StorageBackend: Send + Sync {
    /// All snapshots of the given kind; an absent collection loads empty
    fn load_all(&self, kind: RecordKind) -> AppResult<Vec<Value>>;

    /// Replace the stored collection of the given kind
    fn save_all(&self, kind: RecordKind, records: Vec<Value>) -> AppResult<()>;
}

/// Typed facade over a [`StorageBackend`]
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn StorageBackend>,
}

impl Storage {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Load and decode every snapshot of a kind. Snapshots that fail to
    /// decode are dropped with a warning so one corrupt entry cannot take
    /// the whole collection down.
    pub fn load<T: DeserializeOwned>(&self, kind: RecordKind) -> AppResult<Vec<T>> {
        let values = self.backend.load_all(kind)?;
        let mut records = Vec::with_capacity(values.len());
        for value in values {
            match serde_json::from_value(value) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(kind = kind.key(), "Skipping undecodable snapshot: {}", e);
                }
            }
        }
        Ok(records)
    }

    /// Encode and persist a collection, fire-and-forget
    pub fn save<T: Serialize>(&self, kind: RecordKind, records: &[T]) {
        let values: Result<Vec<Value>, _> =
            records.iter().map(serde_json::to_value).collect();
        let result = match values {
            Ok(values) => self.backend.save_all(kind, values),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            tracing::warn!(kind = kind.key(), "Persisting snapshots failed: {}", e);
        }
    }
}

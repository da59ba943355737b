//! Measurement ingest.
//!
//! Stores every `MEASUREMENT` message as `{device: <topic>, data: {...}}`
//! through the [`MeasurementRepository`] port.  Other commands are ignored.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::ports::{MeasurementRepository, StorageError};
use crate::backend::{BackendError, MessageHandler};

/// A stored measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementDocument {
    /// Topic the measurement arrived on.
    pub device: String,
    pub data: Value,
}

pub struct IngestHandler<R> {
    repository: R,
}

impl<R: MeasurementRepository> IngestHandler<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

impl<R: MeasurementRepository> MessageHandler for IngestHandler<R> {
    fn name(&self) -> &'static str {
        "ingest"
    }

    fn handle(&mut self, topic: &str, message: &Value) -> Result<(), BackendError> {
        if message.get("command").and_then(Value::as_str) != Some("MEASUREMENT") {
            return Ok(());
        }

        let document = MeasurementDocument {
            device: topic.to_owned(),
            data: message
                .get("data")
                .cloned()
                .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
        };
        let id = self.repository.insert(&document)?;
        info!("Ingest: stored measurement {} from {}", id, document.device);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// In-memory repository
// ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct Store {
    documents: VecDeque<(u64, MeasurementDocument)>,
    next_id: u64,
}

/// What to do once the document bound is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Unbounded,
    /// Refuse further inserts.
    Limit(usize),
    /// Drop the oldest document to make room.
    Retain(usize),
}

/// Cloneable in-memory repository; clones share the same documents.
#[derive(Clone)]
pub struct InMemoryRepository {
    store: Arc<Mutex<Store>>,
    bound: Bound,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self {
            store: Arc::default(),
            bound: Bound::Unbounded,
        }
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse inserts with [`StorageError::Full`] beyond `limit` documents.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            bound: Bound::Limit(limit),
            ..Self::default()
        }
    }

    /// Keep at most the newest `max` documents.  Ids keep counting up.
    pub fn with_retention(max: usize) -> Self {
        Self {
            bound: Bound::Retain(max.max(1)),
            ..Self::default()
        }
    }

    pub fn documents(&self) -> Vec<(u64, MeasurementDocument)> {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .documents
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .documents
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MeasurementRepository for InMemoryRepository {
    fn insert(&mut self, document: &MeasurementDocument) -> Result<u64, StorageError> {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        match self.bound {
            Bound::Limit(limit) if store.documents.len() >= limit => return Err(StorageError::Full),
            Bound::Retain(max) => {
                while store.documents.len() >= max {
                    store.documents.pop_front();
                }
            }
            _ => {}
        }
        store.next_id += 1;
        let id = store.next_id;
        store.documents.push_back((id, document.clone()));
        Ok(id)
    }
}

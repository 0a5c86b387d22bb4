//! Capped, newest-first history of finished breathing sessions.
//!
//! The list for a key is stored as one JSON array through a [`KvBackend`].
//! Every save rewrites the full array, truncated to `max_records`.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::backend::KvBackend;
use crate::error::StorageError;

/// Storage key for breathing session history.
pub const HISTORY_KEY: &str = "breathing_sessions";

/// Records kept per key unless configured otherwise.
pub const DEFAULT_MAX_RECORDS: usize = 10;

/// Immutable summary of a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub pattern_key: String,
    pub pattern_name: String,
    pub elapsed_secs: u64,
    pub target_secs: u64,
    /// `elapsed_secs >= target_secs` at the moment the session ended.
    pub completed: bool,
    pub timestamp: DateTime<Utc>,
}

/// Persistence contract used by the session engine.
pub trait RecordStore {
    /// Records for `key`, newest first. Empty when nothing was stored.
    fn load_records(&self, key: &str) -> Result<Vec<SessionRecord>, StorageError>;

    /// Overwrite the full list for `key`.
    fn save_records(&self, key: &str, records: &[SessionRecord]) -> Result<(), StorageError>;

    /// Prepend `record`, evicting the oldest entries past the cap.
    ///
    /// A corrupt stored list is replaced rather than blocking the append.
    fn append(&self, key: &str, record: SessionRecord) -> Result<(), StorageError> {
        let mut records = match self.load_records(key) {
            Ok(records) => records,
            Err(StorageError::Corrupt { key, message }) => {
                tracing::warn!("discarding corrupt history for '{}': {}", key, message);
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        records.insert(0, record);
        self.save_records(key, &records)
    }
}

/// [`RecordStore`] over any key-value backend.
pub struct SessionLog<B> {
    backend: B,
    max_records: usize,
}

impl<B: KvBackend> SessionLog<B> {
    pub fn new(backend: B) -> Self {
        Self::with_capacity(backend, DEFAULT_MAX_RECORDS)
    }

    /// A cap of zero is treated as one so an append is never silently dropped.
    pub fn with_capacity(backend: B, max_records: usize) -> Self {
        Self {
            backend,
            max_records: max_records.max(1),
        }
    }

    pub fn max_records(&self) -> usize {
        self.max_records
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn clear(&self, key: &str) -> Result<(), StorageError> {
        self.backend.remove(key)
    }
}

impl<B: KvBackend> RecordStore for SessionLog<B> {
    fn load_records(&self, key: &str) -> Result<Vec<SessionRecord>, StorageError> {
        load_capped(&self.backend, key, self.max_records)
    }

    fn save_records(&self, key: &str, records: &[SessionRecord]) -> Result<(), StorageError> {
        save_capped(&self.backend, key, records, self.max_records)
    }
}

/// Decode the JSON array stored under `key`, keeping at most `cap` items.
pub(crate) fn load_capped<T, B>(backend: &B, key: &str, cap: usize) -> Result<Vec<T>, StorageError>
where
    T: DeserializeOwned,
    B: KvBackend + ?Sized,
{
    let Some(raw) = backend.get(key)? else {
        return Ok(Vec::new());
    };
    let mut items: Vec<T> = serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    items.truncate(cap);
    Ok(items)
}

/// Overwrite `key` with the first `cap` items as one JSON array.
pub(crate) fn save_capped<T, B>(
    backend: &B,
    key: &str,
    items: &[T],
    cap: usize,
) -> Result<(), StorageError>
where
    T: Serialize,
    B: KvBackend + ?Sized,
{
    let kept = &items[..items.len().min(cap)];
    let json = serde_json::to_string(kept).map_err(|e| StorageError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    backend.set(key, &json)?;
    tracing::debug!("saved {} record(s) under '{}'", kept.len(), key);
    Ok(())
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn load_records(&self, key: &str) -> Result<Vec<SessionRecord>, StorageError> {
        (**self).load_records(key)
    }

    fn save_records(&self, key: &str, records: &[SessionRecord]) -> Result<(), StorageError> {
        (**self).save_records(key, records)
    }

    fn append(&self, key: &str, record: SessionRecord) -> Result<(), StorageError> {
        (**self).append(key, record)
    }
}

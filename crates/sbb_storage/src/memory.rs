//! In-memory record store for testing.

use crate::error::{StorageError, StorageResult};
use crate::store::{validate_name, RecordHandle, RecordStore};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory record store.
///
/// This store keeps every record in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Dry runs that only need the retention decisions
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use sbb_storage::{InMemoryStore, RecordStore};
///
/// let mut store = InMemoryStore::new();
/// store.put("a", b"test data").unwrap();
/// assert_eq!(store.len(), 1);
/// assert_eq!(store.names(), vec!["a".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the names of all live records in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.records.read().keys().cloned().collect()
    }

    /// Returns a handle for a live record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such record is live.
    pub fn handle(&self, name: &str) -> StorageResult<RecordHandle> {
        if self.records.read().contains_key(name) {
            Ok(RecordHandle::new(name))
        } else {
            Err(StorageError::NotFound(name.to_string()))
        }
    }

    /// Clears all records from the store.
    pub fn clear(&mut self) {
        self.records.write().clear();
    }
}

impl RecordStore for InMemoryStore {
    fn put(&mut self, name: &str, data: &[u8]) -> StorageResult<RecordHandle> {
        validate_name(name)?;
        let mut records = self.records.write();
        if records.contains_key(name) {
            return Err(StorageError::AlreadyExists(name.to_string()));
        }
        records.insert(name.to_string(), data.to_vec());
        Ok(RecordHandle::new(name))
    }

    fn get(&self, handle: &RecordHandle) -> StorageResult<Vec<u8>> {
        self.records
            .read()
            .get(handle.name())
            .cloned()
            .ok_or_else(|| StorageError::NotFound(handle.name().to_string()))
    }

    fn remove(&mut self, handle: &RecordHandle) -> StorageResult<()> {
        self.records
            .write()
            .remove(handle.name())
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(handle.name().to_string()))
    }

    fn contains(&self, handle: &RecordHandle) -> bool {
        self.records.read().contains_key(handle.name())
    }

    fn len(&self) -> usize {
        self.records.read().len()
    }
}

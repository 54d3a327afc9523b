//! Record store trait definition.

use crate::error::{StorageError, StorageResult};
use std::fmt;

/// Handle to a record written to a [`RecordStore`].
///
/// The handle is the only way to reach a record after it was written. It is
/// deliberately not `Clone`: the owner of the handle is the owner of the
/// record, and removing the record consumes nothing but a borrow of it.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct RecordHandle {
    name: String,
}

impl RecordHandle {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the record name this handle refers to.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for RecordHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A store for persisted segment records.
///
/// Stores are **opaque key/value stores**. SBB owns the record format; stores
/// only keep bytes under a name.
///
/// # Invariants
///
/// - `put` never overwrites: a name can hold at most one live record
/// - `get` returns exactly the bytes passed to `put`
/// - `remove` deletes the record; a second `remove` fails with `NotFound`
/// - Stores must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing
/// - [`super::DirectoryStore`] - One file per record
pub trait RecordStore: Send + Sync {
    /// Writes a new record and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name is empty or contains a path separator
    /// - A record with this name already exists
    /// - An I/O error occurs
    fn put(&mut self, name: &str, data: &[u8]) -> StorageResult<RecordHandle>;

    /// Reads back the bytes of a record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the record was removed, or an I/O error.
    fn get(&self, handle: &RecordHandle) -> StorageResult<Vec<u8>>;

    /// Removes a record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the record does not exist, or an I/O error.
    fn remove(&mut self, handle: &RecordHandle) -> StorageResult<()>;

    /// Returns true if the record is still present.
    fn contains(&self, handle: &RecordHandle) -> bool;

    /// Returns the number of live records.
    fn len(&self) -> usize;

    /// Returns true if the store holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Checks that a record name can be used as a key by every store.
pub(crate) fn validate_name(name: &str) -> StorageResult<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
    {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

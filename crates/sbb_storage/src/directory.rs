//! Directory-backed record store for persistent output.

use crate::error::{StorageError, StorageResult};
use crate::store::{validate_name, RecordHandle, RecordStore};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// A record store that keeps one file per record in a directory.
///
/// Records written by this store survive the process and form the output
/// of a recording run.
///
/// # Durability
///
/// Each record is written with `create_new` and synced with `sync_all`
/// before `put` returns.
///
/// # Example
///
/// ```no_run
/// use sbb_storage::{DirectoryStore, RecordStore};
/// use std::path::Path;
///
/// let mut store = DirectoryStore::create_clean(Path::new("sbb_output")).unwrap();
/// let handle = store.put("priority_segment0_log.json", b"{}").unwrap();
/// store.remove(&handle).unwrap();
/// ```
#[derive(Debug)]
pub struct DirectoryStore {
    path: PathBuf,
    live: RwLock<BTreeSet<String>>,
}

impl DirectoryStore {
    /// Opens a directory store, creating the directory if needed.
    ///
    /// Files already present in the directory are adopted as live records.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or listed.
    pub fn open(path: &Path) -> StorageResult<Self> {
        fs::create_dir_all(path)?;

        let mut live = BTreeSet::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    live.insert(name.to_string());
                }
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            live: RwLock::new(live),
        })
    }

    /// Removes the directory with all of its contents and recreates it empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be removed or created.
    pub fn create_clean(path: &Path) -> StorageResult<Self> {
        match fs::remove_dir_all(path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Self::open(path)
    }

    /// Returns the directory this store writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the names of all live records in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.live.read().iter().cloned().collect()
    }

    /// Returns a handle for a record that already exists on disk.
    ///
    /// Used to read back the output of an earlier run.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such record is live.
    pub fn handle(&self, name: &str) -> StorageResult<RecordHandle> {
        if self.live.read().contains(name) {
            Ok(RecordHandle::new(name))
        } else {
            Err(StorageError::NotFound(name.to_string()))
        }
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl RecordStore for DirectoryStore {
    fn put(&mut self, name: &str, data: &[u8]) -> StorageResult<RecordHandle> {
        validate_name(name)?;
        let mut live = self.live.write();
        if live.contains(name) {
            return Err(StorageError::AlreadyExists(name.to_string()));
        }

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.record_path(name))
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(data)?;
        file.sync_all()?;

        live.insert(name.to_string());
        Ok(RecordHandle::new(name))
    }

    fn get(&self, handle: &RecordHandle) -> StorageResult<Vec<u8>> {
        if !self.live.read().contains(handle.name()) {
            return Err(StorageError::NotFound(handle.name().to_string()));
        }
        Ok(fs::read(self.record_path(handle.name()))?)
    }

    fn remove(&mut self, handle: &RecordHandle) -> StorageResult<()> {
        let mut live = self.live.write();
        if !live.contains(handle.name()) {
            return Err(StorageError::NotFound(handle.name().to_string()));
        }
        // The name stays live until the file is gone.
        match fs::remove_file(self.record_path(handle.name())) {
            Ok(()) => {
                live.remove(handle.name());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                live.remove(handle.name());
                Err(StorageError::NotFound(handle.name().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn contains(&self, handle: &RecordHandle) -> bool {
        self.live.read().contains(handle.name())
    }

    fn len(&self) -> usize {
        self.live.read().len()
    }
}

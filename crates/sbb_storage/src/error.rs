//! Error types for record store operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The record does not exist in the store.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The record already exists and records are write-once.
    #[error("record already exists: {0}")]
    AlreadyExists(String),

    /// The record name cannot be used as a store key.
    #[error("invalid record name: {0:?}")]
    InvalidName(String),
}

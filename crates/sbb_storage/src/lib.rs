//! # SBB Storage
//!
//! Record store trait and implementations for SBB.
//!
//! A record store keeps the persisted representation of every segment that
//! is currently resident in the eviction queue. Stores are **opaque** - they
//! map a record name to a byte payload and know nothing about frames,
//! segments or the record format.
//!
//! ## Design Principles
//!
//! - A record is written once (on admission) and removed once (on eviction)
//! - Stores never interpret the payload
//! - Must be `Send + Sync` so a finished segment can be handed to another thread
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and dry runs
//! - [`DirectoryStore`] - One file per record inside an output directory
//!
//! ## Example
//!
//! ```rust
//! use sbb_storage::{InMemoryStore, RecordStore};
//!
//! let mut store = InMemoryStore::new();
//! let handle = store.put("segment0_log.json", b"{}").unwrap();
//! assert_eq!(store.get(&handle).unwrap(), b"{}");
//! store.remove(&handle).unwrap();
//! assert!(store.is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod directory;
mod error;
mod memory;
mod store;

pub use directory::DirectoryStore;
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryStore;
pub use store::{RecordHandle, RecordStore};

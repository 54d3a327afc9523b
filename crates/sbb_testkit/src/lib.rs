//! # SBB Testkit
//!
//! Test utilities for SBB.
//!
//! This crate provides:
//! - Frame and segment builders
//! - Temporary directory stores
//! - One-call recorder runs
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sbb_testkit::prelude::*;
//!
//! #[test]
//! fn records_something() {
//!     let (summary, _queue) = record_in_memory(&small_config(), uniform_stream(10, 0.9, 1.0));
//!     assert!(summary.stats.segments_closed > 0);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;

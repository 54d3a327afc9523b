//! # SBB Core
//!
//! Streaming segmentation and budgeted retention for SBB.
//!
//! This crate provides:
//! - Segments with windowed slicing, merging and similarity queries
//! - A segmentation state machine (ACTIVE → BUFFERING ⇄ WAITING → TERMINATE)
//! - A closed-form compression planner
//! - A budget-bounded eviction queue (priority or FIFO)
//! - Value models for scoring frames
//! - The [`Recorder`] that drives a frame stream through all of the above
//!
//! ## Key Invariants
//!
//! - Frames are processed strictly in arrival order, one at a time
//! - A segment's object set is always the union of its frames' objects
//! - Segments reach the queue in the order they were closed
//! - After every push the resident cost is below the budget
//! - Any state/input pair outside the transition table aborts the run
//!
//! ## Example
//!
//! ```rust
//! use sbb_core::{Config, Frame, Recorder};
//! use sbb_storage::InMemoryStore;
//!
//! let config = Config::new().major_buffer_max(8).pre_buffer_min(2);
//! let mut recorder = Recorder::new(&config, InMemoryStore::new()).unwrap();
//! for i in 0..20 {
//!     recorder.ingest(Frame::new(i, 0.8, 1024.0)).unwrap();
//! }
//! let summary = recorder.finish().unwrap();
//! assert!(summary.stats.segments_closed > 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod frame;
pub mod machine;
mod planner;
mod queue;
mod recorder;
pub mod segment;
mod value;

pub use config::{Config, MachineConfig, PlannerConfig, QueueConfig, ValueConfig, ValueKind};
pub use error::{CoreError, CoreResult};
pub use frame::{Frame, ObjectId};
pub use machine::{Action, MachineInput, MachineState, SegmentationMachine, Step};
pub use planner::{CompressionPlanner, RATE_A, RATE_B, RATE_C};
pub use queue::{compute_priority, log_priority, record_name, EvictionQueue, PushOutcome};
pub use recorder::{Recorder, RecorderStats, RunSummary};
pub use segment::{SealedSegment, Segment, SegmentRecord, Window};
pub use value::{normalize_scores, FrameSignals, ValueModel, ValueOracle};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

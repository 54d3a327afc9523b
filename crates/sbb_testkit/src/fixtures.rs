//! Test fixtures and recorder helpers.
//!
//! Provides frame builders, small configurations and temporary record
//! stores for end-to-end scenarios.

use sbb_core::{Config, EvictionQueue, Frame, ObjectId, QueueConfig, Recorder, RunSummary, Segment};
use sbb_storage::{DirectoryStore, InMemoryStore};
use std::path::Path;
use tempfile::TempDir;

/// A directory store inside a temporary directory.
pub struct TestDirectory {
    /// The store.
    pub store: DirectoryStore,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: TempDir,
}

impl TestDirectory {
    /// Creates an empty directory store in a fresh temporary directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = DirectoryStore::create_clean(&temp_dir.path().join("sbb_output"))
            .expect("Failed to create directory store");
        Self {
            store,
            temp_dir,
        }
    }

    /// Path of the output directory.
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Hands the store over, keeping the temporary directory alive.
    pub fn split(self) -> (DirectoryStore, TempDir) {
        (self.store, self.temp_dir)
    }
}

impl Default for TestDirectory {
    fn default() -> Self {
        Self::new()
    }
}

/// A frame with the given value and cost and no tracked objects.
pub fn frame(index: u64, value: f64, cost: f64) -> Frame {
    Frame::new(index, value, cost)
}

/// A frame tracking the given objects.
pub fn tracked_frame(index: u64, value: f64, cost: f64, objects: &[ObjectId]) -> Frame {
    Frame::new(index, value, cost).with_objects(objects.iter().copied())
}

/// Frames numbered from 0 with the given values and a common cost.
pub fn frames_with_values(values: &[f64], cost: f64) -> Vec<Frame> {
    values
        .iter()
        .enumerate()
        .map(|(i, &value)| Frame::new(i as u64, value, cost))
        .collect()
}

/// `n` frames numbered from 0, all with the same value and cost.
pub fn uniform_stream(n: u64, value: f64, cost: f64) -> Vec<Frame> {
    (0..n).map(|i| Frame::new(i, value, cost)).collect()
}

/// A segment of consecutive frames with the given values.
pub fn segment_with_values(first_index: u64, values: &[f64]) -> Segment {
    Segment::from_frames(
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| Frame::new(first_index + i as u64, value, 1.0)),
    )
}

/// A small configuration that closes segments after a handful of frames.
///
/// Major cap 6, wait cap 3, precursor 2, both thresholds 0.5, and a budget
/// large enough that nothing is evicted.
pub fn small_config() -> Config {
    Config::new()
        .major_buffer_max(6)
        .wait_buffer_max(3)
        .pre_buffer_min(2)
        .similarity_threshold(0.5)
        .value_threshold(0.5)
        .queue(QueueConfig::default().with_budget_bytes(1e12))
}

/// Runs frames through an in-memory recorder.
///
/// Returns the run summary and the queue with the surviving records.
pub fn record_in_memory(
    config: &Config,
    frames: impl IntoIterator<Item = Frame>,
) -> (RunSummary, EvictionQueue<InMemoryStore>) {
    let mut recorder =
        Recorder::new(config, InMemoryStore::new()).expect("Failed to create recorder");
    for frame in frames {
        recorder.ingest(frame).expect("Failed to ingest frame");
    }
    let summary = recorder.finish().expect("Failed to finish recording");
    (summary, recorder.into_queue())
}

/// Runs frames through a recorder writing into a temporary directory.
pub fn record_to_directory(
    config: &Config,
    frames: impl IntoIterator<Item = Frame>,
) -> (RunSummary, TestDirectory) {
    let (store, temp_dir) = TestDirectory::new().split();
    let mut recorder = Recorder::new(config, store).expect("Failed to create recorder");
    for frame in frames {
        recorder.ingest(frame).expect("Failed to ingest frame");
    }
    let summary = recorder.finish().expect("Failed to finish recording");
    let store = recorder.into_queue().into_store();
    (
        summary,
        TestDirectory {
            store,
            temp_dir,
        },
    )
}

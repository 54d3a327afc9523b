//! Ingested frame records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identifier of a tracked object visible in a frame.
pub type ObjectId = u64;

/// One ingested sample.
///
/// Frames are created once by the frame source and never mutated. A frame
/// moves between segment pools by value; segments that need their own view
/// of the frame's value or cost keep it in separate columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Position in the stream.
    pub index: u64,
    /// Importance score (non-negative).
    pub value: f64,
    /// Storage cost in bytes.
    pub cost: f64,
    /// Auxiliary anomaly score, informational only.
    pub anomaly_score: f64,
    /// Objects tracked in this frame.
    pub objects: BTreeSet<ObjectId>,
}

impl Frame {
    /// Creates a frame with no tracked objects.
    #[must_use]
    pub fn new(index: u64, value: f64, cost: f64) -> Self {
        Self {
            index,
            value,
            cost,
            anomaly_score: 0.0,
            objects: BTreeSet::new(),
        }
    }

    /// Sets the anomaly score.
    #[must_use]
    pub fn with_anomaly_score(mut self, score: f64) -> Self {
        self.anomaly_score = score;
        self
    }

    /// Sets the tracked objects.
    #[must_use]
    pub fn with_objects(mut self, objects: impl IntoIterator<Item = ObjectId>) -> Self {
        self.objects = objects.into_iter().collect();
        self
    }
}

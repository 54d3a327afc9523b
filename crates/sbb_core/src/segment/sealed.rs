//! Finalised segments and their persisted record.

use super::buffer::Segment;
use crate::error::CoreResult;
use serde::{Deserialize, Serialize};

/// A closed segment ready for admission.
///
/// Sealing assigns the segment its position in finalisation order and
/// attaches one compression decision per frame. A sealed segment is never
/// mutated again.
#[derive(Debug, Clone, PartialEq)]
pub struct SealedSegment {
    index: u64,
    segment: Segment,
    decisions: Vec<f64>,
}

impl SealedSegment {
    /// Creates a sealed segment.
    ///
    /// `decisions` holds one entry per frame of `segment`.
    #[must_use]
    pub fn new(index: u64, segment: Segment, decisions: Vec<f64>) -> Self {
        debug_assert_eq!(segment.size(), decisions.len());
        Self {
            index,
            segment,
            decisions,
        }
    }

    /// Position in finalisation order, starting at 0.
    #[must_use]
    pub fn index(&self) -> u64 {
        self.index
    }

    /// The underlying frames and working columns.
    #[must_use]
    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    /// Compression decision per frame.
    #[must_use]
    pub fn decisions(&self) -> &[f64] {
        &self.decisions
    }

    /// Number of frames.
    #[must_use]
    pub fn size(&self) -> usize {
        self.segment.size()
    }

    /// Peak working value.
    #[must_use]
    pub fn max_value(&self) -> f64 {
        self.segment.max_value()
    }

    /// Total working cost.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.segment.total_cost()
    }

    /// Total working value.
    #[must_use]
    pub fn total_value(&self) -> f64 {
        self.segment.total_value()
    }

    /// Builds the persisted representation.
    #[must_use]
    pub fn record(&self) -> SegmentRecord {
        SegmentRecord {
            value: self.segment.values().to_vec(),
            cost: self.segment.costs().to_vec(),
            frame: self.segment.indices().collect(),
            decision: self.decisions.clone(),
        }
    }
}

/// Persisted log of a resident segment.
///
/// One entry per frame in each column, in frame order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    /// Working value after compression.
    pub value: Vec<f64>,
    /// Working cost after compression.
    pub cost: Vec<f64>,
    /// Stream index of each frame.
    pub frame: Vec<u64>,
    /// Compression decision of each frame.
    pub decision: Vec<f64>,
}

impl SegmentRecord {
    /// Encodes the record as JSON.
    pub fn to_json_bytes(&self) -> CoreResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a record from JSON.
    pub fn from_json_slice(bytes: &[u8]) -> CoreResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Number of frames in the record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frame.len()
    }

    /// Returns true if the record holds no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    /// Sum of the cost column.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.cost.iter().sum()
    }

    /// Sum of the value column.
    #[must_use]
    pub fn total_value(&self) -> f64 {
        self.value.iter().sum()
    }
}

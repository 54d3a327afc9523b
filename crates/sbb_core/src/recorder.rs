//! The streaming recorder.
//!
//! [`Recorder`] wires the pieces together for one ordered frame stream:
//!
//! ```text
//! frames ──► precursor ──► SegmentationMachine ──► CompressionPlanner ──► EvictionQueue ──► RecordStore
//!            (first N)      (closes segments)        (seal)                 (admit/evict)
//! ```
//!
//! The first `pre_buffer_min` frames only fill the precursor. The next frame
//! starts the machine, and from then on every frame runs the driving loop:
//! each closed segment is sealed with the next index and pushed to the queue
//! before the machine is reset.

use crate::config::Config;
use crate::error::CoreResult;
use crate::frame::Frame;
use crate::machine::SegmentationMachine;
use crate::planner::CompressionPlanner;
use crate::queue::{EvictionQueue, PushOutcome};
use crate::segment::Segment;
use sbb_storage::RecordStore;
use serde::{Deserialize, Serialize};
use std::mem;
use tracing::{debug, warn};

/// Counters of a recording run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecorderStats {
    /// Frames passed to `ingest`.
    pub frames_ingested: u64,
    /// Non-empty segments closed and sealed.
    pub segments_closed: u64,
    /// Segments that became resident.
    pub segments_admitted: u64,
    /// Segments the queue declined.
    pub segments_rejected: u64,
    /// Residents dropped to restore the budget.
    pub segments_evicted: u64,
    /// Closed segments that held no frames.
    pub empty_segments_skipped: u64,
    /// Total cost of the residents.
    pub resident_cost: f64,
    /// Total value of the residents.
    pub resident_value: f64,
}

impl RecorderStats {
    /// Number of segments currently resident.
    #[must_use]
    pub fn resident_segments(&self) -> u64 {
        self.segments_admitted - self.segments_evicted
    }
}

/// Outcome of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Run counters.
    pub stats: RecorderStats,
    /// Indices of the resident segments, ascending.
    pub residents: Vec<u64>,
    /// Budget in bytes.
    pub budget_bytes: f64,
    /// Whether the queue ran in FIFO mode.
    pub fifo: bool,
}

/// Seals closed segments and offers them to the queue.
struct Retention<S: RecordStore> {
    planner: CompressionPlanner,
    queue: EvictionQueue<S>,
    next_index: u64,
    stats: RecorderStats,
}

impl<S: RecordStore> Retention<S> {
    fn close(&mut self, segment: Segment) -> CoreResult<()> {
        if segment.is_empty() {
            warn!(next_index = self.next_index, "skipping empty segment");
            self.stats.empty_segments_skipped += 1;
            return Ok(());
        }

        let index = self.next_index;
        self.next_index += 1;
        let frames = segment.size();
        let sealed = self.planner.seal(index, segment);
        self.stats.segments_closed += 1;
        debug!(segment = index, frames, "segment sealed");

        match self.queue.push(sealed)? {
            PushOutcome::Admitted { evicted } => {
                self.stats.segments_admitted += 1;
                self.stats.segments_evicted += evicted.len() as u64;
            }
            PushOutcome::Rejected => self.stats.segments_rejected += 1,
        }
        self.stats.resident_cost = self.queue.total_cost();
        self.stats.resident_value = self.queue.total_value();
        Ok(())
    }
}

/// Drives one frame stream through segmentation, planning and retention.
pub struct Recorder<S: RecordStore> {
    pre_buffer_min: usize,
    machine: SegmentationMachine,
    precursor: Segment,
    retention: Retention<S>,
}

impl<S: RecordStore> Recorder<S> {
    /// Creates a recorder persisting resident records into `store`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration does not validate.
    pub fn new(config: &Config, store: S) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            pre_buffer_min: config.machine.pre_buffer_min,
            machine: SegmentationMachine::new(config.machine.clone()),
            precursor: Segment::new(),
            retention: Retention {
                planner: CompressionPlanner::from_config(&config.planner),
                queue: EvictionQueue::new(&config.queue, store),
                next_index: 0,
                stats: RecorderStats::default(),
            },
        })
    }

    /// Feeds the next frame of the stream.
    ///
    /// # Errors
    ///
    /// Returns the first machine invariant violation or storage failure.
    /// The recorder must not be used after an error.
    pub fn ingest(&mut self, frame: Frame) -> CoreResult<()> {
        self.retention.stats.frames_ingested += 1;

        if !self.machine.is_started() {
            if self.precursor.size() < self.pre_buffer_min {
                self.precursor.append(frame);
                return Ok(());
            }
            debug!(frame = frame.index, "starting segmentation");
            self.machine.start(mem::take(&mut self.precursor))?;
        }

        let retention = &mut self.retention;
        self.machine
            .advance(frame, |segment| retention.close(segment))
    }

    /// Ends the stream and pushes whatever the machine still holds.
    ///
    /// Frames that only reached the precursor of a machine that never
    /// started are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the last segment cannot be persisted.
    pub fn finish(&mut self) -> CoreResult<RunSummary> {
        if let Some(last) = self.machine.finish() {
            self.retention.close(last)?;
        } else if !self.machine.is_started() && !self.precursor.is_empty() {
            warn!(
                frames = self.precursor.size(),
                "stream ended before segmentation started"
            );
        }
        Ok(self.summary())
    }

    /// Summary of the run so far.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let queue = &self.retention.queue;
        RunSummary {
            stats: self.retention.stats.clone(),
            residents: queue.resident_indices(),
            budget_bytes: queue.budget(),
            fifo: queue.is_fifo(),
        }
    }

    /// Run counters.
    #[must_use]
    pub fn stats(&self) -> &RecorderStats {
        &self.retention.stats
    }

    /// The segmentation machine.
    #[must_use]
    pub fn machine(&self) -> &SegmentationMachine {
        &self.machine
    }

    /// Frames collected before the machine started.
    #[must_use]
    pub fn precursor(&self) -> &Segment {
        &self.precursor
    }

    /// The eviction queue.
    #[must_use]
    pub fn queue(&self) -> &EvictionQueue<S> {
        &self.retention.queue
    }

    /// Mutable access to the eviction queue, e.g. for
    /// [`EvictionQueue::release_all`].
    pub fn queue_mut(&mut self) -> &mut EvictionQueue<S> {
        &mut self.retention.queue
    }

    /// Consumes the recorder and returns its queue.
    pub fn into_queue(self) -> EvictionQueue<S> {
        self.retention.queue
    }
}

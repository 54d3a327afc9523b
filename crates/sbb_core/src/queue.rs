//! Budget-bounded retention of sealed segments.
//!
//! The [`EvictionQueue`] admits sealed segments, persists a record for each
//! one through a [`RecordStore`], and evicts residents until the total cost
//! is back under the budget.
//!
//! ## Modes
//!
//! - **Priority**: residents are ordered by [`compute_priority`]; the lowest
//!   priority goes first. A newcomer that would not fit and ranks below
//!   every resident is rejected instead of displacing anything.
//! - **FIFO**: every segment is admitted; the oldest resident goes first.
//!
//! ## Invariants
//!
//! - After `push` returns, the resident cost is below the budget
//! - A resident has exactly one live record; eviction removes it
//! - Residents are the admitted segments that have not been evicted

use crate::config::QueueConfig;
use crate::error::CoreResult;
use crate::segment::SealedSegment;
use sbb_storage::{RecordHandle, RecordStore};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::{debug, info};

/// Recency-weighted priority of a segment.
///
/// `inflation ^ index × max_value`: with `inflation > 1` a later segment
/// outranks an earlier one of equal peak value. A segment with no value has
/// priority 0 at any index. For long streams the product saturates to
/// infinity; the queue orders residents by [`log_priority`] instead.
#[must_use]
pub fn compute_priority(inflation: f64, index: u64, max_value: f64) -> f64 {
    if max_value <= 0.0 {
        return 0.0;
    }
    inflation.powf(index as f64) * max_value
}

/// Natural logarithm of [`compute_priority`], finite for any index.
///
/// `index × ln(inflation) + ln(max_value)`, or negative infinity for a
/// segment with no value. Orders segments exactly like the priority itself.
#[must_use]
pub fn log_priority(inflation: f64, index: u64, max_value: f64) -> f64 {
    if max_value <= 0.0 {
        return f64::NEG_INFINITY;
    }
    index as f64 * inflation.ln() + max_value.ln()
}

/// Name of the persisted record of segment `index`.
#[must_use]
pub fn record_name(fifo: bool, index: u64) -> String {
    let mode = if fifo { "fifo" } else { "priority" };
    format!("{mode}_segment{index}_log.json")
}

/// Result of [`EvictionQueue::push`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The segment became resident. `evicted` lists the indices of the
    /// segments dropped to restore the budget, in eviction order; it may
    /// include the admitted segment itself.
    Admitted {
        /// Indices of evicted segments.
        evicted: Vec<u64>,
    },
    /// The segment was not retained.
    Rejected,
}

impl PushOutcome {
    /// Returns true if the segment was admitted.
    #[must_use]
    pub fn is_admitted(&self) -> bool {
        matches!(self, PushOutcome::Admitted { .. })
    }

    /// Indices evicted by this push.
    #[must_use]
    pub fn evicted(&self) -> &[u64] {
        match self {
            PushOutcome::Admitted { evicted } => evicted,
            PushOutcome::Rejected => &[],
        }
    }
}

/// A resident segment and its record.
///
/// `rank` is the log priority in priority mode and 0 in FIFO mode.
#[derive(Debug)]
struct Resident {
    rank: f64,
    priority: f64,
    segment: SealedSegment,
    handle: RecordHandle,
}

impl Resident {
    fn index(&self) -> u64 {
        self.segment.index()
    }
}

impl PartialEq for Resident {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Resident {}

impl PartialOrd for Resident {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Resident {
    // BinaryHeap is a max-heap: the lowest rank, then the oldest index,
    // must compare greatest so it is popped first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .rank
            .total_cmp(&self.rank)
            .then_with(|| other.index().cmp(&self.index()))
    }
}

/// Budget-bounded set of resident segments.
pub struct EvictionQueue<S: RecordStore> {
    store: S,
    budget: f64,
    inflation: f64,
    fifo: bool,
    residents: BinaryHeap<Resident>,
    total_cost: f64,
    total_value: f64,
}

impl<S: RecordStore> EvictionQueue<S> {
    /// Creates an empty queue persisting records into `store`.
    pub fn new(config: &QueueConfig, store: S) -> Self {
        Self {
            store,
            budget: config.budget_bytes(),
            inflation: config.inflation_factor,
            fifo: config.fifo,
            residents: BinaryHeap::new(),
            total_cost: 0.0,
            total_value: 0.0,
        }
    }

    /// Budget in bytes.
    #[must_use]
    pub fn budget(&self) -> f64 {
        self.budget
    }

    /// Returns true in FIFO mode.
    #[must_use]
    pub fn is_fifo(&self) -> bool {
        self.fifo
    }

    /// Number of resident segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.residents.len()
    }

    /// Returns true if nothing is resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.residents.is_empty()
    }

    /// Total cost of the residents.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Total value of the residents.
    #[must_use]
    pub fn total_value(&self) -> f64 {
        self.total_value
    }

    /// Priority of the resident that would be evicted next.
    #[must_use]
    pub fn min_priority(&self) -> Option<f64> {
        self.residents.peek().map(|r| r.priority)
    }

    /// Resident segments in finalisation order.
    #[must_use]
    pub fn residents(&self) -> Vec<&SealedSegment> {
        let mut residents: Vec<&SealedSegment> =
            self.residents.iter().map(|r| &r.segment).collect();
        residents.sort_by_key(|s| s.index());
        residents
    }

    /// Indices of the resident segments, ascending.
    #[must_use]
    pub fn resident_indices(&self) -> Vec<u64> {
        self.residents().iter().map(|s| s.index()).collect()
    }

    /// The record store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the queue and returns the record store with every resident
    /// record still in place.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Offers a sealed segment.
    ///
    /// On admission the segment's record is written, the totals grow, and
    /// residents are evicted lowest-first while the total cost is at or above
    /// the budget. Rejection is a normal outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded, written or removed.
    pub fn push(&mut self, segment: SealedSegment) -> CoreResult<PushOutcome> {
        let index = segment.index();
        let cost = segment.total_cost();
        let value = segment.total_value();
        let max_value = segment.max_value();
        let priority = compute_priority(self.inflation, index, max_value);
        let rank = log_priority(self.inflation, index, max_value);

        if !self.fifo && self.rejects(cost, rank) {
            debug!(segment = index, cost, priority, "segment rejected");
            return Ok(PushOutcome::Rejected);
        }

        let bytes = segment.record().to_json_bytes()?;
        let handle = self.store.put(&record_name(self.fifo, index), &bytes)?;

        self.total_cost += cost;
        self.total_value += value;
        self.residents.push(Resident {
            rank: if self.fifo { 0.0 } else { rank },
            priority,
            segment,
            handle,
        });
        info!(
            segment = index,
            cost,
            value,
            priority,
            resident_cost = self.total_cost,
            "segment admitted"
        );

        let mut evicted = Vec::new();
        while self.total_cost >= self.budget {
            let Some(victim) = self.residents.pop() else {
                break;
            };
            evicted.push(self.evict(victim)?);
        }

        Ok(PushOutcome::Admitted { evicted })
    }

    fn rejects(&self, cost: f64, rank: f64) -> bool {
        match self.residents.peek() {
            None => cost > self.budget,
            Some(min) => rank < min.rank && cost + self.total_cost > self.budget,
        }
    }

    fn evict(&mut self, victim: Resident) -> CoreResult<u64> {
        if let Err(e) = self.store.remove(&victim.handle) {
            self.residents.push(victim);
            return Err(e.into());
        }
        let index = victim.index();
        let cost = victim.segment.total_cost();
        let value = victim.segment.total_value();
        self.total_cost -= cost;
        self.total_value -= value;
        if self.residents.is_empty() {
            self.total_cost = 0.0;
            self.total_value = 0.0;
        }
        info!(
            segment = index,
            cost,
            value,
            priority = victim.priority,
            resident_cost = self.total_cost,
            "segment evicted"
        );
        Ok(index)
    }

    /// Removes every resident and its record.
    ///
    /// Returns the number of records removed.
    ///
    /// # Errors
    ///
    /// Stops at the first record that cannot be removed; that segment stays
    /// resident.
    pub fn release_all(&mut self) -> CoreResult<usize> {
        let mut released = 0;
        while let Some(resident) = self.residents.pop() {
            if let Err(e) = self.store.remove(&resident.handle) {
                self.residents.push(resident);
                return Err(e.into());
            }
            self.total_cost -= resident.segment.total_cost();
            self.total_value -= resident.segment.total_value();
            released += 1;
        }
        self.total_cost = 0.0;
        self.total_value = 0.0;
        debug!(released, "released all residents");
        Ok(released)
    }
}

impl<S: RecordStore + std::fmt::Debug> std::fmt::Debug for EvictionQueue<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvictionQueue")
            .field("budget", &self.budget)
            .field("fifo", &self.fifo)
            .field("residents", &self.residents.len())
            .field("total_cost", &self.total_cost)
            .field("store", &self.store)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::segment::{Segment, SegmentRecord};
    use crate::error::CoreError;
    use proptest::prelude::*;
    use sbb_storage::{InMemoryStore, StorageError, StorageResult};
    use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
    use std::sync::Arc;

    /// A one-frame sealed segment with the given cost and value.
    fn sealed(index: u64, cost: f64, value: f64) -> SealedSegment {
        let segment = Segment::from_frames([Frame::new(index, value, cost)]);
        SealedSegment::new(index, segment, vec![1.0])
    }

    fn queue(budget: f64, inflation: f64, fifo: bool) -> EvictionQueue<InMemoryStore> {
        let config = QueueConfig::default()
            .with_budget_bytes(budget)
            .with_inflation_factor(inflation)
            .with_fifo(fifo);
        EvictionQueue::new(&config, InMemoryStore::new())
    }

    #[test]
    fn priority_is_recency_weighted() {
        assert_eq!(compute_priority(2.0, 0, 0.5), 0.5);
        assert_eq!(compute_priority(2.0, 3, 0.5), 4.0);
        assert_eq!(compute_priority(1.0, 1000, 0.5), 0.5);
        assert_eq!(
            compute_priority(2.0, 8, 0.7),
            2.0 * compute_priority(2.0, 7, 0.7)
        );
    }

    #[test]
    fn record_names() {
        assert_eq!(record_name(true, 3), "fifo_segment3_log.json");
        assert_eq!(record_name(false, 0), "priority_segment0_log.json");
    }

    #[test]
    fn admission_writes_record() {
        let mut q = queue(100.0, 1.0, false);
        let outcome = q.push(sealed(0, 10.0, 0.5)).unwrap();

        assert_eq!(outcome, PushOutcome::Admitted { evicted: vec![] });
        assert_eq!(q.len(), 1);
        assert_eq!(q.total_cost(), 10.0);
        assert_eq!(q.total_value(), 0.5);

        let names = q.store().names();
        assert_eq!(names, vec!["priority_segment0_log.json".to_string()]);
    }

    #[test]
    fn record_payload_decodes() {
        let mut q = queue(100.0, 1.0, true);
        q.push(sealed(4, 10.0, 0.5)).unwrap();

        let store = q.into_store();
        let handle = store.handle("fifo_segment4_log.json").unwrap();
        let record = SegmentRecord::from_json_slice(&store.get(&handle).unwrap()).unwrap();
        assert_eq!(record.frame, vec![4]);
        assert_eq!(record.cost, vec![10.0]);
    }

    #[test]
    fn priority_mode_rejects_oversized_first_segment() {
        let mut q = queue(1.0, 1.0, false);
        let outcome = q.push(sealed(0, 2.0, 1.0)).unwrap();

        assert_eq!(outcome, PushOutcome::Rejected);
        assert!(q.is_empty());
        assert!(q.store().is_empty());
    }

    #[test]
    fn fifo_mode_admits_oversized_first_segment_then_evicts_it() {
        let mut q = queue(1.0, 1.0, true);
        let outcome = q.push(sealed(0, 2.0, 1.0)).unwrap();

        assert_eq!(outcome, PushOutcome::Admitted { evicted: vec![0] });
        assert!(q.is_empty());
        assert!(q.store().is_empty());
        assert_eq!(q.total_cost(), 0.0);
    }

    #[test]
    fn reaching_budget_exactly_evicts() {
        let mut q = queue(10.0, 1.0, false);
        q.push(sealed(0, 4.0, 0.1)).unwrap();
        let outcome = q.push(sealed(1, 6.0, 0.9)).unwrap();

        assert_eq!(outcome.evicted(), &[0]);
        assert_eq!(q.resident_indices(), vec![1]);
        assert_eq!(q.total_cost(), 6.0);
    }

    #[test]
    fn priority_mode_evicts_lowest_priority() {
        let mut q = queue(10.0, 1.0, false);
        q.push(sealed(0, 3.0, 0.9)).unwrap();
        q.push(sealed(1, 3.0, 0.2)).unwrap();
        q.push(sealed(2, 3.0, 0.5)).unwrap();
        assert_eq!(q.min_priority(), Some(0.2));

        let outcome = q.push(sealed(3, 3.0, 0.7)).unwrap();

        assert_eq!(outcome.evicted(), &[1]);
        assert_eq!(q.resident_indices(), vec![0, 2, 3]);
        assert!(!q.store().names().contains(&"priority_segment1_log.json".to_string()));
    }

    #[test]
    fn priority_mode_rejects_low_priority_that_does_not_fit() {
        let mut q = queue(10.0, 1.0, false);
        q.push(sealed(0, 4.0, 0.9)).unwrap();
        q.push(sealed(1, 4.0, 0.8)).unwrap();

        let outcome = q.push(sealed(2, 4.0, 0.1)).unwrap();

        assert_eq!(outcome, PushOutcome::Rejected);
        assert_eq!(q.resident_indices(), vec![0, 1]);
        assert_eq!(q.total_cost(), 8.0);
    }

    #[test]
    fn priority_mode_admits_low_priority_that_fits() {
        let mut q = queue(10.0, 1.0, false);
        q.push(sealed(0, 4.0, 0.9)).unwrap();

        let outcome = q.push(sealed(1, 4.0, 0.1)).unwrap();

        assert_eq!(outcome, PushOutcome::Admitted { evicted: vec![] });
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn equal_priorities_evict_oldest_first() {
        let mut q = queue(10.0, 1.0, false);
        q.push(sealed(0, 3.0, 0.5)).unwrap();
        q.push(sealed(1, 3.0, 0.5)).unwrap();
        q.push(sealed(2, 3.0, 0.5)).unwrap();

        let outcome = q.push(sealed(3, 3.0, 0.5)).unwrap();

        assert_eq!(outcome.evicted(), &[0]);
    }

    #[test]
    fn inflation_favours_later_segments() {
        let mut q = queue(10.0, 2.0, false);
        q.push(sealed(0, 4.0, 0.5)).unwrap();
        q.push(sealed(1, 4.0, 0.3)).unwrap();

        // Priorities: 0.5, 0.6, 1.2. Segment 0 is now the lowest.
        let outcome = q.push(sealed(2, 4.0, 0.3)).unwrap();

        assert_eq!(outcome.evicted(), &[0]);
        assert_eq!(q.resident_indices(), vec![1, 2]);
    }

    #[test]
    fn fifo_mode_evicts_oldest_regardless_of_value() {
        let mut q = queue(10.0, 1.0, true);
        q.push(sealed(0, 4.0, 0.9)).unwrap();
        q.push(sealed(1, 4.0, 0.1)).unwrap();

        let outcome = q.push(sealed(2, 4.0, 0.0)).unwrap();

        assert_eq!(outcome.evicted(), &[0]);
        assert_eq!(q.resident_indices(), vec![1, 2]);
    }

    #[test]
    fn eviction_subtracts_segment_value() {
        let mut q = queue(10.0, 1.0, true);
        q.push(sealed(0, 6.0, 0.25)).unwrap();
        q.push(sealed(1, 6.0, 0.5)).unwrap();

        assert_eq!(q.total_value(), 0.5);
        assert_eq!(q.total_cost(), 6.0);
    }

    #[test]
    fn release_all_removes_every_record() {
        let mut q = queue(100.0, 1.0, false);
        for i in 0..3 {
            q.push(sealed(i, 10.0, 0.5)).unwrap();
        }

        assert_eq!(q.release_all().unwrap(), 3);
        assert!(q.is_empty());
        assert!(q.store().is_empty());
        assert_eq!(q.total_cost(), 0.0);
    }

    /// Store whose removals fail while `failing` is set.
    struct FailingRemoveStore {
        inner: InMemoryStore,
        failing: Arc<AtomicBool>,
    }

    impl RecordStore for FailingRemoveStore {
        fn put(&mut self, name: &str, data: &[u8]) -> StorageResult<RecordHandle> {
            self.inner.put(name, data)
        }

        fn get(&self, handle: &RecordHandle) -> StorageResult<Vec<u8>> {
            self.inner.get(handle)
        }

        fn remove(&mut self, handle: &RecordHandle) -> StorageResult<()> {
            if self.failing.load(AtomicOrdering::SeqCst) {
                return Err(StorageError::Io(std::io::Error::other("remove failed")));
            }
            self.inner.remove(handle)
        }

        fn contains(&self, handle: &RecordHandle) -> bool {
            self.inner.contains(handle)
        }

        fn len(&self) -> usize {
            self.inner.len()
        }
    }

    fn failing_queue(budget: f64) -> (EvictionQueue<FailingRemoveStore>, Arc<AtomicBool>) {
        let failing = Arc::new(AtomicBool::new(false));
        let store = FailingRemoveStore {
            inner: InMemoryStore::new(),
            failing: Arc::clone(&failing),
        };
        let config = QueueConfig::default().with_budget_bytes(budget);
        (EvictionQueue::new(&config, store), failing)
    }

    fn assert_totals_match_residents<S: RecordStore>(q: &EvictionQueue<S>) {
        let cost: f64 = q.residents().iter().map(|s| s.total_cost()).sum();
        let value: f64 = q.residents().iter().map(|s| s.total_value()).sum();
        assert!((q.total_cost() - cost).abs() < 1e-9);
        assert!((q.total_value() - value).abs() < 1e-9);
        assert_eq!(q.store().len(), q.len());
    }

    #[test]
    fn log_priority_orders_like_priority() {
        assert_eq!(compute_priority(2.0, 1100, 0.0), 0.0);
        assert_eq!(log_priority(2.0, 1100, 0.0), f64::NEG_INFINITY);
        assert!((log_priority(2.0, 3, 0.5) - 4.0f64.ln()).abs() < 1e-12);

        let earlier = log_priority(2.0, 1100, 0.9);
        let later = log_priority(2.0, 1101, 0.9);
        assert!(earlier.is_finite() && later.is_finite());
        assert!((later - earlier - 2.0f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn long_streams_keep_recency_order() {
        let mut q = queue(10.0, 2.0, false);
        q.push(sealed(1100, 4.0, 0.9)).unwrap();
        q.push(sealed(1101, 4.0, 0.9)).unwrap();

        // Worthless and does not fit: rejected at any index.
        assert_eq!(q.push(sealed(1102, 4.0, 0.0)).unwrap(), PushOutcome::Rejected);
        assert_eq!(q.resident_indices(), vec![1100, 1101]);

        let outcome = q.push(sealed(1103, 4.0, 0.9)).unwrap();
        assert_eq!(outcome.evicted(), &[1100]);
        assert_eq!(q.resident_indices(), vec![1101, 1103]);
    }

    #[test]
    fn failed_eviction_keeps_victim_resident() {
        let (mut q, failing) = failing_queue(10.0);
        q.push(sealed(0, 6.0, 0.1)).unwrap();

        failing.store(true, AtomicOrdering::SeqCst);
        assert!(matches!(
            q.push(sealed(1, 6.0, 0.9)),
            Err(CoreError::Storage(_))
        ));
        assert_eq!(q.resident_indices(), vec![0, 1]);
        assert_totals_match_residents(&q);

        failing.store(false, AtomicOrdering::SeqCst);
        let outcome = q.push(sealed(2, 1.0, 0.8)).unwrap();
        assert_eq!(outcome.evicted(), &[0]);
        assert_totals_match_residents(&q);
    }

    #[test]
    fn failed_release_keeps_totals_consistent() {
        let (mut q, failing) = failing_queue(100.0);
        q.push(sealed(0, 10.0, 0.5)).unwrap();
        q.push(sealed(1, 20.0, 0.25)).unwrap();

        failing.store(true, AtomicOrdering::SeqCst);
        assert!(q.release_all().is_err());
        assert_eq!(q.len(), 2);
        assert_totals_match_residents(&q);

        failing.store(false, AtomicOrdering::SeqCst);
        assert_eq!(q.release_all().unwrap(), 2);
        assert!(q.store().is_empty());
        assert_eq!(q.total_cost(), 0.0);
    }

    proptest! {
        #[test]
        fn resident_cost_stays_below_budget(
            pushes in proptest::collection::vec((0.0f64..50.0, 0.0f64..1.0), 1..40),
            budget in 1.0f64..200.0,
            inflation in 1.0f64..1.5,
            fifo in any::<bool>(),
        ) {
            let mut q = queue(budget, inflation, fifo);
            let mut seen = std::collections::BTreeSet::new();
            for (i, (cost, value)) in pushes.into_iter().enumerate() {
                let outcome = q.push(sealed(i as u64, cost, value)).unwrap();
                if fifo {
                    prop_assert!(outcome.is_admitted());
                }
                prop_assert!(q.is_empty() || q.total_cost() < budget);
                prop_assert_eq!(q.store().len(), q.len());
                let residents: f64 = q.residents().iter().map(|s| s.total_cost()).sum();
                prop_assert!((residents - q.total_cost()).abs() < 1e-6);
                for evicted in outcome.evicted() {
                    prop_assert!(seen.insert(*evicted), "segment evicted twice");
                }
            }
        }
    }
}

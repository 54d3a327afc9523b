//! The segment container.

use super::objects::ObjectSet;
use super::window::Window;
use crate::frame::{Frame, ObjectId};
use std::collections::BTreeSet;

/// An ordered run of frames.
///
/// Besides the frames themselves a segment keeps a working `value` and
/// `cost` column per frame. Both start as the frame's own value and cost
/// and are rewritten by smoothing and compression planning, while the
/// frames stay untouched.
///
/// # Invariants
///
/// - `frames`, `values` and `costs` always have equal length
/// - Order is temporal
/// - `objects` is exactly the union of the member frames' object sets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segment {
    frames: Vec<Frame>,
    values: Vec<f64>,
    costs: Vec<f64>,
    objects: ObjectSet,
}

impl Segment {
    /// Creates an empty segment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a segment holding the given frames in order.
    #[must_use]
    pub fn from_frames(frames: impl IntoIterator<Item = Frame>) -> Self {
        let mut segment = Self::new();
        for frame in frames {
            segment.append(frame);
        }
        segment
    }

    /// Number of frames.
    #[must_use]
    pub fn size(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if the segment holds no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The member frames.
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// The working value column.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// The working cost column.
    #[must_use]
    pub fn costs(&self) -> &[f64] {
        &self.costs
    }

    /// Stream indices of the member frames.
    pub fn indices(&self) -> impl Iterator<Item = u64> + '_ {
        self.frames.iter().map(|f| f.index)
    }

    /// Union of the member frames' objects.
    #[must_use]
    pub fn objects(&self) -> &ObjectSet {
        &self.objects
    }

    /// Appends a single frame.
    pub fn append(&mut self, frame: Frame) {
        self.objects.add_frame(&frame.objects);
        self.values.push(frame.value);
        self.costs.push(frame.cost);
        self.frames.push(frame);
    }

    /// Appends a windowed slice of `other`.
    ///
    /// The appended frames keep `other`'s working columns. An empty window
    /// leaves `self` unchanged.
    pub fn extend(&mut self, other: &Segment, window: Window) {
        let range = window.resolve(other.size());
        for frame in &other.frames[range.clone()] {
            self.objects.add_frame(&frame.objects);
        }
        self.frames.extend_from_slice(&other.frames[range.clone()]);
        self.values.extend_from_slice(&other.values[range.clone()]);
        self.costs.extend_from_slice(&other.costs[range]);
    }

    /// Moves every frame of `other` onto the end of `self`.
    pub fn merge(&mut self, other: Segment) {
        for frame in &other.frames {
            self.objects.add_frame(&frame.objects);
        }
        self.frames.extend(other.frames);
        self.values.extend(other.values);
        self.costs.extend(other.costs);
    }

    /// Replaces the contents of `self` with a windowed slice of `other`.
    ///
    /// An empty window leaves `self` empty.
    pub fn copy(&mut self, other: &Segment, window: Window) {
        self.clear();
        self.extend(other, window);
    }

    /// Truncates `self` in place to a window of itself.
    pub fn split(&mut self, window: Window) {
        let range = window.resolve(self.size());

        for frame in self.frames.drain(range.end..) {
            self.objects.remove_frame(&frame.objects);
        }
        for frame in self.frames.drain(..range.start) {
            self.objects.remove_frame(&frame.objects);
        }
        self.values.truncate(range.end);
        self.values.drain(..range.start);
        self.costs.truncate(range.end);
        self.costs.drain(..range.start);
    }

    /// Removes every frame.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.values.clear();
        self.costs.clear();
        self.objects.clear();
    }

    /// Share of `candidate` objects already present in this segment.
    ///
    /// Returns `|objects ∩ candidate| / |candidate|`, or 0 for an empty
    /// candidate set.
    #[must_use]
    pub fn similarity(&self, candidate: &BTreeSet<ObjectId>) -> f64 {
        if candidate.is_empty() {
            return 0.0;
        }
        self.objects.overlap(candidate) as f64 / candidate.len() as f64
    }

    /// Spreads every rising or falling value edge as a one-sided Gaussian bump.
    ///
    /// A rise of height `a` at index `mu` lifts `values[j]` for `j` in
    /// `[mu - 3·sigma, mu)` to at least `a·exp(-(j-mu)²/(2·sigma²))`; a fall
    /// spreads forward over `[mu, mu + 3·sigma)`. Edges are detected on the
    /// unsmoothed values and no value ever decreases.
    pub fn smooth_values(&mut self, sigma: usize) {
        let n = self.values.len();
        let reach = sigma.saturating_mul(3);
        let original = &self.values;
        let mut smoothed = original.clone();

        for mu in 1..n {
            let (prev, cur) = (original[mu - 1], original[mu]);
            let (span, height) = if cur > prev {
                (mu.saturating_sub(reach)..mu, cur - prev)
            } else if cur < prev {
                (mu..mu.saturating_add(reach).min(n), prev - cur)
            } else {
                continue;
            };

            for j in span {
                let bump = gaussian(j, height, mu, sigma);
                if bump > smoothed[j] {
                    smoothed[j] = bump;
                }
            }
        }

        self.values = smoothed;
    }

    /// Rewrites the working columns frame by frame.
    pub fn map_columns(&mut self, mut f: impl FnMut(&Frame, &mut f64, &mut f64)) {
        for ((frame, value), cost) in self
            .frames
            .iter()
            .zip(self.values.iter_mut())
            .zip(self.costs.iter_mut())
        {
            f(frame, value, cost);
        }
    }

    /// Largest working value, 0 for an empty segment.
    #[must_use]
    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Sum of the working costs.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.costs.iter().sum()
    }

    /// Sum of the working values.
    #[must_use]
    pub fn total_value(&self) -> f64 {
        self.values.iter().sum()
    }
}

fn gaussian(x: usize, height: f64, mu: usize, sigma: usize) -> f64 {
    let d = x as f64 - mu as f64;
    let s = sigma as f64;
    height * (-(d * d) / (2.0 * s * s)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn frame(index: u64, value: f64, objects: &[ObjectId]) -> Frame {
        Frame::new(index, value, 100.0 + index as f64).with_objects(objects.iter().copied())
    }

    fn numbered(n: u64) -> Segment {
        Segment::from_frames((0..n).map(|i| frame(i, i as f64, &[i])))
    }

    fn indices(segment: &Segment) -> Vec<u64> {
        segment.indices().collect()
    }

    fn objects(segment: &Segment) -> Vec<ObjectId> {
        segment.objects().iter().collect()
    }

    #[test]
    fn append_tracks_columns_and_objects() {
        let mut segment = Segment::new();
        segment.append(frame(0, 0.5, &[1, 2]));
        segment.append(frame(1, 0.25, &[2, 3]));

        assert_eq!(segment.size(), 2);
        assert_eq!(segment.values(), &[0.5, 0.25]);
        assert_eq!(segment.costs(), &[100.0, 101.0]);
        assert_eq!(objects(&segment), vec![1, 2, 3]);
    }

    #[test]
    fn extend_full_window_appends_everything() {
        let source = numbered(4);
        let mut target = Segment::new();
        target.extend(&source, Window::new(Some(0), Some(4)));
        assert_eq!(target, source);
    }

    #[test]
    fn extend_with_negative_until_drops_tail() {
        let source = numbered(5);
        let mut target = Segment::from_frames([frame(10, 1.0, &[10])]);

        target.extend(&source, Window::all_but_last(2));

        assert_eq!(indices(&target), vec![10, 0, 1, 2]);
        assert_eq!(objects(&target), vec![0, 1, 2, 10]);
    }

    #[test]
    fn extend_empty_window_is_noop() {
        let source = numbered(3);
        let mut target = numbered(2);
        let before = target.clone();

        target.extend(&source, Window::EMPTY);
        target.extend(&Segment::new(), Window::ALL);

        assert_eq!(target, before);
    }

    #[test]
    fn copy_last_k() {
        let source = numbered(6);
        let mut target = numbered(2);

        target.copy(&source, Window::last(3));

        assert_eq!(indices(&target), vec![3, 4, 5]);
        assert_eq!(objects(&target), vec![3, 4, 5]);
        assert_eq!(target.values(), &[3.0, 4.0, 5.0]);
    }

    #[test]
    fn copy_empty_window_empties_target() {
        let source = numbered(3);
        let mut target = numbered(2);

        target.copy(&source, Window::new(Some(2), Some(1)));

        assert!(target.is_empty());
        assert!(target.objects().is_empty());
    }

    #[test]
    fn copy_is_independent_of_source() {
        let mut source = numbered(3);
        let mut target = Segment::new();
        target.copy(&source, Window::ALL);

        source.clear();

        assert_eq!(target.size(), 3);
    }

    #[test]
    fn split_shrinks_objects() {
        let mut segment = Segment::from_frames([
            frame(0, 0.0, &[1, 2]),
            frame(1, 0.0, &[2]),
            frame(2, 0.0, &[3]),
        ]);

        segment.split(Window::all_but_last(1));
        assert_eq!(indices(&segment), vec![0, 1]);
        assert_eq!(objects(&segment), vec![1, 2]);

        segment.split(Window::starting_at(1));
        assert_eq!(indices(&segment), vec![1]);
        assert_eq!(objects(&segment), vec![2]);
    }

    #[test]
    fn split_keeps_columns_aligned() {
        let mut segment = numbered(6);
        segment.split(Window::new(Some(1), Some(-2)));

        assert_eq!(indices(&segment), vec![1, 2, 3]);
        assert_eq!(segment.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(segment.costs(), &[101.0, 102.0, 103.0]);
    }

    #[test]
    fn split_full_window_is_noop_and_empty_window_clears() {
        let mut segment = numbered(4);
        let before = segment.clone();
        segment.split(Window::new(Some(0), Some(4)));
        assert_eq!(segment, before);

        segment.split(Window::EMPTY);
        assert!(segment.is_empty());
        assert!(segment.objects().is_empty());
    }

    #[test]
    fn merge_moves_everything() {
        let mut a = numbered(2);
        let b = Segment::from_frames([frame(7, 0.5, &[9])]);

        a.merge(b);

        assert_eq!(indices(&a), vec![0, 1, 7]);
        assert_eq!(objects(&a), vec![0, 1, 9]);
    }

    #[test]
    fn similarity_of_empty_candidate_is_zero() {
        let segment = numbered(3);
        assert_eq!(segment.similarity(&BTreeSet::new()), 0.0);
    }

    #[test]
    fn similarity_is_overlap_recall() {
        let segment = Segment::from_frames([frame(0, 0.0, &[1, 2, 3])]);
        let candidate: BTreeSet<ObjectId> = [2, 3, 4, 5].into_iter().collect();
        assert_eq!(segment.similarity(&candidate), 0.5);
    }

    #[test]
    fn aggregates() {
        let segment = Segment::from_frames([
            Frame::new(0, 0.2, 10.0),
            Frame::new(1, 0.7, 20.0),
            Frame::new(2, 0.1, 30.0),
        ]);

        assert_eq!(segment.max_value(), 0.7);
        assert_eq!(segment.total_cost(), 60.0);
        assert!((segment.total_value() - 1.0).abs() < 1e-12);
        assert_eq!(Segment::new().max_value(), 0.0);
    }

    #[test]
    fn smoothing_spreads_rising_edge_backwards() {
        let mut segment = Segment::from_frames(
            [0.0, 0.0, 0.0, 0.0, 1.0]
                .iter()
                .enumerate()
                .map(|(i, v)| Frame::new(i as u64, *v, 1.0)),
        );

        segment.smooth_values(1);

        let v = segment.values();
        // Only [mu - 3, mu) is touched.
        assert_eq!(v[0], 0.0);
        assert!((v[1] - (-4.5f64).exp()).abs() < 1e-12);
        assert!((v[2] - (-2.0f64).exp()).abs() < 1e-12);
        assert!((v[3] - (-0.5f64).exp()).abs() < 1e-12);
        assert_eq!(v[4], 1.0);
    }

    #[test]
    fn smoothing_spreads_falling_edge_forwards() {
        let mut segment = Segment::from_frames(
            [1.0, 0.0, 0.0, 0.0, 0.0]
                .iter()
                .enumerate()
                .map(|(i, v)| Frame::new(i as u64, *v, 1.0)),
        );

        segment.smooth_values(1);

        let v = segment.values();
        // The edge itself gets the full jump height.
        assert_eq!(v[1], 1.0);
        assert!((v[2] - (-0.5f64).exp()).abs() < 1e-12);
        assert!((v[3] - (-2.0f64).exp()).abs() < 1e-12);
        assert_eq!(v[4], 0.0);
    }

    #[test]
    fn smoothing_with_zero_sigma_is_identity() {
        let mut segment = numbered(5);
        let before = segment.clone();
        segment.smooth_values(0);
        assert_eq!(segment, before);
    }

    #[test]
    fn smoothing_leaves_frames_untouched() {
        let mut segment = Segment::from_frames([Frame::new(0, 0.0, 1.0), Frame::new(1, 1.0, 1.0)]);
        segment.smooth_values(2);
        assert_eq!(segment.frames()[0].value, 0.0);
        assert!(segment.values()[0] > 0.0);
    }

    proptest! {
        #[test]
        fn smoothing_never_decreases(
            values in proptest::collection::vec(0.0f64..10.0, 0..40),
            sigma in 0usize..6,
        ) {
            let mut segment = Segment::from_frames(
                values.iter().enumerate().map(|(i, v)| Frame::new(i as u64, *v, 1.0)),
            );
            segment.smooth_values(sigma);
            for (after, before) in segment.values().iter().zip(&values) {
                prop_assert!(after >= before);
            }
        }

        #[test]
        fn similarity_grows_with_contained_candidates(
            members in proptest::collection::btree_set(0u64..20, 1..10),
            extra in proptest::collection::btree_set(20u64..40, 0..10),
        ) {
            let segment = Segment::from_frames([Frame::new(0, 0.0, 1.0).with_objects(members.iter().copied())]);
            let mut candidate = extra.clone();
            let mut last = segment.similarity(&candidate);
            for id in &members {
                candidate.insert(*id);
                let next = segment.similarity(&candidate);
                prop_assert!(next >= last);
                last = next;
            }
        }

        #[test]
        fn split_objects_match_rebuilt_union(
            frame_objects in proptest::collection::vec(
                proptest::collection::btree_set(0u64..8, 0..4), 0..20),
            from in proptest::option::of(-25isize..25),
            until in proptest::option::of(-25isize..25),
        ) {
            let mut segment = Segment::from_frames(
                frame_objects.iter().enumerate().map(|(i, o)| {
                    Frame::new(i as u64, 0.0, 1.0).with_objects(o.iter().copied())
                }),
            );
            segment.split(Window::new(from, until));

            let rebuilt = Segment::from_frames(segment.frames().to_vec());
            prop_assert_eq!(segment.objects(), rebuilt.objects());
            prop_assert_eq!(segment.values().len(), segment.size());
            prop_assert_eq!(segment.costs().len(), segment.size());
        }
    }
}

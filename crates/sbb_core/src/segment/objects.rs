//! Object membership of a segment.

use crate::frame::ObjectId;
use std::collections::{BTreeMap, BTreeSet};

/// The union of the object sets of a segment's frames.
///
/// Each object carries the number of member frames it appears in, so the
/// set can shrink correctly when frames leave the segment without a full
/// rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectSet {
    counts: BTreeMap<ObjectId, usize>,
}

impl ObjectSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the objects of a frame joining the segment.
    pub fn add_frame(&mut self, objects: &BTreeSet<ObjectId>) {
        for &id in objects {
            *self.counts.entry(id).or_insert(0) += 1;
        }
    }

    /// Removes the objects of a frame leaving the segment.
    pub fn remove_frame(&mut self, objects: &BTreeSet<ObjectId>) {
        for id in objects {
            if let Some(count) = self.counts.get_mut(id) {
                *count -= 1;
                if *count == 0 {
                    self.counts.remove(id);
                }
            }
        }
    }

    /// Returns true if any member frame contains the object.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.counts.contains_key(&id)
    }

    /// Number of distinct objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if no member frame has objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterates the distinct objects in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.counts.keys().copied()
    }

    /// Number of candidate objects that are members.
    #[must_use]
    pub fn overlap(&self, candidate: &BTreeSet<ObjectId>) -> usize {
        candidate.iter().filter(|id| self.contains(**id)).count()
    }

    /// Removes every object.
    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

//! Half-open index windows over a segment.

use std::ops::Range;

/// A half-open window `[from, until)` over a sequence.
///
/// Bounds may be negative, meaning "counted from the end": `until = -k`
/// selects all but the last `k` elements and `from = -k` selects the last
/// `k`. Missing bounds mean the start and the end of the sequence. Bounds
/// past either end are clamped, and a window whose start is not before its
/// end is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    from: Option<isize>,
    until: Option<isize>,
}

impl Window {
    /// The whole sequence.
    pub const ALL: Window = Window {
        from: None,
        until: None,
    };

    /// The empty window.
    pub const EMPTY: Window = Window {
        from: Some(0),
        until: Some(0),
    };

    /// Creates a window from raw bounds.
    #[must_use]
    pub const fn new(from: Option<isize>, until: Option<isize>) -> Self {
        Self { from, until }
    }

    /// Everything from `from` to the end.
    #[must_use]
    pub const fn starting_at(from: isize) -> Self {
        Self::new(Some(from), None)
    }

    /// Everything from the start up to, not including, `until`.
    #[must_use]
    pub const fn ending_before(until: isize) -> Self {
        Self::new(None, Some(until))
    }

    /// The last `k` elements. `last(0)` is empty.
    #[must_use]
    pub fn last(k: usize) -> Self {
        if k == 0 {
            Self::EMPTY
        } else {
            Self::starting_at(-to_offset(k))
        }
    }

    /// All but the last `k` elements. `all_but_last(0)` is everything.
    #[must_use]
    pub fn all_but_last(k: usize) -> Self {
        if k == 0 {
            Self::ALL
        } else {
            Self::ending_before(-to_offset(k))
        }
    }

    /// Resolves the window against a sequence of length `len`.
    ///
    /// The returned range is always within `0..len` and never inverted.
    #[must_use]
    pub fn resolve(&self, len: usize) -> Range<usize> {
        let start = self.from.map_or(0, |i| clamp(i, len));
        let end = self.until.map_or(len, |i| clamp(i, len));
        start..end.max(start)
    }

    /// Returns true if the window selects nothing from a sequence of length `len`.
    #[must_use]
    pub fn is_empty_for(&self, len: usize) -> bool {
        self.resolve(len).is_empty()
    }
}

fn to_offset(k: usize) -> isize {
    isize::try_from(k).unwrap_or(isize::MAX)
}

fn clamp(bound: isize, len: usize) -> usize {
    if bound < 0 {
        len.saturating_sub(bound.unsigned_abs())
    } else {
        bound.unsigned_abs().min(len)
    }
}

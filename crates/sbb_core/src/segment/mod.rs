//! Segments: ordered runs of frames.
//!
//! A [`Segment`] is the mutable pool the segmentation machine grows. Once
//! closed it is sealed into a [`SealedSegment`], which carries its
//! finalisation index and per-frame compression decisions and is what the
//! eviction queue admits.
//!
//! ## Windows
//!
//! Slicing operations take a [`Window`] `[from, until)` whose bounds may be
//! negative to count from the end:
//!
//! ```text
//! frames:            f0 f1 f2 f3 f4
//! Window::last(2)                f3 f4
//! all_but_last(2)    f0 f1 f2
//! ```

mod buffer;
mod objects;
mod sealed;
mod window;

pub use buffer::Segment;
pub use objects::ObjectSet;
pub use sealed::{SealedSegment, SegmentRecord};
pub use window::Window;

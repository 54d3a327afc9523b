//! The segmentation state machine.
//!
//! A Mealy machine over four states decides for every frame whether it
//! extends the segment being built, goes to the holding pool, or closes the
//! current segment:
//!
//! ```text
//!            1,3                      2,4
//!   ACTIVE ───────► WAITING ◄──────► BUFFERING ◄── ACTIVE
//!                      │        1        │          2,4
//!                    6 │                 │ 5
//!                      ▼                 ▼
//!                   TERMINATE ──reset──► ACTIVE
//! ```
//!
//! [`transition`] is the pure table; [`SegmentationMachine`] owns the pools
//! and runs the actions.

mod engine;
mod transition;

pub use engine::{SegmentationMachine, Step};
pub use transition::{transition, Action, MachineInput, MachineState};

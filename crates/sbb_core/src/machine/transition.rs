//! States, inputs, actions and the transition table.

use crate::error::{CoreError, CoreResult};
use std::fmt;

/// State of the segmentation machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineState {
    /// A segment just closed; the driver must push it and reset.
    Terminate,
    /// Deciding where the next segment starts.
    Active,
    /// Growing the major segment.
    Buffering,
    /// Accumulating frames in the wait segment.
    Waiting,
}

impl MachineState {
    /// All states.
    pub const ALL: [MachineState; 4] = [
        MachineState::Terminate,
        MachineState::Active,
        MachineState::Buffering,
        MachineState::Waiting,
    ];
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MachineState::Terminate => "TERMINATE",
            MachineState::Active => "ACTIVE",
            MachineState::Buffering => "BUFFERING",
            MachineState::Waiting => "WAITING",
        })
    }
}

/// Input offered to the machine for one step.
///
/// Capacity inputs (5, 6) take precedence over value/similarity inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MachineInput {
    /// Value at or below threshold, not similar.
    QuietUnrelated = 1,
    /// Value above threshold, not similar.
    ValuableUnrelated = 2,
    /// Value at or below threshold, similar.
    QuietRelated = 3,
    /// Value above threshold, similar.
    ValuableRelated = 4,
    /// The major segment reached its size cap.
    MajorFull = 5,
    /// The wait segment reached its size cap.
    WaitFull = 6,
}

impl MachineInput {
    /// All inputs in numeric order.
    pub const ALL: [MachineInput; 6] = [
        MachineInput::QuietUnrelated,
        MachineInput::ValuableUnrelated,
        MachineInput::QuietRelated,
        MachineInput::ValuableRelated,
        MachineInput::MajorFull,
        MachineInput::WaitFull,
    ];

    /// The input number.
    #[must_use]
    pub fn number(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MachineInput {
    type Error = CoreError;

    fn try_from(input: u8) -> CoreResult<Self> {
        MachineInput::ALL
            .get(usize::from(input).wrapping_sub(1))
            .copied()
            .ok_or(CoreError::InvalidInput { input })
    }
}

impl fmt::Display for MachineInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Action run on the pools after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Action {
    /// Flush the precursor into major, then append the frame to major.
    StartMajor = 1,
    /// Flush the precursor into wait, then append the frame to wait.
    StartWait = 2,
    /// Append the frame to major.
    ExtendMajor = 3,
    /// Merge wait into major, then append the frame to major.
    PromoteWait = 4,
    /// Append the frame to wait.
    ExtendWait = 5,
    /// Major is full: carry its tail over as precursor and close it.
    CloseMajor = 6,
    /// Wait is full: carry its tail over as precursor, fold the rest into major and close it.
    CloseWait = 7,
}

impl Action {
    /// All actions in numeric order.
    pub const ALL: [Action; 7] = [
        Action::StartMajor,
        Action::StartWait,
        Action::ExtendMajor,
        Action::PromoteWait,
        Action::ExtendWait,
        Action::CloseMajor,
        Action::CloseWait,
    ];

    /// The action number.
    #[must_use]
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Returns true if the action closes the major segment.
    #[must_use]
    pub fn closes_segment(self) -> bool {
        matches!(self, Action::CloseMajor | Action::CloseWait)
    }
}

impl TryFrom<u8> for Action {
    type Error = CoreError;

    fn try_from(action: u8) -> CoreResult<Self> {
        Action::ALL
            .get(usize::from(action).wrapping_sub(1))
            .copied()
            .ok_or(CoreError::InvalidAction { action })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Looks up the transition table.
///
/// | State     | Input   | Next      | Action |
/// |-----------|---------|-----------|--------|
/// | ACTIVE    | 1, 3    | WAITING   | 2      |
/// | ACTIVE    | 2, 4    | BUFFERING | 1      |
/// | BUFFERING | 1       | WAITING   | 5      |
/// | BUFFERING | 2, 3, 4 | BUFFERING | 3      |
/// | BUFFERING | 5       | TERMINATE | 6      |
/// | WAITING   | 1, 3    | WAITING   | 5      |
/// | WAITING   | 2, 4    | BUFFERING | 4      |
/// | WAITING   | 6       | TERMINATE | 7      |
///
/// # Errors
///
/// Every other pair is an `InvalidTransition`.
pub fn transition(
    state: MachineState,
    input: MachineInput,
) -> CoreResult<(MachineState, Action)> {
    use MachineInput::*;
    use MachineState::*;

    let next = match (state, input) {
        (Active, QuietUnrelated | QuietRelated) => (Waiting, Action::StartWait),
        (Active, ValuableUnrelated | ValuableRelated) => (Buffering, Action::StartMajor),
        (Buffering, QuietUnrelated) => (Waiting, Action::ExtendWait),
        (Buffering, ValuableUnrelated | QuietRelated | ValuableRelated) => {
            (Buffering, Action::ExtendMajor)
        }
        (Buffering, MajorFull) => (Terminate, Action::CloseMajor),
        (Waiting, QuietUnrelated | QuietRelated) => (Waiting, Action::ExtendWait),
        (Waiting, ValuableUnrelated | ValuableRelated) => (Buffering, Action::PromoteWait),
        (Waiting, WaitFull) => (Terminate, Action::CloseWait),
        _ => return Err(CoreError::InvalidTransition { state, input }),
    };
    Ok(next)
}

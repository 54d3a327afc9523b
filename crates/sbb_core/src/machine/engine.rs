//! The segmentation machine and its pools.

use super::transition::{transition, Action, MachineInput, MachineState};
use crate::config::MachineConfig;
use crate::error::{CoreError, CoreResult};
use crate::frame::Frame;
use crate::segment::{Segment, Window};
use std::mem;
use tracing::debug;

/// Outcome of running an action with a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The frame was placed in a pool.
    Resolved,
    /// A segment closed before the frame could be placed; the frame is
    /// handed back and must be retried after the closed segment is pushed
    /// and the machine reset.
    Pending(Frame),
}

/// Mealy machine that partitions a frame stream into segments.
///
/// The machine grows three pools:
/// - **precursor**: frames carried over across a segment boundary
/// - **major**: the segment being built
/// - **wait**: frames held back until it is clear whether they belong to major
///
/// Most callers only need [`SegmentationMachine::start`],
/// [`SegmentationMachine::advance`] and [`SegmentationMachine::finish`]. The
/// lower-level steps are public so the driving loop can be run by hand.
#[derive(Debug, Clone)]
pub struct SegmentationMachine {
    config: MachineConfig,
    state: MachineState,
    prev_state: MachineState,
    precursor: Segment,
    major: Segment,
    wait: Segment,
    started: bool,
}

impl SegmentationMachine {
    /// Creates a machine that has not been started.
    #[must_use]
    pub fn new(config: MachineConfig) -> Self {
        Self {
            config,
            state: MachineState::Active,
            prev_state: MachineState::Active,
            precursor: Segment::new(),
            major: Segment::new(),
            wait: Segment::new(),
            started: false,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> MachineState {
        self.state
    }

    /// State before the last transition.
    #[must_use]
    pub fn previous_state(&self) -> MachineState {
        self.prev_state
    }

    /// Returns true once [`Self::start`] has succeeded.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// The carry-over pool.
    #[must_use]
    pub fn precursor(&self) -> &Segment {
        &self.precursor
    }

    /// The segment being built.
    #[must_use]
    pub fn major(&self) -> &Segment {
        &self.major
    }

    /// The holding pool.
    #[must_use]
    pub fn wait(&self) -> &Segment {
        &self.wait
    }

    /// The machine limits.
    #[must_use]
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Starts the machine with an initial precursor.
    ///
    /// The seed input is 2 if the precursor holds a frame above the value
    /// threshold and 1 otherwise; the resulting start action is applied
    /// without a frame.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStart` if the seed does not lead to action 1 or 2,
    /// which happens when the machine is not in ACTIVE.
    pub fn start(&mut self, precursor: Segment) -> CoreResult<()> {
        self.state = MachineState::Active;
        self.prev_state = MachineState::Active;
        self.precursor = precursor;
        self.major.clear();
        self.wait.clear();

        let input = if self.precursor.max_value() > self.config.value_threshold {
            MachineInput::ValuableUnrelated
        } else {
            MachineInput::QuietUnrelated
        };
        debug!(input = input.number(), "machine start");

        let action = self.update_state(input)?;
        match action {
            Action::StartMajor | Action::StartWait => {
                self.apply(None, action);
                self.started = true;
                Ok(())
            }
            other => Err(CoreError::InvalidStart {
                action: other.number(),
            }),
        }
    }

    /// Classifies a frame.
    ///
    /// Capacity inputs win: 5 if major is full, then 6 if wait is full.
    /// Otherwise the frame is related when `similarity` exceeds the
    /// similarity threshold, and valuable when its value exceeds the value
    /// threshold.
    #[must_use]
    pub fn compute_input(&self, frame: &Frame, similarity: Option<f64>) -> MachineInput {
        let valuable = frame.value > self.config.value_threshold;
        let related = similarity.is_some_and(|s| s > self.config.similarity_threshold);

        let input = if self.major.size() >= self.config.major_buffer_max {
            MachineInput::MajorFull
        } else if self.wait.size() >= self.config.wait_buffer_max {
            MachineInput::WaitFull
        } else {
            match (related, valuable) {
                (false, false) => MachineInput::QuietUnrelated,
                (false, true) => MachineInput::ValuableUnrelated,
                (true, false) => MachineInput::QuietRelated,
                (true, true) => MachineInput::ValuableRelated,
            }
        };
        debug!(frame = frame.index, input = input.number(), "machine input");
        input
    }

    /// Applies one row of the transition table.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` for pairs the table does not list. The
    /// machine state is left unchanged in that case.
    pub fn update_state(&mut self, input: MachineInput) -> CoreResult<Action> {
        let (next, action) = transition(self.state, input)?;
        self.prev_state = self.state;
        self.state = next;
        debug!(
            state = %next,
            action = action.number(),
            "machine transition"
        );
        Ok(action)
    }

    /// Runs an action with the current frame.
    ///
    /// Closing actions (6, 7) leave the frame unplaced and hand it back.
    pub fn run_action(&mut self, frame: Frame, action: Action) -> Step {
        match self.apply(Some(frame), action) {
            Some(frame) => Step::Pending(frame),
            None => Step::Resolved,
        }
    }

    /// Runs an action; returns the frame if it was not placed.
    fn apply(&mut self, frame: Option<Frame>, action: Action) -> Option<Frame> {
        match action {
            Action::StartMajor => {
                self.major.merge(mem::take(&mut self.precursor));
                append_frame(&mut self.major, frame);
            }
            Action::StartWait => {
                self.wait.merge(mem::take(&mut self.precursor));
                append_frame(&mut self.wait, frame);
            }
            Action::ExtendMajor => append_frame(&mut self.major, frame),
            Action::PromoteWait => {
                self.major.merge(mem::take(&mut self.wait));
                append_frame(&mut self.major, frame);
            }
            Action::ExtendWait => append_frame(&mut self.wait, frame),
            Action::CloseMajor => {
                let carry = self.config.pre_buffer_min;
                self.precursor.copy(&self.major, Window::last(carry));
                self.major.split(Window::all_but_last(carry));
                return frame;
            }
            Action::CloseWait => {
                let carry = self.config.pre_buffer_min.max(
                    (self.major.size() + self.wait.size())
                        .saturating_sub(self.config.major_buffer_max),
                );
                self.precursor.copy(&self.wait, Window::last(carry));
                self.major.extend(&self.wait, Window::all_but_last(carry));
                return frame;
            }
        }
        None
    }

    /// Takes the closed major segment out of the machine.
    ///
    /// Meant to be called in TERMINATE, before [`Self::reset`].
    pub fn take_major(&mut self) -> Segment {
        mem::take(&mut self.major)
    }

    /// Resets the machine after a TERMINATE and returns the seed input for
    /// the pending frame.
    ///
    /// The seed is 2 if the machine terminated from BUFFERING or if the
    /// pending frame is above the value threshold, and 1 if it terminated
    /// from WAITING. Major and wait are cleared; the precursor keeps the
    /// carry-over of the closing action.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReset` if neither rule applies.
    pub fn reset(&mut self, frame: &Frame) -> CoreResult<MachineInput> {
        let input = if self.prev_state == MachineState::Buffering
            || frame.value > self.config.value_threshold
        {
            MachineInput::ValuableUnrelated
        } else if self.prev_state == MachineState::Waiting {
            MachineInput::QuietUnrelated
        } else {
            return Err(CoreError::InvalidReset {
                previous: self.prev_state,
            });
        };

        self.state = MachineState::Active;
        self.prev_state = MachineState::Active;
        self.major.clear();
        self.wait.clear();

        debug!(frame = frame.index, input = input.number(), "machine reset");
        Ok(input)
    }

    /// Feeds one frame through the driving loop.
    ///
    /// While the machine is in TERMINATE the closed major segment is passed
    /// to `on_close` and the machine is reset; the frame is then classified
    /// again until an action places it.
    ///
    /// # Errors
    ///
    /// Returns `NotStarted` before [`Self::start`], any invariant violation
    /// of the table, or the first error returned by `on_close`.
    pub fn advance<F>(&mut self, mut frame: Frame, mut on_close: F) -> CoreResult<()>
    where
        F: FnMut(Segment) -> CoreResult<()>,
    {
        if !self.started {
            return Err(CoreError::NotStarted);
        }

        loop {
            let input = if self.state == MachineState::Terminate {
                on_close(self.take_major())?;
                self.reset(&frame)?
            } else {
                let similarity = self.major.similarity(&frame.objects);
                self.compute_input(&frame, Some(similarity))
            };

            let action = self.update_state(input)?;
            match self.run_action(frame, action) {
                Step::Resolved => return Ok(()),
                Step::Pending(pending) => frame = pending,
            }
        }
    }

    /// Ends the stream.
    ///
    /// Folds wait into major and returns major if it holds frames. A machine
    /// that was never started yields nothing.
    pub fn finish(&mut self) -> Option<Segment> {
        if !self.started {
            return None;
        }
        let wait = mem::take(&mut self.wait);
        self.major.merge(wait);
        let major = self.take_major();
        (!major.is_empty()).then_some(major)
    }
}

fn append_frame(segment: &mut Segment, frame: Option<Frame>) {
    if let Some(frame) = frame {
        segment.append(frame);
    }
}

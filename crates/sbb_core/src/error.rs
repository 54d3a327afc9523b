//! Error types for SBB core.

use crate::machine::{MachineInput, MachineState};
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in SBB core operations.
///
/// Invariant violations (`InvalidTransition`, `InvalidAction`, `InvalidInput`,
/// `InvalidStart`, `InvalidReset`, `NotStarted`) are programming or data errors.
/// They abort the current run; there is no recovery from them.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Record store error.
    #[error("storage error: {0}")]
    Storage(#[from] sbb_storage::StorageError),

    /// JSON encoding or decoding error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The transition table has no row for this state and input.
    #[error("no transition for input {input} in state {state}")]
    InvalidTransition {
        /// State the machine was in.
        state: MachineState,
        /// Input that was offered.
        input: MachineInput,
    },

    /// A raw action number outside 1..=7.
    #[error("unrecognized action number {action}")]
    InvalidAction {
        /// The offending number.
        action: u8,
    },

    /// A raw input number outside 1..=6.
    #[error("unrecognized input number {input}")]
    InvalidInput {
        /// The offending number.
        input: u8,
    },

    /// Starting the machine produced an action other than 1 or 2.
    #[error("inappropriate initial action {action}")]
    InvalidStart {
        /// The action produced by the start transition.
        action: u8,
    },

    /// Reset was requested from a state that cannot terminate.
    #[error("cannot reset after state {previous}")]
    InvalidReset {
        /// The state preceding the reset.
        previous: MachineState,
    },

    /// Frames were fed to a machine that was never started.
    #[error("segmentation machine has not been started")]
    NotStarted,

    /// Configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// The value oracle could not score a frame.
    #[error("value oracle failed: {message}")]
    Oracle {
        /// Description of the failure.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates a value oracle error.
    pub fn oracle(message: impl Into<String>) -> Self {
        Self::Oracle {
            message: message.into(),
        }
    }

    /// Returns true if this error is a broken machine invariant.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidTransition { .. }
                | CoreError::InvalidAction { .. }
                | CoreError::InvalidInput { .. }
                | CoreError::InvalidStart { .. }
                | CoreError::InvalidReset { .. }
                | CoreError::NotStarted
        )
    }
}

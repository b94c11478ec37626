//! Core domain errors.

use thiserror::Error;

use crate::TaskStatus;

/// Core domain errors for deskshell.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid task lifecycle transition.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: TaskStatus, to: TaskStatus },

    /// Task target does not name a known task kind.
    #[error("Unknown task kind: {0}")]
    UnknownTaskKind(String),

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

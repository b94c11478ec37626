//! Task status and lifecycle state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::CoreError;

/// Status of a dispatched task.
///
/// `Requested` is the implicit initial state and never appears on the wire;
/// workers only report `Running`, `Completed` and `Failed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Request accepted by the dispatcher, no worker output yet.
    #[default]
    Requested,
    /// Unit of work is about to start or is executing.
    Running,
    /// Unit of work finished with a result.
    Completed,
    /// Unrecognized target, or a fault during execution.
    Failed,
}

impl TaskStatus {
    /// Returns true if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if the task is still active (not terminal).
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (Self::Requested, Self::Running)
                | (Self::Requested, Self::Failed)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks one request through `Requested -> Running -> {Completed, Failed}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskLifecycle {
    status: TaskStatus,
}

impl TaskLifecycle {
    /// Create a lifecycle in the `Requested` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status.
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns true once a terminal status has been reached.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Advance to `next`, rejecting transitions the protocol does not allow.
    pub fn advance(&mut self, next: TaskStatus) -> Result<TaskStatus, CoreError> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidStateTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(next)
    }
}

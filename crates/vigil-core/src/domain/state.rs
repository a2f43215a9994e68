//! Execution state machine as reported by the remote service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of one query execution.
///
/// State transitions (owned entirely by the remote service):
/// - Queued -> Running -> Succeeded
/// - Queued -> Running -> Failed
/// - Queued | Running -> Cancelled
///
/// Design note: Using an enum ensures exhaustive matching and prevents
/// invalid states. Serde and `Display` both use the remote wire spelling
/// (SCREAMING_SNAKE_CASE), so formatted errors embed `FAILED` / `CANCELLED`
/// exactly as the service reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionState {
    /// Accepted by the service, not yet running.
    Queued,

    /// Currently executing.
    Running,

    /// Completed successfully.
    Succeeded,

    /// Completed with an error.
    Failed,

    /// Stopped before completion (by the user or the service).
    Cancelled,
}

impl ExecutionState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExecutionState::Succeeded | ExecutionState::Failed | ExecutionState::Cancelled
        )
    }

    /// The wire spelling used by the remote service.
    pub fn as_wire_str(self) -> &'static str {
        match self {
            ExecutionState::Queued => "QUEUED",
            ExecutionState::Running => "RUNNING",
            ExecutionState::Succeeded => "SUCCEEDED",
            ExecutionState::Failed => "FAILED",
            ExecutionState::Cancelled => "CANCELLED",
        }
    }

    /// Lenient mapping from a wire value.
    ///
    /// Unrecognized spellings map to `None` so adapters can hand them to the
    /// waiter as "no usable state" instead of failing the decode. The waiter
    /// treats `None` as non-terminal.
    pub fn parse_wire(s: &str) -> Option<Self> {
        match s {
            "QUEUED" => Some(ExecutionState::Queued),
            "RUNNING" => Some(ExecutionState::Running),
            "SUCCEEDED" => Some(ExecutionState::Succeeded),
            "FAILED" => Some(ExecutionState::Failed),
            "CANCELLED" => Some(ExecutionState::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire_str())
    }
}

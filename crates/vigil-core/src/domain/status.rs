//! Status snapshot returned by the remote service for one execution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::state::ExecutionState;

/// Sentinel used when a terminal status carries no reason.
pub const UNKNOWN_REASON: &str = "unknown";

/// One answer to "what is execution X doing right now".
///
/// `state` is `None` when the service reported no state at all or a spelling
/// this crate does not recognize; both cases read as "not terminal yet" to
/// the waiter. Timestamps are whatever the service chose to report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionStatus {
    #[serde(default, deserialize_with = "lenient_state")]
    pub state: Option<ExecutionState>,

    /// Free-text detail accompanying a terminal FAILED/CANCELLED state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_change_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ExecutionStatus {
    pub fn new(state: Option<ExecutionState>) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    /// The state-change reason, normalized to [`UNKNOWN_REASON`] when the
    /// service supplied none.
    pub fn reason_or_unknown(&self) -> &str {
        self.state_change_reason
            .as_deref()
            .unwrap_or(UNKNOWN_REASON)
    }
}

/// Decode `state` leniently: unrecognized wire values become `None` rather
/// than a decode error, so a service rolling out new states cannot break the
/// wait loop.
fn lenient_state<'de, D>(deserializer: D) -> Result<Option<ExecutionState>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(ExecutionState::parse_wire))
}

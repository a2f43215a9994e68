//! Error taxonomy for the wait loop.

use std::time::Duration;

use thiserror::Error;

use crate::domain::ExecutionState;

/// Boxed error reported by a [`StatusSource`](crate::ports::StatusSource)
/// implementation (network fault, service rejection, ...).
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Everything a wait can fail with.
///
/// Design intent:
/// - `Timeout` and `State` are the only errors the waiter itself produces.
/// - `Remote` is the pass-through case: the waiter neither interprets nor
///   rewraps a collaborator fault, so its message surfaces untouched.
///
/// Callers should match on the variant: a `Timeout` means the execution may
/// still finish and re-waiting is sensible; a `State` failure is final.
#[derive(Debug, Error)]
pub enum WaitError {
    /// Cumulative elapsed time exceeded the timeout before a terminal state
    /// was observed.
    #[error("query execution timed out after {}ms", elapsed.as_millis())]
    Timeout { elapsed: Duration },

    /// The execution reached FAILED or CANCELLED.
    #[error("query execution failed with state {state}: {reason}")]
    State {
        state: ExecutionState,
        /// Reason reported by the service, `"unknown"` when it supplied none.
        reason: String,
    },

    /// A fault from the status source, propagated as-is.
    #[error(transparent)]
    Remote(SourceError),
}

impl WaitError {
    pub fn remote(err: impl Into<SourceError>) -> Self {
        WaitError::Remote(err.into())
    }

    /// True for the one variant where re-waiting on the same execution can
    /// still succeed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }
}

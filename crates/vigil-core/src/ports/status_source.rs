//! StatusSource port - the remote query service seam.

use async_trait::async_trait;

use crate::domain::{ExecutionId, ExecutionStatus};
use crate::error::WaitError;

/// Source of execution status snapshots.
///
/// The waiter only consumes this one operation; submission, result fetching
/// and authentication live behind whatever client implements it. The call is
/// assumed idempotent and side-effect-free, so the waiter may issue it any
/// number of times for the same id.
///
/// Implementations report their own faults through [`WaitError::Remote`];
/// the waiter does not catch or retry them.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Current status of the given execution.
    async fn fetch_status(&self, id: &ExecutionId) -> Result<ExecutionStatus, WaitError>;
}

//! InMemoryQueryService - dev/test implementation of [`StatusSource`].
//!
//! Simulates the remote side of the seam: submitted executions walk
//! Queued -> Running -> terminal on a schedule you pick, and can be
//! cancelled mid-flight. Useful for demos and for exercising the waiter
//! without a network.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::sleep;
use ulid::Ulid;

use crate::domain::{ExecutionId, ExecutionState, ExecutionStatus};
use crate::error::WaitError;
use crate::ports::StatusSource;

/// Service-side fault: the id was never submitted here.
#[derive(Debug, Error)]
#[error("query execution not found: {0}")]
pub struct ExecutionNotFound(pub ExecutionId);

/// How a simulated execution ends.
#[derive(Debug, Clone)]
pub enum SimulatedOutcome {
    Succeed,
    Fail { reason: String },
    Cancel { reason: String },
}

/// Schedule for one simulated execution.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// Dwell time in QUEUED before the execution starts.
    pub time_in_queue: Duration,
    /// Dwell time in RUNNING before the outcome applies.
    pub run_for: Duration,
    pub outcome: SimulatedOutcome,
}

impl ExecutionPlan {
    pub fn succeed_after(run_for: Duration) -> Self {
        Self {
            time_in_queue: Duration::ZERO,
            run_for,
            outcome: SimulatedOutcome::Succeed,
        }
    }

    pub fn fail_after(run_for: Duration, reason: impl Into<String>) -> Self {
        Self {
            time_in_queue: Duration::ZERO,
            run_for,
            outcome: SimulatedOutcome::Fail {
                reason: reason.into(),
            },
        }
    }

    pub fn in_queue_for(mut self, time_in_queue: Duration) -> Self {
        self.time_in_queue = time_in_queue;
        self
    }
}

/// In-memory stand-in for the remote query service.
///
/// Design:
/// - The status map is the single source of truth; transitions only happen
///   under its lock.
/// - `submit` spawns one tokio task per execution that applies the planned
///   transitions; an intervening `cancel` wins and the task backs off.
#[derive(Default)]
pub struct InMemoryQueryService {
    executions: Arc<Mutex<HashMap<ExecutionId, ExecutionStatus>>>,
}

impl InMemoryQueryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a simulated execution and start its lifecycle.
    ///
    /// Must run inside a tokio runtime (spawns the transition task).
    pub async fn submit(&self, plan: ExecutionPlan) -> ExecutionId {
        let id = Self::next_execution_id();
        {
            let mut executions = self.executions.lock().await;
            executions.insert(
                id.clone(),
                ExecutionStatus {
                    state: Some(ExecutionState::Queued),
                    submitted_at: Some(Utc::now()),
                    ..ExecutionStatus::default()
                },
            );
        }

        let executions = Arc::clone(&self.executions);
        let task_id = id.clone();
        tokio::spawn(async move {
            run_plan(executions, task_id, plan).await;
        });

        id
    }

    /// Stop a non-terminal execution. No-op when it already finished.
    pub async fn cancel(
        &self,
        id: &ExecutionId,
        reason: impl Into<String>,
    ) -> Result<(), WaitError> {
        let mut executions = self.executions.lock().await;
        let status = executions
            .get_mut(id)
            .ok_or_else(|| WaitError::remote(ExecutionNotFound(id.clone())))?;

        if status.state.is_some_and(ExecutionState::is_terminal) {
            return Ok(());
        }
        status.state = Some(ExecutionState::Cancelled);
        status.state_change_reason = Some(reason.into());
        status.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Remote-assigned ids: ULID over current time plus randomness, printed
    /// with a service prefix.
    fn next_execution_id() -> ExecutionId {
        let timestamp_ms = Utc::now().timestamp_millis() as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        ExecutionId::new(format!("exec-{ulid}")).expect("generated ids are never empty")
    }
}

async fn run_plan(
    executions: Arc<Mutex<HashMap<ExecutionId, ExecutionStatus>>>,
    id: ExecutionId,
    plan: ExecutionPlan,
) {
    sleep(plan.time_in_queue).await;
    {
        let mut executions = executions.lock().await;
        match executions.get_mut(&id) {
            // Only advance an execution that is still waiting; anything else
            // means a cancel got there first.
            Some(status) if status.state == Some(ExecutionState::Queued) => {
                status.state = Some(ExecutionState::Running);
            }
            _ => return,
        }
    }

    sleep(plan.run_for).await;
    let mut executions = executions.lock().await;
    let Some(status) = executions.get_mut(&id) else {
        return;
    };
    if status.state.is_some_and(ExecutionState::is_terminal) {
        return;
    }
    match plan.outcome {
        SimulatedOutcome::Succeed => {
            status.state = Some(ExecutionState::Succeeded);
        }
        SimulatedOutcome::Fail { reason } => {
            status.state = Some(ExecutionState::Failed);
            status.state_change_reason = Some(reason);
        }
        SimulatedOutcome::Cancel { reason } => {
            status.state = Some(ExecutionState::Cancelled);
            status.state_change_reason = Some(reason);
        }
    }
    status.completed_at = Some(Utc::now());
}

#[async_trait]
impl StatusSource for InMemoryQueryService {
    async fn fetch_status(&self, id: &ExecutionId) -> Result<ExecutionStatus, WaitError> {
        let executions = self.executions.lock().await;
        executions
            .get(id)
            .cloned()
            .ok_or_else(|| WaitError::remote(ExecutionNotFound(id.clone())))
    }
}

//! ExecutionWaiter - poll a remote execution until it reaches a terminal
//! state.
//!
//! The waiter owns nothing but a [`StatusSource`] handle and a default poll
//! interval. Each `wait` call is self-contained: its own start time, its own
//! deadline, its own queries. Concurrent waits on one waiter (even for the
//! same execution id) never interact.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

use crate::domain::{ExecutionId, ExecutionState};
use crate::error::WaitError;
use crate::ports::StatusSource;

/// Poll interval used when neither the constructor nor the call supplies one.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Timeout used when the call supplies none.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Construction-time settings for [`ExecutionWaiter`].
#[derive(Debug, Clone)]
pub struct WaiterConfig {
    /// Poll interval for waits that do not override it. Raise this for
    /// long-running executions to cut status-query volume.
    pub poll_interval: Duration,
}

impl Default for WaiterConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Per-call settings for [`ExecutionWaiter::wait`].
///
/// Fallback precedence, resolved once at call entry:
/// - poll interval: `poll_interval` here, else the waiter's config, else
///   [`DEFAULT_POLL_INTERVAL`];
/// - timeout: `timeout` here, else [`DEFAULT_WAIT_TIMEOUT`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WaitOptions {
    pub timeout: Option<Duration>,
    pub poll_interval: Option<Duration>,
}

/// Waits for a query execution to complete.
///
/// Polls the status source until the execution becomes SUCCEEDED, FAILED, or
/// CANCELLED, or until the cumulative wall-clock budget runs out.
///
/// Design intent:
/// - The remote service owns all state transitions; this type only reads.
/// - A pure fixed-interval poll: no backoff, no per-query timeout, no retry
///   of a failed status query.
/// - No cancellation token: a wait ends via success, terminal failure,
///   timeout, or a propagated source fault.
pub struct ExecutionWaiter {
    source: Arc<dyn StatusSource>,
    config: WaiterConfig,
}

impl ExecutionWaiter {
    pub fn new(source: Arc<dyn StatusSource>) -> Self {
        Self::with_config(source, WaiterConfig::default())
    }

    pub fn with_config(source: Arc<dyn StatusSource>, config: WaiterConfig) -> Self {
        Self { source, config }
    }

    /// Wait until the given execution completes (or fails/cancels).
    ///
    /// The only successful return value is [`ExecutionState::Succeeded`].
    ///
    /// # Errors
    /// - [`WaitError::Timeout`] once elapsed time strictly exceeds the
    ///   effective timeout. The check runs before every query, including the
    ///   first; `timeout = 0` therefore still permits exactly the queries
    ///   issued at elapsed zero.
    /// - [`WaitError::State`] when the execution reaches FAILED or
    ///   CANCELLED, carrying the reason the service reported (`"unknown"`
    ///   when it reported none).
    /// - [`WaitError::Remote`] from the source, passed through untouched.
    pub async fn wait(
        &self,
        id: &ExecutionId,
        options: WaitOptions,
    ) -> Result<ExecutionState, WaitError> {
        let poll_interval = options.poll_interval.unwrap_or(self.config.poll_interval);
        let timeout = options.timeout.unwrap_or(DEFAULT_WAIT_TIMEOUT);
        let started = Instant::now();

        // Exit paths are the explicit branches below: deadline exceeded, or
        // a terminal state observed. Everything else polls again.
        loop {
            let elapsed = started.elapsed();
            if elapsed > timeout {
                debug!(
                    execution_id = %id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "wait deadline exceeded"
                );
                return Err(WaitError::Timeout { elapsed });
            }

            let status = self.source.fetch_status(id).await?;
            match status.state {
                Some(ExecutionState::Succeeded) => {
                    debug!(execution_id = %id, "execution succeeded");
                    return Ok(ExecutionState::Succeeded);
                }
                Some(state @ (ExecutionState::Failed | ExecutionState::Cancelled)) => {
                    let reason = status.reason_or_unknown().to_owned();
                    debug!(execution_id = %id, %state, %reason, "execution reached terminal failure");
                    return Err(WaitError::State { state, reason });
                }
                observed => {
                    trace!(
                        execution_id = %id,
                        state = ?observed,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "execution not terminal; polling again"
                    );
                    sleep(poll_interval).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExecutionStatus;
    use async_trait::async_trait;
    use rstest::rstest;
    use std::collections::VecDeque;
    use tokio::sync::Mutex;

    /// Plays back a fixed sequence of answers, then reports RUNNING forever.
    /// Records the (tokio) instant of every query for interval assertions.
    struct ScriptedSource {
        steps: Mutex<VecDeque<Result<ExecutionStatus, WaitError>>>,
        polls: Mutex<Vec<Instant>>,
    }

    impl ScriptedSource {
        fn new(steps: Vec<Result<ExecutionStatus, WaitError>>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                polls: Mutex::new(Vec::new()),
            })
        }

        async fn poll_count(&self) -> usize {
            self.polls.lock().await.len()
        }

        async fn poll_gaps(&self) -> Vec<Duration> {
            let polls = self.polls.lock().await;
            polls.windows(2).map(|w| w[1] - w[0]).collect()
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch_status(&self, _id: &ExecutionId) -> Result<ExecutionStatus, WaitError> {
            self.polls.lock().await.push(Instant::now());
            match self.steps.lock().await.pop_front() {
                Some(step) => step,
                None => Ok(ExecutionStatus::new(Some(ExecutionState::Running))),
            }
        }
    }

    fn seen(state: ExecutionState) -> Result<ExecutionStatus, WaitError> {
        Ok(ExecutionStatus::new(Some(state)))
    }

    fn seen_with_reason(
        state: ExecutionState,
        reason: &str,
    ) -> Result<ExecutionStatus, WaitError> {
        Ok(ExecutionStatus {
            state: Some(state),
            state_change_reason: Some(reason.to_string()),
            ..ExecutionStatus::default()
        })
    }

    fn exec_id() -> ExecutionId {
        "exec-under-test".parse().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn returns_succeeded_after_a_single_query() {
        let source = ScriptedSource::new(vec![seen(ExecutionState::Succeeded)]);
        let waiter = ExecutionWaiter::new(source.clone());

        let state = waiter.wait(&exec_id(), WaitOptions::default()).await.unwrap();

        assert_eq!(state, ExecutionState::Succeeded);
        assert_eq!(source.poll_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_waits_for_the_same_id_are_independent() {
        let source = ScriptedSource::new(vec![
            seen(ExecutionState::Succeeded),
            seen(ExecutionState::Succeeded),
        ]);
        let waiter = ExecutionWaiter::new(source.clone());
        let id = exec_id();

        let first = waiter.wait(&id, WaitOptions::default()).await.unwrap();
        let second = waiter.wait(&id, WaitOptions::default()).await.unwrap();

        assert_eq!(first, ExecutionState::Succeeded);
        assert_eq!(second, ExecutionState::Succeeded);
        assert_eq!(source.poll_count().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_again_while_running_with_one_delay_between_queries() {
        let source = ScriptedSource::new(vec![
            seen(ExecutionState::Running),
            seen(ExecutionState::Succeeded),
        ]);
        let waiter = ExecutionWaiter::new(source.clone());
        let options = WaitOptions {
            poll_interval: Some(Duration::from_millis(25)),
            ..WaitOptions::default()
        };

        let state = waiter.wait(&exec_id(), options).await.unwrap();

        assert_eq!(state, ExecutionState::Succeeded);
        assert_eq!(source.poll_count().await, 2);
        assert_eq!(source.poll_gaps().await, vec![Duration::from_millis(25)]);
    }

    #[rstest]
    #[case::failed(ExecutionState::Failed, "Table not found")]
    #[case::cancelled(ExecutionState::Cancelled, "User cancelled")]
    #[tokio::test(start_paused = true)]
    async fn terminal_failure_maps_to_state_error(
        #[case] terminal: ExecutionState,
        #[case] why: &str,
    ) {
        let source = ScriptedSource::new(vec![seen_with_reason(terminal, why)]);
        let waiter = ExecutionWaiter::new(source.clone());

        let err = waiter
            .wait(&exec_id(), WaitOptions::default())
            .await
            .unwrap_err();

        match &err {
            WaitError::State { state, reason } => {
                assert_eq!(*state, terminal);
                assert_eq!(reason, why);
            }
            other => panic!("expected state error, got {other:?}"),
        }
        assert!(err.to_string().contains(terminal.as_wire_str()));
        assert!(err.to_string().contains(why));
        assert_eq!(source.poll_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_reason_normalizes_to_unknown() {
        let source = ScriptedSource::new(vec![seen(ExecutionState::Failed)]);
        let waiter = ExecutionWaiter::new(source);

        let err = waiter
            .wait(&exec_id(), WaitOptions::default())
            .await
            .unwrap_err();

        match err {
            WaitError::State { reason, .. } => assert_eq!(reason, "unknown"),
            other => panic!("expected state error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn missing_state_reads_as_not_terminal_yet() {
        let source = ScriptedSource::new(vec![
            Ok(ExecutionStatus::new(None)),
            seen(ExecutionState::Succeeded),
        ]);
        let waiter = ExecutionWaiter::new(source.clone());
        let options = WaitOptions {
            poll_interval: Some(Duration::from_millis(10)),
            ..WaitOptions::default()
        };

        let state = waiter.wait(&exec_id(), options).await.unwrap();

        assert_eq!(state, ExecutionState::Succeeded);
        assert_eq!(source.poll_count().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_never_terminal() {
        // Script empty: the source answers RUNNING forever.
        let source = ScriptedSource::new(vec![]);
        let waiter = ExecutionWaiter::new(source.clone());
        let timeout = Duration::from_millis(100);
        let options = WaitOptions {
            timeout: Some(timeout),
            poll_interval: Some(Duration::from_millis(10)),
        };

        let err = waiter.wait(&exec_id(), options).await.unwrap_err();

        match err {
            WaitError::Timeout { elapsed } => assert!(elapsed >= timeout),
            other => panic!("expected timeout, got {other:?}"),
        }
        // Queries land at 0ms..=100ms inclusive: the deadline check is
        // strictly ">", so the query at exactly 100ms still happens.
        assert_eq!(source.poll_count().await, 11);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_still_permits_the_first_query() {
        let source = ScriptedSource::new(vec![seen(ExecutionState::Succeeded)]);
        let waiter = ExecutionWaiter::new(source.clone());
        let options = WaitOptions {
            timeout: Some(Duration::ZERO),
            ..WaitOptions::default()
        };

        let state = waiter.wait(&exec_id(), options).await.unwrap();

        assert_eq!(state, ExecutionState::Succeeded);
        assert_eq!(source.poll_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_expires_after_one_non_terminal_query() {
        let source = ScriptedSource::new(vec![]);
        let waiter = ExecutionWaiter::new(source.clone());
        let options = WaitOptions {
            timeout: Some(Duration::ZERO),
            poll_interval: Some(Duration::from_millis(10)),
        };

        let err = waiter.wait(&exec_id(), options).await.unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(source.poll_count().await, 1);
    }

    #[rstest]
    #[case::per_call_override_wins(Some(Duration::from_millis(50)), Some(Duration::from_millis(20)), Duration::from_millis(20))]
    #[case::constructor_default_wins(Some(Duration::from_millis(30)), None, Duration::from_millis(30))]
    #[case::built_in_default(None, None, DEFAULT_POLL_INTERVAL)]
    #[tokio::test(start_paused = true)]
    async fn poll_interval_resolution_order(
        #[case] constructor: Option<Duration>,
        #[case] per_call: Option<Duration>,
        #[case] expected_gap: Duration,
    ) {
        let source = ScriptedSource::new(vec![
            seen(ExecutionState::Queued),
            seen(ExecutionState::Succeeded),
        ]);
        let waiter = match constructor {
            Some(poll_interval) => ExecutionWaiter::with_config(
                source.clone(),
                WaiterConfig { poll_interval },
            ),
            None => ExecutionWaiter::new(source.clone()),
        };
        let options = WaitOptions {
            poll_interval: per_call,
            ..WaitOptions::default()
        };

        waiter.wait(&exec_id(), options).await.unwrap();

        assert_eq!(source.poll_gaps().await, vec![expected_gap]);
    }

    #[tokio::test(start_paused = true)]
    async fn source_fault_propagates_untouched_and_ends_the_wait() {
        let source = ScriptedSource::new(vec![Err(WaitError::remote(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "status endpoint unreachable",
        )))]);
        let waiter = ExecutionWaiter::new(source.clone());

        let err = waiter
            .wait(&exec_id(), WaitOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, WaitError::Remote(_)));
        assert_eq!(err.to_string(), "status endpoint unreachable");
        assert_eq!(source.poll_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_waits_keep_their_own_deadlines() {
        let source = ScriptedSource::new(vec![]);
        let waiter = ExecutionWaiter::new(source.clone());
        let short = WaitOptions {
            timeout: Some(Duration::from_millis(50)),
            poll_interval: Some(Duration::from_millis(10)),
        };
        let long = WaitOptions {
            timeout: Some(Duration::from_millis(100)),
            poll_interval: Some(Duration::from_millis(10)),
        };
        let id = exec_id();

        let (a, b) = tokio::join!(waiter.wait(&id, short), waiter.wait(&id, long));

        let elapsed_short = match a.unwrap_err() {
            WaitError::Timeout { elapsed } => elapsed,
            other => panic!("expected timeout, got {other:?}"),
        };
        let elapsed_long = match b.unwrap_err() {
            WaitError::Timeout { elapsed } => elapsed,
            other => panic!("expected timeout, got {other:?}"),
        };
        assert!(elapsed_short < elapsed_long);
        // 6 queries for the 50ms budget, 11 for the 100ms one.
        assert_eq!(source.poll_count().await, 17);
    }
}

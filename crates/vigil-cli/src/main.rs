use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use vigil_core::impls::{ExecutionPlan, InMemoryQueryService};
use vigil_core::ports::StatusSource;
use vigil_core::{ExecutionWaiter, WaitError, WaitOptions, WaiterConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // (A) In-memory stand-in for the remote query service.
    let service = Arc::new(InMemoryQueryService::new());

    // (B) One waiter per session; polls every 50ms in this demo.
    let waiter = ExecutionWaiter::with_config(
        service.clone(),
        WaiterConfig {
            poll_interval: Duration::from_millis(50),
        },
    );

    // (C) A query that succeeds after queueing briefly.
    let ok_id = service
        .submit(
            ExecutionPlan::succeed_after(Duration::from_millis(300))
                .in_queue_for(Duration::from_millis(100)),
        )
        .await;
    info!(execution_id = %ok_id, "submitted");

    match waiter.wait(&ok_id, WaitOptions::default()).await {
        Ok(state) => {
            let status = service.fetch_status(&ok_id).await.expect("status exists");
            println!("execution {ok_id} finished: {state}");
            println!(
                "{}",
                serde_json::to_string_pretty(&status).expect("status serializes")
            );
        }
        Err(err) => println!("wait failed: {err}"),
    }

    // (D) A query that fails; the waiter surfaces state and reason.
    let bad_id = service
        .submit(ExecutionPlan::fail_after(
            Duration::from_millis(150),
            "Table vigil_demo not found",
        ))
        .await;

    match waiter.wait(&bad_id, WaitOptions::default()).await {
        Ok(state) => println!("unexpected success: {state}"),
        Err(err @ WaitError::State { .. }) => println!("as expected: {err}"),
        Err(err) => println!("wait failed: {err}"),
    }

    // (E) A slow query with a short per-call budget; only the timeout is
    // worth retrying, so callers can tell the two failures apart.
    let slow_id = service
        .submit(ExecutionPlan::succeed_after(Duration::from_secs(60)))
        .await;
    let short_budget = WaitOptions {
        timeout: Some(Duration::from_millis(400)),
        poll_interval: Some(Duration::from_millis(100)),
    };

    match waiter.wait(&slow_id, short_budget).await {
        Err(err @ WaitError::Timeout { .. }) => {
            println!("as expected: {err} (re-waiting would be safe)");
        }
        other => println!("unexpected outcome: {other:?}"),
    }
    service
        .cancel(&slow_id, "demo finished")
        .await
        .expect("execution exists");
}

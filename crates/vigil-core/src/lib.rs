//! vigil-core
//!
//! Blocking-wait helper for query executions that run on a remote service.
//! Hand it an execution id and it polls until the execution reaches a
//! terminal state, returning SUCCEEDED or failing with a typed error.
//!
//! # Module layout
//! - **domain**: domain model (ExecutionId, ExecutionState, ExecutionStatus)
//! - **ports**: abstraction layer (StatusSource, the seam to the remote
//!   service)
//! - **waiter**: the poll-until-terminal loop (ExecutionWaiter)
//! - **error**: error taxonomy (WaitError)
//! - **impls**: in-memory implementation for development and tests

pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;
pub mod waiter;

pub use error::WaitError;
pub use waiter::{
    DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT, ExecutionWaiter, WaitOptions, WaiterConfig,
};

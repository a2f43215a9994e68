//! Impls - implementations of the ports (dev/test use).
//!
//! A client for a real query service belongs in its own crate; this module
//! only carries the in-memory stand-in used by demos and tests.

pub mod inmem_service;

pub use self::inmem_service::{
    ExecutionNotFound, ExecutionPlan, InMemoryQueryService, SimulatedOutcome,
};

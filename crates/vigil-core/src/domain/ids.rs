//! Domain identifiers.
//!
//! Execution ids are assigned by the remote query service, so unlike
//! locally-generated ids they are opaque strings from our point of view.
//! The only invariant we can (and do) enforce is that an id is non-empty.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Returned when an execution id fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("execution id must be a non-empty string")]
pub struct InvalidExecutionId;

/// Identifier of one query execution on the remote service.
///
/// Invariant: non-empty (whitespace-only counts as empty). Constructed via
/// [`ExecutionId::new`] or [`FromStr`], so any `&ExecutionId` a caller hands
/// to the waiter already satisfies it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(String);

impl ExecutionId {
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidExecutionId> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(InvalidExecutionId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ExecutionId {
    type Err = InvalidExecutionId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

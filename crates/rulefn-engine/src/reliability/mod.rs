//! Reliability primitives for rule execution
//!
//! This module provides:
//! - [`ExecutionPolicy`] - retry bound, retry delay and fallback triggers
//! - [`OperationFailure`] / [`FailureKind`] - classified operation failures

mod failure;
mod policy;

pub use failure::{FailureKind, OperationFailure};
pub use policy::ExecutionPolicy;

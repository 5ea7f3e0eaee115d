//! Execution engine
//!
//! - [`resolve`] - pick primary and fallback out of an operation table
//! - [`ResolutionCache`] - resolved tables per rule function type
//! - [`FunctionExecutor`] - bind, retry and fall back

mod cache;
mod executor;
mod resolver;

pub use cache::ResolutionCache;
pub use executor::{ExecutionOutcome, FunctionExecutor, ResultSource};
pub use resolver::{resolve, ResolvedFunction};

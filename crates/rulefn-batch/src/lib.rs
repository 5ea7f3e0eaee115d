//! # Rule Function Batch Runner
//!
//! Executes many rule function invocations through a shared
//! [`FunctionExecutor`](rulefn_engine::FunctionExecutor):
//!
//! - items are split into consecutive segments of [`BatchConfig::segment_size`]
//! - each segment runs sequentially on a blocking thread
//! - at most [`BatchConfig::max_parallel_segments`] segments run at once
//! - a single deadline bounds the whole batch; unfinished items are reported
//!   as [`BatchError::TimedOut`] and abandoned
//!
//! ```ignore
//! let runner = BatchRunner::new(Arc::new(FunctionExecutor::from_env()), BatchConfig::from_env());
//! let report = runner.run(items).await;
//! for (index, result) in report.results.iter().enumerate() { ... }
//! ```

pub mod config;
pub mod error;
pub mod report;
pub mod runner;

pub use config::{BatchConfig, BatchTimeout, DEFAULT_SEGMENT_SIZE};
pub use error::BatchError;
pub use report::{BatchReport, BatchSummary};
pub use runner::{BatchItem, BatchRunner};

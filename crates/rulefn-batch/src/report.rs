//! Batch report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::BatchError;

/// Outcome of one batch, results in input order
#[derive(Debug)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<Result<Value, BatchError>>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Items that produced a value
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    /// Items that failed for a reason other than the deadline
    pub fn failed(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r, Err(err) if !err.is_timed_out()))
            .count()
    }

    /// Items abandoned at the deadline
    pub fn timed_out(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r, Err(BatchError::TimedOut)))
            .count()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Counts without the per-item results
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            batch_id: self.batch_id,
            started_at: self.started_at,
            finished_at: self.finished_at,
            total: self.len(),
            succeeded: self.succeeded(),
            failed: self.failed(),
            timed_out: self.timed_out(),
        }
    }
}

/// Serializable batch counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
}

//! Batch runner
//!
//! Splits a batch into consecutive segments. Each segment runs its items one
//! after another on a blocking thread; a semaphore bounds how many segments
//! run at once. Results flow back over a channel until every item reported
//! or the batch deadline passed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use rulefn_engine::{AnyRuleFunction, FunctionExecutor, ParamMap, RuleFunction};
use serde_json::Value;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::Instant;
use tracing::{debug, error, field, info, instrument, warn, Span};
use uuid::Uuid;

use crate::config::BatchConfig;
use crate::error::BatchError;
use crate::report::BatchReport;

type ItemResult = (usize, Result<Value, BatchError>);

/// One rule function invocation in a batch
#[derive(Clone)]
pub struct BatchItem {
    pub function: Arc<dyn AnyRuleFunction>,
    pub params: ParamMap,
}

impl BatchItem {
    pub fn new(function: Arc<dyn AnyRuleFunction>, params: ParamMap) -> Self {
        Self { function, params }
    }

    /// Wrap a concrete rule function
    pub fn of<F: RuleFunction>(function: F, params: ParamMap) -> Self {
        Self::new(Arc::new(function), params)
    }
}

impl std::fmt::Debug for BatchItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchItem")
            .field("function", &self.function.name())
            .field("params", &self.params)
            .finish()
    }
}

/// Runs batches of rule function invocations
///
/// # Example
///
/// ```ignore
/// use rulefn_batch::{BatchConfig, BatchItem, BatchRunner};
///
/// let runner = BatchRunner::new(
///     Arc::new(FunctionExecutor::default()),
///     BatchConfig::new().with_segment_size(50).with_timeout(Duration::from_secs(5)),
/// );
///
/// let report = runner.run(items).await;
/// println!("{} of {} succeeded", report.succeeded(), report.len());
/// ```
pub struct BatchRunner {
    executor: Arc<FunctionExecutor>,
    config: BatchConfig,
}

impl BatchRunner {
    pub fn new(executor: Arc<FunctionExecutor>, config: BatchConfig) -> Self {
        Self { executor, config }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn executor(&self) -> &Arc<FunctionExecutor> {
        &self.executor
    }

    /// Run `items` and report one result per item, in input order
    ///
    /// Never fails as a whole: engine errors, panics and the deadline are
    /// reported per item.
    #[instrument(skip_all, fields(batch_id = field::Empty, items = items.len()))]
    pub async fn run(&self, items: Vec<BatchItem>) -> BatchReport {
        let batch_id = Uuid::now_v7();
        Span::current().record("batch_id", field::display(batch_id));
        let started_at = Utc::now();
        let deadline = self.config.timeout.duration().map(|d| Instant::now() + d);

        let total = items.len();
        let segments = partition(items, self.config.segment_size.max(1));
        let max_parallel = self
            .config
            .max_parallel_segments
            .unwrap_or(segments.len())
            .max(1);

        info!(
            %batch_id,
            items = total,
            segments = segments.len(),
            max_parallel,
            timeout_ms = ?self.config.timeout.duration().map(|d| d.as_millis()),
            "Starting batch"
        );

        let permits = Arc::new(Semaphore::new(max_parallel));
        let cancelled = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::unbounded_channel::<ItemResult>();

        for (segment_index, segment) in segments.into_iter().enumerate() {
            self.spawn_segment(
                segment_index,
                segment,
                Arc::clone(&permits),
                Arc::clone(&cancelled),
                tx.clone(),
            );
        }
        drop(tx);

        let results = collect(total, rx, deadline).await;
        cancelled.store(true, Ordering::SeqCst);

        let report = BatchReport {
            batch_id,
            started_at,
            finished_at: Utc::now(),
            results,
        };

        info!(
            %batch_id,
            succeeded = report.succeeded(),
            failed = report.failed(),
            timed_out = report.timed_out(),
            elapsed_ms = report.elapsed().num_milliseconds(),
            "Batch finished"
        );

        report
    }

    fn spawn_segment(
        &self,
        segment_index: usize,
        segment: Vec<(usize, BatchItem)>,
        permits: Arc<Semaphore>,
        cancelled: Arc<AtomicBool>,
        tx: mpsc::UnboundedSender<ItemResult>,
    ) {
        let executor = Arc::clone(&self.executor);

        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            if cancelled.load(Ordering::SeqCst) {
                debug!(segment = segment_index, "Batch cancelled before segment started");
                return;
            }

            let indices: Vec<usize> = segment.iter().map(|(index, _)| *index).collect();
            let segment_tx = tx.clone();
            let handle = tokio::task::spawn_blocking(move || {
                run_segment(&executor, segment, &cancelled, &segment_tx)
            });

            if let Err(err) = handle.await {
                error!(segment = segment_index, error = %err, "Batch segment panicked");
                let message = err.to_string();
                // Items that already reported keep their result
                for index in indices {
                    if tx.send((index, Err(BatchError::Panicked(message.clone())))).is_err() {
                        break;
                    }
                }
            }
        });
    }
}

/// Split items into consecutive segments, remembering each item's position
fn partition(items: Vec<BatchItem>, segment_size: usize) -> Vec<Vec<(usize, BatchItem)>> {
    let mut segments = Vec::with_capacity(items.len().div_ceil(segment_size));
    let mut current = Vec::with_capacity(segment_size);

    for (index, item) in items.into_iter().enumerate() {
        current.push((index, item));
        if current.len() == segment_size {
            segments.push(std::mem::replace(&mut current, Vec::with_capacity(segment_size)));
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

/// Run a segment's items in order, stopping once the batch is cancelled or
/// nobody listens anymore
fn run_segment(
    executor: &FunctionExecutor,
    segment: Vec<(usize, BatchItem)>,
    cancelled: &AtomicBool,
    tx: &mpsc::UnboundedSender<ItemResult>,
) {
    for (index, item) in segment {
        if cancelled.load(Ordering::SeqCst) {
            return;
        }
        let result = item
            .function
            .invoke(executor, &item.params)
            .map_err(BatchError::from);
        if tx.send((index, result)).is_err() {
            return;
        }
    }
}

/// Gather results until all `total` items reported, the senders are gone or
/// the deadline passed; missing results become [`BatchError::TimedOut`]
async fn collect(
    total: usize,
    mut rx: mpsc::UnboundedReceiver<ItemResult>,
    deadline: Option<Instant>,
) -> Vec<Result<Value, BatchError>> {
    let mut slots: Vec<Option<Result<Value, BatchError>>> = (0..total).map(|_| None).collect();
    let mut remaining = total;

    while remaining > 0 {
        let received = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(received) => received,
                Err(_) => {
                    warn!(remaining, "Batch deadline passed, abandoning unfinished items");
                    break;
                }
            },
            None => rx.recv().await,
        };

        let Some((index, result)) = received else {
            break;
        };
        if let Some(slot) = slots.get_mut(index) {
            if slot.is_none() {
                *slot = Some(result);
                remaining -= 1;
            }
        }
    }

    slots
        .into_iter()
        .map(|slot| slot.unwrap_or(Err(BatchError::TimedOut)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulefn_engine::{ExecutionPolicy, Operation};
    use serde_json::json;

    struct Noop;

    impl RuleFunction for Noop {
        fn operations() -> Vec<Operation<Self>> {
            vec![Operation::primary("noop", ExecutionPolicy::default()).handler(|_, _| Ok(json!(null)))]
        }
    }

    fn items(count: usize) -> Vec<BatchItem> {
        (0..count).map(|_| BatchItem::of(Noop, ParamMap::new())).collect()
    }

    fn positions(segments: &[Vec<(usize, BatchItem)>]) -> Vec<Vec<usize>> {
        segments
            .iter()
            .map(|segment| segment.iter().map(|(index, _)| *index).collect())
            .collect()
    }

    #[test]
    fn test_partition() {
        assert_eq!(
            positions(&partition(items(7), 3)),
            vec![vec![0, 1, 2], vec![3, 4, 5], vec![6]]
        );
        assert_eq!(positions(&partition(items(4), 4)), vec![vec![0, 1, 2, 3]]);
        assert!(partition(Vec::new(), 10).is_empty());
    }

    #[tokio::test]
    async fn test_collect_fills_missing_with_timed_out() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send((1, Ok(json!("b")))).unwrap();
        tx.send((1, Ok(json!("duplicate")))).unwrap();
        drop(tx);

        let results = collect(3, rx, None).await;
        assert!(results[0].as_ref().unwrap_err().is_timed_out());
        assert_eq!(results[1].as_ref().unwrap(), &json!("b"));
        assert!(results[2].as_ref().unwrap_err().is_timed_out());
    }

    #[tokio::test(start_paused = true)]
    async fn test_collect_stops_at_deadline() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send((0, Ok(json!(1)))).unwrap();

        let deadline = Instant::now() + std::time::Duration::from_millis(50);
        let results = collect(2, rx, Some(deadline)).await;

        assert!(results[0].is_ok());
        assert!(results[1].as_ref().unwrap_err().is_timed_out());
        drop(tx);
    }
}

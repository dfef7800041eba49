//! Bounded-concurrency batch execution.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use futures::{stream::FuturesUnordered, Future, StreamExt};
use tokio::sync::Semaphore;

/// Context provided to each task in a batch.
#[derive(Debug, Clone, Copy)]
pub struct TaskContext {
    /// Item number (1-indexed for display).
    pub item_number: usize,
    /// Total items in this batch.
    pub total_items: usize,
}

/// Execute items concurrently with at most `limit` in flight.
///
/// Results come back in INPUT order, not completion order: the caller
/// is matching outputs to the items that produced them (product listings
/// to keywords). A task error does not abort the batch; the failed
/// item's slot carries the error so the caller can substitute per-item
/// fallbacks.
pub async fn execute_batch<T, F, Fut, R>(
    items: Vec<T>,
    limit: usize,
    task_executor: F,
) -> Vec<Result<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T, TaskContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    let total = items.len();
    let sem = Arc::new(Semaphore::new(limit.max(1)));
    let executor = Arc::new(task_executor);
    let mut tasks = FuturesUnordered::new();

    for (idx, item) in items.into_iter().enumerate() {
        let sem = sem.clone();
        let executor = executor.clone();

        let ctx = TaskContext {
            item_number: idx + 1,
            total_items: total,
        };

        tasks.push(async move {
            let result = async {
                let _permit = sem
                    .acquire()
                    .await
                    .map_err(|_| anyhow!("Semaphore closed"))?;
                executor(item, ctx).await
            }
            .await;
            (idx, result)
        });
    }

    let mut slots: Vec<Option<Result<R>>> = (0..total).map(|_| None).collect();
    while let Some((idx, result)) = tasks.next().await {
        slots[idx] = Some(result);
    }

    slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| Err(anyhow!("task vanished"))))
        .collect()
}

//! Bounded-concurrency dispatch of upload tasks.
//!
//! `run_bounded` starts `min(limit, tasks.len())` workers that share one cursor.
//! Each worker claims the next unclaimed index, awaits the operation, and claims
//! again until the cursor runs past the end. A slow task only holds up the worker
//! running it; the others keep pulling work.
//!
//! Workers are polled together on the calling task (no spawning), so the operation
//! may borrow from the caller. Outcomes are returned in input order regardless of
//! the order in which they complete.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;
use tracing::debug;

/// Runs `op` over every task with at most `limit` operations in flight.
///
/// The returned vector is index-aligned with `tasks`. A failing operation does not
/// stop the others: every task is attempted and every outcome is returned. An empty
/// task list or a `limit` of zero runs nothing and returns an empty vector.
pub async fn run_bounded<'a, T, F, Fut, O>(tasks: &'a [T], limit: usize, op: F) -> Vec<O>
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = O>,
{
    let workers = limit.min(tasks.len());
    if workers == 0 {
        return Vec::new();
    }
    debug!(workers, tasks = tasks.len(), "Starting upload workers");

    let cursor = AtomicUsize::new(0);
    let cursor = &cursor;
    let op = &op;

    let pool = (0..workers).map(move |worker| async move {
        let mut settled = Vec::new();
        loop {
            let index = cursor.fetch_add(1, Ordering::SeqCst);
            let Some(task) = tasks.get(index) else {
                break;
            };
            settled.push((index, op(task).await));
        }
        debug!(worker, completed = settled.len(), "Upload worker finished");
        settled
    });

    // Every index is claimed exactly once, so each slot is written exactly once.
    let mut slots: Vec<Option<O>> = std::iter::repeat_with(|| None).take(tasks.len()).collect();
    for (index, outcome) in join_all(pool).await.into_iter().flatten() {
        slots[index] = Some(outcome);
    }
    slots.into_iter().flatten().collect()
}

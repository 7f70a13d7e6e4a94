//! Worker pool over a shared atomic cursor.
//!
//! `min(concurrency, tasks)` workers each claim the next unclaimed index,
//! run that task to completion and record its result, until the cursor
//! passes the end of the list.

use std::any::Any;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinSet;

use super::result::{TaskError, TaskResult};

struct Collected<T, E, P> {
    results: Vec<Option<TaskResult<T, E>>>,
    completed: usize,
    on_progress: P,
}

struct Shared<F, T, E, P> {
    tasks: Vec<Mutex<Option<F>>>,
    cursor: AtomicUsize,
    state: Mutex<Collected<T, E, P>>,
}

/// A panic in the progress callback poisons the state mutex; the results
/// written so far are still valid, so keep going.
fn lock<V>(m: &Mutex<V>) -> MutexGuard<'_, V> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return (*s).to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "unknown panic payload".to_string()
}

/// Runs `tasks` with at most `concurrency` of them in flight and returns one
/// result per task, in submission order.
///
/// `on_progress(completed, total, result)` is called after every task
/// finishes, in completion order. Calls never overlap: the callback runs
/// under the same lock that records the result. No lock is held while a
/// task is running.
pub async fn run_bounded<F, Fut, T, E, P>(
    tasks: Vec<F>,
    concurrency: usize,
    on_progress: P,
) -> Vec<TaskResult<T, E>>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    P: FnMut(usize, usize, &TaskResult<T, E>) + Send + 'static,
{
    let total = tasks.len();
    if total == 0 {
        return Vec::new();
    }
    let num_workers = concurrency.max(1).min(total);

    let shared = Arc::new(Shared {
        tasks: tasks.into_iter().map(|t| Mutex::new(Some(t))).collect(),
        cursor: AtomicUsize::new(0),
        state: Mutex::new(Collected {
            results: (0..total).map(|_| None).collect(),
            completed: 0,
            on_progress,
        }),
    });

    tracing::debug!(total, workers = num_workers, "starting task pool");

    let mut workers = JoinSet::new();
    for worker_id in 0..num_workers {
        let shared = Arc::clone(&shared);
        workers.spawn(async move { run_worker(worker_id, shared).await });
    }
    while let Some(res) = workers.join_next().await {
        if let Err(e) = res {
            tracing::error!("task pool worker join: {}", e);
        }
    }

    let results = std::mem::take(&mut lock(&shared.state).results);
    results
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| {
                tracing::error!(index, "task slot left empty by a failed worker");
                TaskResult::Failed(TaskError::Panicked(
                    "worker exited before the task ran".to_string(),
                ))
            })
        })
        .collect()
}

async fn run_worker<F, Fut, T, E, P>(worker_id: usize, shared: Arc<Shared<F, T, E, P>>)
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    P: FnMut(usize, usize, &TaskResult<T, E>) + Send + 'static,
{
    let total = shared.tasks.len();
    let mut ran = 0usize;
    loop {
        let index = shared.cursor.fetch_add(1, Ordering::AcqRel);
        if index >= total {
            break;
        }
        let Some(task) = lock(&shared.tasks[index]).take() else {
            continue;
        };

        // Run on its own tokio task so a panic is caught as a JoinError
        // instead of taking the worker down.
        let result = match tokio::spawn(async move { task().await }).await {
            Ok(Ok(value)) => TaskResult::Success(value),
            Ok(Err(e)) => TaskResult::Failed(TaskError::Task(e)),
            Err(join_err) => {
                let msg = match join_err.try_into_panic() {
                    Ok(payload) => panic_message(payload),
                    Err(join_err) => join_err.to_string(),
                };
                tracing::error!(index, "task panicked: {}", msg);
                TaskResult::Failed(TaskError::Panicked(msg))
            }
        };
        ran += 1;
        record(&shared.state, index, total, result);
    }
    tracing::debug!(worker_id, ran, "task pool worker finished");
}

/// Write the result into its slot and report progress under one lock.
fn record<T, E, P>(
    state: &Mutex<Collected<T, E, P>>,
    index: usize,
    total: usize,
    result: TaskResult<T, E>,
)
where
    P: FnMut(usize, usize, &TaskResult<T, E>),
{
    let mut state = lock(state);
    state.completed += 1;
    let completed = state.completed;
    let Collected {
        results,
        on_progress,
        ..
    } = &mut *state;
    let result = results[index].insert(result);
    on_progress(completed, total, &*result);
}

//! Bounded-concurrency task scheduler.
//!
//! Runs an arbitrary list of async tasks with a fixed worker budget. Every
//! task gets exactly one result at its own index; a failing or panicking
//! task is recorded as a failed result and never stops the batch.

mod pool;
mod progress;
mod result;

pub use pool::run_bounded;
pub use progress::ProgressStats;
pub use result::{TaskError, TaskResult};

//! Per-task outcome recorded by the scheduler.

use std::fmt;

/// Why a task produced no payload.
#[derive(Debug)]
pub enum TaskError<E> {
    /// The task returned an error (e.g. the upload exhausted its retries).
    Task(E),
    /// The task panicked or was torn down before finishing; unrelated to
    /// the task's own error contract.
    Panicked(String),
}

impl<E: fmt::Display> fmt::Display for TaskError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::Task(e) => write!(f, "{}", e),
            TaskError::Panicked(msg) => write!(f, "task panicked: {}", msg),
        }
    }
}

impl<E: fmt::Debug + fmt::Display + 'static> std::error::Error for TaskError<E> {}

/// Result slot for one task.
#[derive(Debug)]
pub enum TaskResult<T, E> {
    Success(T),
    Failed(TaskError<E>),
}

impl<T, E> TaskResult<T, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskResult::Success(_))
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            TaskResult::Success(v) => Some(v),
            TaskResult::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&TaskError<E>> {
        match self {
            TaskResult::Success(_) => None,
            TaskResult::Failed(e) => Some(e),
        }
    }
}

impl<T, E: fmt::Display> TaskResult<T, E> {
    pub fn error_message(&self) -> Option<String> {
        self.error().map(|e| e.to_string())
    }
}

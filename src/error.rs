//! Error types for the reconciler.

use thiserror::Error;

/// Errors raised while validating a [`ReconcilerConfig`](crate::ReconcilerConfig).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid max concurrent tasks: {value} (must be > 0)")]
    InvalidMaxConcurrent { value: usize },

    #[error("invalid cache capacity: {value} (must be > 0)")]
    InvalidCacheCapacity { value: usize },
}

impl ConfigError {
    /// Create an invalid concurrency limit error.
    pub fn invalid_max_concurrent(value: usize) -> Self {
        ConfigError::InvalidMaxConcurrent { value }
    }

    /// Create an invalid cache capacity error.
    pub fn invalid_cache_capacity(value: usize) -> Self {
        ConfigError::InvalidCacheCapacity { value }
    }
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Error delivered through a [`TaskHandle`](crate::TaskHandle).
#[derive(Error, Debug, Clone)]
pub enum TaskError<E> {
    /// The submitted operation failed; the inner value is the operation's own
    /// error, delivered verbatim (followers receive a clone of it).
    #[error("task execution failed: {0}")]
    Failed(E),

    /// The reconciler stopped before the task settled.
    #[error("reconciler was shut down before the task settled")]
    Shutdown,
}

impl<E> TaskError<E> {
    /// Check whether this error carries an operation failure.
    pub fn is_failed(&self) -> bool {
        matches!(self, TaskError::Failed(_))
    }

    /// Extract the operation's own error, if any.
    pub fn into_failed(self) -> Option<E> {
        match self {
            TaskError::Failed(error) => Some(error),
            TaskError::Shutdown => None,
        }
    }
}

impl<E: PartialEq> PartialEq for TaskError<E> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TaskError::Failed(a), TaskError::Failed(b)) => a == b,
            (TaskError::Shutdown, TaskError::Shutdown) => true,
            _ => false,
        }
    }
}

impl<E: Eq> Eq for TaskError<E> {}

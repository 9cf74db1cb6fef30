//! Task identity and completion handles.

use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::TaskError;

/// A boxed asynchronous operation submitted to the reconciler.
///
/// The future is lazy: it is not polled until the task is admitted by the
/// scheduling loop, so construction cost is paid at submission but execution
/// only begins once a concurrency slot is free.
pub type TaskFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'static>>;

/// Unique identifier for a submitted task, used for logging and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Generate a new unique task ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One submitted unit of work travelling through the engine.
///
/// Settlement happens exactly once: the `outcome` sender is consumed when the
/// task resolves or rejects, making a second transition unrepresentable.
pub(crate) struct Submission<T, E> {
    pub(crate) id: TaskId,
    pub(crate) key: Option<String>,
    pub(crate) operation: TaskFuture<T, E>,
    pub(crate) outcome: oneshot::Sender<Result<T, E>>,
}

/// Caller-facing completion handle returned by
/// [`Reconciler::submit`](crate::Reconciler::submit).
///
/// Resolves with the operation's value, fails with [`TaskError::Failed`]
/// carrying the operation's error, or fails with [`TaskError::Shutdown`] if
/// the engine stopped before the task settled. Dropping the handle does not
/// cancel the task.
#[derive(Debug)]
pub struct TaskHandle<T, E> {
    outcome: oneshot::Receiver<Result<T, E>>,
}

impl<T, E> TaskHandle<T, E> {
    pub(crate) fn new(outcome: oneshot::Receiver<Result<T, E>>) -> Self {
        Self { outcome }
    }
}

impl<T, E> Future for TaskHandle<T, E> {
    type Output = Result<T, TaskError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().outcome)
            .poll(cx)
            .map(|settled| match settled {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(error)) => Err(TaskError::Failed(error)),
                Err(_) => Err(TaskError::Shutdown),
            })
    }
}

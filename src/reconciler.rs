//! Public handle for submitting tasks to the engine.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::config::ReconcilerConfig;
use crate::error::ConfigResult;
use crate::processor::{Command, Processor};
use crate::task::{Submission, TaskFuture, TaskHandle, TaskId};

/// Snapshot of the engine's internal counters, for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilerStats {
    /// Tasks submitted but not yet admitted.
    pub waiting: usize,
    /// Tasks admitted but not yet settled.
    pub active: usize,
    /// Keys with an executing leader.
    pub in_flight: usize,
    /// Cached results.
    pub cached: usize,
}

/// Bounded-concurrency execution engine for asynchronous tasks.
///
/// Cloning the handle is cheap; all clones feed the same processor. The
/// processor keeps running until every handle is dropped, then drains any
/// remaining work and stops.
///
/// Submitted operations are `Result`-returning futures over a shared value
/// type `T` and error type `E`. Both must be `Clone` so that merged requests
/// and cache hits can observe the same outcome.
pub struct Reconciler<T, E> {
    commands: mpsc::UnboundedSender<Command<T, E>>,
    active: Arc<AtomicUsize>,
}

impl<T, E> Clone for Reconciler<T, E> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            active: Arc::clone(&self.active),
        }
    }
}

impl<T, E> Reconciler<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Create an engine with the default configuration: concurrency limit 2,
    /// caching disabled. Must be called within a Tokio runtime.
    pub fn new() -> Self {
        Self::spawn(ReconcilerConfig::default())
    }

    /// Create an engine with a custom configuration. Must be called within a
    /// Tokio runtime.
    pub fn with_config(config: ReconcilerConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::spawn(config))
    }

    fn spawn(config: ReconcilerConfig) -> Self {
        let active = Arc::new(AtomicUsize::new(0));
        let (commands, receiver) = mpsc::unbounded_channel();
        let processor = Processor::new(config, receiver, Arc::clone(&active));
        tokio::spawn(processor.run());
        Self { commands, active }
    }

    /// Submit an operation without an identity key: it is never deduplicated
    /// and never cached. The returned handle resolves once the operation
    /// settles; execution begins when a concurrency slot frees up.
    pub fn submit<F>(&self, operation: F) -> TaskHandle<T, E>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.submit_inner(None, Box::pin(operation))
    }

    /// Submit an operation under an identity key. Concurrent submissions
    /// sharing the key are merged onto the executing leader, and (with
    /// caching enabled) a successful result is reused by later submissions.
    pub fn submit_keyed<F>(&self, key: impl Into<String>, operation: F) -> TaskHandle<T, E>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.submit_inner(Some(key.into()), Box::pin(operation))
    }

    fn submit_inner(&self, key: Option<String>, operation: TaskFuture<T, E>) -> TaskHandle<T, E> {
        let (tx, rx) = oneshot::channel();
        let submission = Submission {
            id: TaskId::new(),
            key,
            operation,
            outcome: tx,
        };
        // If the processor is gone the dropped sender fails the handle with
        // `TaskError::Shutdown`.
        let _ = self.commands.send(Command::Submit(submission));
        TaskHandle::new(rx)
    }

    /// Drop every cached result immediately. Waiting and in-flight tasks are
    /// unaffected.
    pub fn clear_cache(&self) {
        let _ = self.commands.send(Command::ClearCache);
    }

    /// Number of tasks currently admitted but not yet settled.
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Snapshot of the engine's counters. Returns an empty snapshot if the
    /// processor has already stopped.
    pub async fn stats(&self) -> ReconcilerStats {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::Stats(tx)).is_err() {
            return ReconcilerStats::default();
        }
        rx.await.unwrap_or_default()
    }

    /// Cached keys in eviction order, oldest first. Empty when caching is
    /// disabled or the processor has stopped.
    pub async fn cached_keys(&self) -> Vec<String> {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::CachedKeys(tx)).is_err() {
            return Vec::new();
        }
        rx.await.unwrap_or_default()
    }
}

impl<T, E> Default for Reconciler<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

//! Single-owner scheduling loop driving admission, deduplication and caching.
//!
//! The processor is the only owner of the engine's mutable state. It reacts
//! to two kinds of events: commands from [`Reconciler`](crate::Reconciler)
//! handles and settlements of running operations. Because both arrive through
//! one `select!` loop, no synchronization is needed anywhere else.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use crate::cache::ResultCache;
use crate::config::ReconcilerConfig;
use crate::reconciler::ReconcilerStats;
use crate::task::{Submission, TaskId};

/// Messages accepted by the processor.
pub(crate) enum Command<T, E> {
    Submit(Submission<T, E>),
    ClearCache,
    Stats(oneshot::Sender<ReconcilerStats>),
    CachedKeys(oneshot::Sender<Vec<String>>),
}

/// Outcome of a leader's execution, reported back into the loop.
struct Settled<T, E> {
    id: TaskId,
    key: Option<String>,
    result: Result<T, E>,
    outcome: oneshot::Sender<Result<T, E>>,
}

type SettlementFuture<T, E> = Pin<Box<dyn Future<Output = Settled<T, E>> + Send + 'static>>;

pub(crate) struct Processor<T, E> {
    commands: mpsc::UnboundedReceiver<Command<T, E>>,
    /// Tasks not yet admitted, in submission order.
    waiting: VecDeque<Submission<T, E>>,
    /// Leader operations currently being awaited.
    running: FuturesUnordered<SettlementFuture<T, E>>,
    /// Key -> follower senders attached to the executing leader. An entry
    /// exists only while the leader is unsettled.
    in_flight: HashMap<String, Vec<oneshot::Sender<Result<T, E>>>>,
    cache: Option<ResultCache<T>>,
    max_concurrent: usize,
    /// Admitted-but-unsettled count; never exceeds `max_concurrent`.
    active: usize,
    /// Mirror of `active` readable from handles without a round trip.
    active_gauge: Arc<AtomicUsize>,
    /// Cache trimming is deferred to the end of the current event, after the
    /// whole settlement batch has updated the recency stack.
    trim_scheduled: bool,
    closed: bool,
}

impl<T, E> Processor<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    pub(crate) fn new(
        config: ReconcilerConfig,
        commands: mpsc::UnboundedReceiver<Command<T, E>>,
        active_gauge: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            commands,
            waiting: VecDeque::new(),
            running: FuturesUnordered::new(),
            in_flight: HashMap::new(),
            cache: config
                .cache
                .map(|policy| ResultCache::new(policy.strategy, policy.capacity)),
            max_concurrent: config.max_concurrent,
            active: 0,
            active_gauge,
            trim_scheduled: false,
            closed: false,
        }
    }

    /// Event loop. Exits once every handle is dropped and all admitted work
    /// has settled; queued tasks are drained first, never stranded.
    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv(), if !self.closed => match command {
                    Some(command) => self.on_command(command),
                    None => self.closed = true,
                },
                Some(settled) = self.running.next() => self.on_settled(settled),
                else => break,
            }

            if self.trim_scheduled {
                self.trim_scheduled = false;
                if let Some(cache) = &mut self.cache {
                    cache.trim();
                }
            }
        }
        debug_assert!(self.waiting.is_empty());
        debug!("processor stopped");
    }

    fn on_command(&mut self, command: Command<T, E>) {
        match command {
            Command::Submit(submission) => {
                trace!(id = %submission.id, key = ?submission.key, "task enqueued");
                self.waiting.push_back(submission);
                self.pump();
            }
            Command::ClearCache => {
                if let Some(cache) = &mut self.cache {
                    debug!(dropped = cache.len(), "cache cleared");
                    cache.clear();
                }
            }
            Command::Stats(tx) => {
                let _ = tx.send(ReconcilerStats {
                    waiting: self.waiting.len(),
                    active: self.active,
                    in_flight: self.in_flight.len(),
                    cached: self.cache.as_ref().map_or(0, ResultCache::len),
                });
            }
            Command::CachedKeys(tx) => {
                let _ = tx.send(self.cache.as_ref().map_or_else(Vec::new, ResultCache::keys));
            }
        }
    }

    /// Admission loop: dequeue waiting tasks while concurrency slots are
    /// free. Every dequeued task counts against the limit until it settles,
    /// cache hits and followers included.
    fn pump(&mut self) {
        while self.active < self.max_concurrent {
            let Some(task) = self.waiting.pop_front() else {
                break;
            };
            self.active += 1;
            self.active_gauge.store(self.active, Ordering::Relaxed);
            self.admit(task);
        }
    }

    /// Route an admitted task to the cache-hit, follower, or leader path.
    fn admit(&mut self, task: Submission<T, E>) {
        if let Some(key) = task.key.clone() {
            if let Some(value) = self.cache.as_ref().and_then(|cache| cache.get(&key)) {
                trace!(id = %task.id, %key, "cache hit");
                let _ = task.outcome.send(Ok(value));
                self.settle_bookkeeping(Some(&key));
                return;
            }
            match self.in_flight.entry(key) {
                Entry::Occupied(mut leader) => {
                    // A leader is already executing this key; merge onto it.
                    trace!(id = %task.id, key = %leader.key(), "merged onto in-flight leader");
                    leader.get_mut().push(task.outcome);
                    return;
                }
                Entry::Vacant(entry) => {
                    entry.insert(Vec::new());
                }
            }
        }

        let Submission {
            id,
            key,
            operation,
            outcome,
        } = task;
        trace!(%id, key = ?key, "task started");
        self.running.push(Box::pin(async move {
            let result = operation.await;
            Settled {
                id,
                key,
                result,
                outcome,
            }
        }));
    }

    /// A leader settled: deliver its outcome to the caller and every
    /// follower, cache successful keyed results, then re-run admission.
    fn on_settled(&mut self, settled: Settled<T, E>) {
        let Settled {
            id,
            key,
            result,
            outcome,
        } = settled;

        let followers = key
            .as_ref()
            .and_then(|key| self.in_flight.remove(key))
            .unwrap_or_default();

        match &result {
            Ok(value) => {
                debug!(%id, key = ?key, followers = followers.len(), "task resolved");
                if let (Some(key), Some(cache)) = (&key, &mut self.cache) {
                    cache.insert(key.clone(), value.clone());
                }
            }
            Err(_) => {
                // Failures are never cached; each follower gets a clone of
                // the identical error.
                debug!(%id, key = ?key, followers = followers.len(), "task rejected");
            }
        }

        let _ = outcome.send(result.clone());
        self.settle_bookkeeping(key.as_deref());
        for follower in followers {
            let _ = follower.send(result.clone());
            self.settle_bookkeeping(key.as_deref());
        }
        self.pump();
    }

    /// Completion hook, run exactly once per settled task: release the
    /// concurrency slot and record the completion for eviction ordering.
    fn settle_bookkeeping(&mut self, key: Option<&str>) {
        self.active -= 1;
        self.active_gauge.store(self.active, Ordering::Relaxed);
        if let (Some(key), Some(cache)) = (key, &mut self.cache) {
            cache.record_completion(key);
            self.trim_scheduled = true;
        }
    }
}

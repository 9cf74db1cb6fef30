//! Reconciler - bounded-concurrency engine for asynchronous tasks
//!
//! A small execution engine that solves three coupled problems:
//! - limiting how many asynchronous operations are in progress at once,
//! - coalescing concurrent requests that share an identity key, so the same
//!   work is never performed twice simultaneously (leader/follower merging),
//! - optionally caching successful results under a size-bounded FIFO or LRU
//!   eviction policy, so repeated requests skip execution entirely.
//!
//! All bookkeeping lives inside a single processor task; submissions and
//! settlements are the only events that mutate it, so no locking is needed.
//!
//! # Example
//!
//! ```rust
//! use reconciler::{CachePolicy, Reconciler, ReconcilerConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = ReconcilerConfig::new()
//!     .with_max_concurrent(4)
//!     .unwrap()
//!     .with_cache(CachePolicy::lru(16));
//! let reconciler = Reconciler::<String, String>::with_config(config).unwrap();
//!
//! let first = reconciler.submit_keyed("greeting", async { Ok("hello".to_string()) });
//! let second = reconciler.submit_keyed("greeting", async { Ok("ignored".to_string()) });
//!
//! // The second request coalesces onto the first: one execution, one value.
//! assert_eq!(first.await.unwrap(), "hello");
//! assert_eq!(second.await.unwrap(), "hello");
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
mod processor;
mod reconciler;
pub mod task;

pub use cache::EvictionStrategy;
pub use config::{CachePolicy, ReconcilerConfig};
pub use error::{ConfigError, ConfigResult, TaskError};
pub use reconciler::{Reconciler, ReconcilerStats};
pub use task::{TaskFuture, TaskHandle, TaskId};

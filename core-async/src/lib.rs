//! Async runtime abstraction for the playback session core.
//!
//! Every core-* crate depends on this crate instead of reaching for Tokio
//! directly. It re-exports the task, time and synchronization primitives the
//! session layer is built on, plus the cancellation scope used to tie command
//! and collector work to the lifetime of its owner.
//!
//! # Modules
//!
//! - `task`: Task spawning and join handles
//! - `time`: Sleep, timeouts and wall-clock helpers
//! - `sync`: Channels, locks, `Notify` and `CancellationToken`
//! - `runtime`: Runtime construction and `block_on`
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::CancellationToken;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     let scope = CancellationToken::new();
//!     let child = scope.child_token();
//!
//!     let handle = core_async::spawn(async move {
//!         core_async::select! {
//!             _ = child.cancelled() => false,
//!             _ = sleep(Duration::from_secs(1)) => true,
//!         }
//!     });
//!
//!     scope.cancel();
//!     assert!(!handle.await.unwrap());
//! }
//! ```

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};

/// Waits on multiple branches and returns when the first one completes.
pub use tokio::select;

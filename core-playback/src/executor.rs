//! Explicit execution context for controller and collector tasks.
//!
//! Fan-out and polling tasks run on the runtime captured in [`Spawner`];
//! nothing assumes a particular caller thread.

use crate::error::{PlaybackError, Result};
use core_async::runtime::{self, Handle};
use core_async::task::JoinHandle;
use std::future::Future;

/// Spawns background work on a captured runtime handle.
#[derive(Clone, Debug)]
pub struct Spawner {
    handle: Handle,
}

impl Spawner {
    /// Capture the runtime driving the calling thread.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::NoRuntime`] outside a Tokio runtime.
    pub fn current() -> Result<Self> {
        runtime::current()
            .map(Self::with_handle)
            .ok_or(PlaybackError::NoRuntime)
    }

    /// Spawn onto a specific runtime.
    pub fn with_handle(handle: Handle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }
}

//! # Listener Fan-out
//!
//! Thread-safe listener sets with snapshot dispatch. A listener may
//! unregister itself (or others) while being notified; the in-flight
//! dispatch keeps using the snapshot it started with.

use bridge_traits::same_instance;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Ordered set of listeners, deduplicated by instance identity.
pub struct ListenerRegistry<L: ?Sized> {
    listeners: Mutex<Vec<Arc<L>>>,
}

impl<L: ?Sized> ListenerRegistry<L> {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Add a listener. Returns `false` if the same instance is already
    /// registered.
    pub fn register(&self, listener: Arc<L>) -> bool {
        let mut listeners = self.listeners.lock();
        if listeners.iter().any(|existing| same_instance(existing, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unregister(&self, listener: &Arc<L>) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|existing| !same_instance(existing, listener));
        listeners.len() != before
    }

    pub fn contains(&self, listener: &Arc<L>) -> bool {
        self.listeners
            .lock()
            .iter()
            .any(|existing| same_instance(existing, listener))
    }

    /// Copy of the current listener list, in registration order.
    pub fn snapshot(&self) -> Vec<Arc<L>> {
        self.listeners.lock().clone()
    }

    /// Invoke `notify` for every listener registered when dispatch began.
    ///
    /// The internal lock is not held while listeners run.
    pub fn dispatch(&self, mut notify: impl FnMut(&L)) {
        for listener in self.snapshot() {
            notify(&listener);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    /// Remove every listener and return them.
    pub fn clear(&self) -> Vec<Arc<L>> {
        std::mem::take(&mut *self.listeners.lock())
    }
}

impl<L: ?Sized> Default for ListenerRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> fmt::Debug for ListenerRegistry<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .finish()
    }
}

// ============================================================================
// Change Notifications
// ============================================================================

/// Notified when the current value of `T` is replaced.
///
/// `old` is `None` for the first installation.
pub trait OnChanged<T: ?Sized>: Send + Sync {
    fn on_changed(&self, old: Option<&Arc<T>>, new: &Arc<T>);
}

/// Adapts a closure into an [`OnChanged`] listener.
pub struct ChangedFn<F>(pub F);

impl<T, F> OnChanged<T> for ChangedFn<F>
where
    T: ?Sized,
    F: Fn(Option<&Arc<T>>, &Arc<T>) + Send + Sync,
{
    fn on_changed(&self, old: Option<&Arc<T>>, new: &Arc<T>) {
        (self.0)(old, new)
    }
}

/// Wrap a closure as a shareable change listener.
pub fn on_changed<T, F>(f: F) -> Arc<dyn OnChanged<T>>
where
    T: ?Sized + 'static,
    F: Fn(Option<&Arc<T>>, &Arc<T>) + Send + Sync + 'static,
{
    Arc::new(ChangedFn(f))
}

//! Marker traits that keep trait bounds aligned with the threading guarantees
//! the session core relies on.
//!
//! Engine handles, listeners and log sinks are shared freely across async
//! tasks, so every bridge trait requires `Send + Sync`. The helper traits below
//! keep those bounds in one place.

use std::sync::Arc;

/// Marker trait for bridge objects shared across tasks.
pub trait PlatformSendSync: Send + Sync {}

impl<T> PlatformSendSync for T where T: Send + Sync + ?Sized {}

/// Marker trait for values moved into spawned tasks.
pub trait PlatformSend: Send {}

impl<T> PlatformSend for T where T: Send + ?Sized {}

/// Returns `true` when both handles point at the same allocation.
///
/// Engine objects are compared by instance, never by value. Only the data
/// address is compared, so two trait objects created through different vtables
/// still match when they wrap the same value.
pub fn same_instance<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named {
        fn name(&self) -> &str;
    }

    struct Fixed(&'static str);

    impl Named for Fixed {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn same_instance_compares_allocation() {
        let a: Arc<dyn Named> = Arc::new(Fixed("a"));
        let a2 = Arc::clone(&a);
        let other: Arc<dyn Named> = Arc::new(Fixed("a"));

        assert!(same_instance(&a, &a2));
        assert!(!same_instance(&a, &other));
        assert_eq!(a.name(), other.name());
    }
}

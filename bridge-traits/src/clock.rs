//! Injectable time source.
//!
//! Engines that extrapolate playback position from wall-clock time read it
//! through [`Clock`] so tests can drive time deterministically.

use chrono::{DateTime, Utc};

use crate::platform::PlatformSendSync;

/// Time source trait.
pub trait Clock: PlatformSendSync {
    /// Get current UTC time
    fn now(&self) -> DateTime<Utc>;

    /// Get current Unix timestamp in milliseconds
    fn unix_timestamp_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// System clock implementation using actual system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

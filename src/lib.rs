//! Workspace umbrella crate.
//!
//! Re-exports the playback session core so host applications can depend on
//! `playback-workspace` and enable the documented features without wiring
//! each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_playback as playback;
#[cfg(feature = "desktop-shims")]
pub use core_service as service;

#[cfg(feature = "desktop-shims")]
pub use core_service::{PlaybackService, ServiceEvent, ServiceState};

//! Core service host for the playback session core.
//!
//! This crate wires the lifecycle state machine, the session manager, the
//! controller presenter and the event bus into a single [`PlaybackService`]
//! that a platform host drives from its own service callbacks. Desktop hosts
//! typically enable the `desktop-shims` feature, which re-exports the
//! in-memory engine from `bridge-desktop`.
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> core_service::Result<()> {
//! use core_runtime::config::CoreConfig;
//! use core_service::{PlaybackService, ServiceEvent, ServiceState};
//!
//! let service = PlaybackService::builder(CoreConfig::default()).build()?;
//! service.on_event(ServiceEvent::OnCreate);
//! service.on_event(ServiceEvent::OnStartCommand);
//! assert_eq!(service.service_state(), ServiceState::Started);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod lifecycle;
pub mod service;

pub use error::{CoreError, Result};
pub use lifecycle::{LifecycleError, MediaState, OwnerId, ServiceEvent, ServiceState, StateRegistry};
pub use service::{PlaybackService, PlaybackServiceBuilder};

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop::{LocalPlayer, LocalSession, MediaItem};

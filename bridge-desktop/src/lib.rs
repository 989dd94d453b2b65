//! # Desktop Bridge Implementations
//!
//! Default implementations of the bridge traits for hosts without a native
//! playback engine (desktop tools, demos, integration tests).
//!
//! ## Overview
//!
//! - `LocalPlayer`: queue-backed [`Player`](bridge_traits::Player) that
//!   extrapolates position from a clock and emits the standard event set
//! - `LocalSession`: [`MediaSession`](bridge_traits::MediaSession) carrying a
//!   swappable player
//! - `ManualClock`: deterministic [`Clock`](bridge_traits::Clock) for tests
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{LocalPlayer, LocalSession, MediaItem};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let player = Arc::new(LocalPlayer::new());
//! player.set_queue(vec![MediaItem::new("a", Some(Duration::from_secs(200)))], 0)?;
//! let session = Arc::new(LocalSession::new("FLAMM", player.clone()));
//! ```

mod clock;
mod player;
mod session;

pub use clock::ManualClock;
pub use player::{LocalPlayer, MediaItem};
pub use session::LocalSession;

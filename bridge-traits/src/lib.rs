//! # Host Bridge Traits
//!
//! Contract between the playback session core and the host that owns the
//! actual playback engine.
//!
//! ## Traits
//!
//! ### Playback
//! - [`Player`](playback::Player) - Transport primitives of the host engine
//! - [`PlayerListener`](playback::PlayerListener) - Engine event callbacks
//! - [`MediaSession`](session::MediaSession) - Logical session carrying the current player
//!
//! ### Utilities
//! - [`Clock`](clock::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ In-memory engine |
//! | Mobile   | Host application    | 📋 Injected by host |
//!
//! ## Error Handling
//!
//! Engine failures are reported as [`BridgeError`](error::BridgeError). A
//! command the engine refuses (out-of-range seek, released player) is a
//! `Rejected`, `InvalidArgument` or `Released` error; the core turns those into
//! unsuccessful request results rather than propagating them.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so engine handles can be shared
//! across async tasks.
//!
//! ## Example
//!
//! ```ignore
//! use bridge_traits::playback::{PlayerEvent, PlayerListener};
//!
//! struct PrintingListener;
//!
//! impl PlayerListener for PrintingListener {
//!     fn on_event(&self, event: &PlayerEvent) {
//!         println!("engine event: {event:?}");
//!     }
//! }
//! ```

pub mod clock;
pub mod error;
pub mod logging;
pub mod platform;
pub mod playback;
pub mod session;

pub use error::BridgeError;

pub use clock::{Clock, SystemClock};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use platform::same_instance;
pub use playback::{
    EngineState, PlaybackProgress, PlaybackQueue, Player, PlayerEvent, PlayerId, PlayerListener,
    PlayerProperties, RepeatMode, ShuffleMode,
};
pub use session::{MediaSession, SessionId};

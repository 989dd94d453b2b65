//! # Event Bus System
//!
//! Provides an event-driven channel for the playback session core using
//! `tokio::sync::broadcast`. Hosts subscribe to it to mirror lifecycle, session
//! and command activity into their own UI or diagnostics without holding a
//! controller.
//!
//! ## Overview
//!
//! - **Event Types**: strongly-typed enums per domain (service, session, playback)
//! - **EventBus**: central broadcast channel for publishing events
//! - **EventStream**: wrapper for consuming events with filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐   emit    ┌───────────┐
//! │ StateRegistry  ├──────────>│           │
//! └────────────────┘           │           │   subscribe   ┌────────────┐
//! ┌────────────────┐   emit    │ EventBus  ├──────────────>│ Subscriber │
//! │ SessionManager ├──────────>│ (broadcast│               └────────────┘
//! └────────────────┘           │  channel) │
//! ┌────────────────┐   emit    │           │
//! │ Controllers    ├──────────>│           │
//! └────────────────┘           └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, SessionEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Session(SessionEvent::Released {
//!         session_id: "FLAMM".to_string(),
//!     }))
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert!(matches!(event, CoreEvent::Session(_)));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: subscriber was too slow and missed `n` events.
//!   Non-fatal; the subscriber keeps receiving new events.
//! - **`RecvError::Closed`**: all senders have been dropped, which means shutdown.
//!
//! Emitting with no subscribers returns an error that publishers ignore.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Hosting service lifecycle and connection state
    Service(ServiceLifecycleEvent),
    /// Session and player swaps
    Session(SessionEvent),
    /// Controller activity
    Playback(PlaybackEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Service(e) => e.description(),
            CoreEvent::Session(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Service(ServiceLifecycleEvent::ConnectionError { .. }) => {
                EventSeverity::Error
            }
            CoreEvent::Playback(PlaybackEvent::CommandCompleted { success: false, .. }) => {
                EventSeverity::Warning
            }
            CoreEvent::Service(ServiceLifecycleEvent::StateChanged { .. }) => EventSeverity::Info,
            CoreEvent::Session(SessionEvent::SessionChanged { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Service Events
// ============================================================================

/// Events emitted by the hosting service state machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ServiceLifecycleEvent {
    /// Lifecycle state moved one rank.
    StateChanged {
        /// Lifecycle callback that caused the transition.
        trigger: String,
        from: String,
        to: String,
    },
    /// Session connection state changed.
    MediaStateChanged { from: String, to: String },
    /// The connection entered its terminal error state.
    ConnectionError { message: String },
}

impl ServiceLifecycleEvent {
    fn description(&self) -> &str {
        match self {
            ServiceLifecycleEvent::StateChanged { .. } => "Service state changed",
            ServiceLifecycleEvent::MediaStateChanged { .. } => "Media connection state changed",
            ServiceLifecycleEvent::ConnectionError { .. } => "Media connection failed",
        }
    }
}

// ============================================================================
// Session Events
// ============================================================================

/// Events emitted by the session registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// A new session became current.
    SessionChanged {
        old_session_id: Option<String>,
        new_session_id: String,
    },
    /// The current session switched to another player instance.
    PlayerChanged {
        session_id: String,
        old_player_id: Option<String>,
        new_player_id: String,
    },
    /// The registry released its session and player.
    Released { session_id: String },
}

impl SessionEvent {
    fn description(&self) -> &str {
        match self {
            SessionEvent::SessionChanged { .. } => "Session changed",
            SessionEvent::PlayerChanged { .. } => "Session player changed",
            SessionEvent::Released { .. } => "Session released",
        }
    }
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events emitted by controllers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    ControllerCreated {
        session_id: String,
        controller_id: String,
    },
    ControllerDisposed {
        session_id: String,
        controller_id: String,
        /// Observers torn down together with the controller.
        observers: usize,
    },
    /// A transport command finished.
    CommandCompleted {
        session_id: String,
        controller_id: String,
        command: String,
        success: bool,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::ControllerCreated { .. } => "Controller created",
            PlaybackEvent::ControllerDisposed { .. } => "Controller disposed",
            PlaybackEvent::CommandCompleted { success: true, .. } => "Command succeeded",
            PlaybackEvent::CommandCompleted { success: false, .. } => "Command failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus yields another publisher on the same channel. Each
/// `subscribe()` creates an independent receiver; past events are not
/// replayed.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per
    /// subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` that skips events failing a filter.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let sessions = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Session(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive a matching event without blocking.
    ///
    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

//! # Service Lifecycle State Machine
//!
//! Tracks the hosting service's lifecycle and the media session connection
//! state, rejecting illegal jumps and repeated transitions.
//!
//! ## Service lifecycle
//!
//! ```text
//! Nothing → Initialized → Created → Started → Foreground
//!                                      ↑          ↓
//!                                      │        Paused → Stopped → Destroyed
//!                                      └──────────────────┘
//! ```
//!
//! Ranks climb on the way up (`Initialized = 0` .. `Foreground = 3`) and
//! re-descend on the way down (`Paused = 2`, `Stopped = 1`, `Destroyed = 0`).
//! Every transition after initialization must move exactly one rank.
//!
//! ## Media connection
//!
//! ```text
//! Nothing → Initialized → Connecting → Connected ⇄ Disconnected
//!                              ↑____________|___________|
//! any non-terminal state → Error { cause, message }   (terminal)
//! ```
//!
//! Several clients may connect to the same session, so re-entering
//! `Connecting`, `Connected` or `Disconnected` is accepted as a no-op.
//!
//! ## Usage
//!
//! ```
//! use core_service::lifecycle::{OwnerId, ServiceEvent, ServiceState, StateRegistry};
//!
//! let owner = OwnerId::new();
//! let states = StateRegistry::new();
//! states.try_on_event(owner, ServiceEvent::OnInitialize).unwrap();
//! states.try_on_event(owner, ServiceEvent::OnCreate).unwrap();
//! assert_eq!(states.state(), ServiceState::Created);
//!
//! // Created -> Foreground skips a rank
//! assert!(states.try_on_event(owner, ServiceEvent::OnForeground).is_err());
//! ```

use core_async::sync::watch;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

// ============================================================================
// Errors
// ============================================================================

/// Illegal lifecycle or media state transition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("State updated multiple times: {0}")]
    Repeated(ServiceState),

    #[error("State jump from {from} to {to}")]
    Jump { from: ServiceState, to: ServiceState },

    #[error("Lifecycle already initialized, current state {0}")]
    AlreadyInitialized(ServiceState),

    #[error("Lifecycle has no owner yet, cannot enter {0}")]
    Unowned(ServiceState),

    #[error("Lifecycle owned by {expected}, attempt by {actual}")]
    OwnerMismatch { expected: OwnerId, actual: OwnerId },

    #[error("{0} is not a valid transition target")]
    InvalidTarget(String),

    #[error("Media state updated multiple times: {0}")]
    MediaRepeated(String),

    #[error("Media state cannot change from {from} to {to}")]
    MediaTransition { from: String, to: String },

    #[error("Media state is terminal: {0}")]
    MediaTerminal(String),
}

pub type Result<T> = std::result::Result<T, LifecycleError>;

// ============================================================================
// Owner identity
// ============================================================================

/// Identity of the component driving the lifecycle. Pinned on initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(Uuid);

impl OwnerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Service State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Nothing,
    Initialized,
    Created,
    Started,
    Foreground,
    Paused,
    Stopped,
    Destroyed,
}

impl ServiceState {
    /// Numeric rank; the descending half reuses the ascending ranks.
    pub fn rank(self) -> i8 {
        match self {
            ServiceState::Nothing => -1,
            ServiceState::Initialized => 0,
            ServiceState::Created => 1,
            ServiceState::Started => 2,
            ServiceState::Foreground => 3,
            ServiceState::Paused => 2,
            ServiceState::Stopped => 1,
            ServiceState::Destroyed => 0,
        }
    }

    pub fn at_least(self, that: ServiceState) -> bool {
        self.rank() >= that.rank()
    }

    pub fn at_most(self, that: ServiceState) -> bool {
        self.rank() <= that.rank()
    }

    /// `self` is exactly one rank above `that`.
    pub fn up_from(self, that: ServiceState) -> bool {
        self.rank() == that.rank() + 1
    }

    /// `self` is exactly one rank below `that`.
    pub fn down_from(self, that: ServiceState) -> bool {
        self.rank() == that.rank() - 1
    }

    pub fn is_foreground(self) -> bool {
        self == ServiceState::Foreground
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceState::Nothing => "nothing",
            ServiceState::Initialized => "initialized",
            ServiceState::Created => "created",
            ServiceState::Started => "started",
            ServiceState::Foreground => "foreground",
            ServiceState::Paused => "paused",
            ServiceState::Stopped => "stopped",
            ServiceState::Destroyed => "destroyed",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Service Events
// ============================================================================

/// Host lifecycle callbacks, each mapped to a target [`ServiceState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceEvent {
    OnInitialize,
    OnCreate,
    OnStartCommand,
    OnBind,
    OnForeground,
    OnPause,
    OnStop,
    OnDestroy,
}

impl ServiceEvent {
    pub fn target(self) -> ServiceState {
        match self {
            ServiceEvent::OnInitialize => ServiceState::Initialized,
            ServiceEvent::OnCreate => ServiceState::Created,
            ServiceEvent::OnStartCommand | ServiceEvent::OnBind => ServiceState::Started,
            ServiceEvent::OnForeground => ServiceState::Foreground,
            ServiceEvent::OnPause => ServiceState::Paused,
            ServiceEvent::OnStop => ServiceState::Stopped,
            ServiceEvent::OnDestroy => ServiceState::Destroyed,
        }
    }

    /// Start commands may arrive repeatedly; only the first one after
    /// creation moves the lifecycle.
    fn starts_only_from_created(self) -> bool {
        matches!(self, ServiceEvent::OnStartCommand)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceEvent::OnInitialize => "on_initialize",
            ServiceEvent::OnCreate => "on_create",
            ServiceEvent::OnStartCommand => "on_start_command",
            ServiceEvent::OnBind => "on_bind",
            ServiceEvent::OnForeground => "on_foreground",
            ServiceEvent::OnPause => "on_pause",
            ServiceEvent::OnStop => "on_stop",
            ServiceEvent::OnDestroy => "on_destroy",
        }
    }
}

impl fmt::Display for ServiceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Media State
// ============================================================================

/// Connection state of the media session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MediaState {
    Nothing,
    Initialized,
    Connecting,
    Connected,
    Disconnected,
    /// Terminal. Carries the failure instead of crashing the host.
    Error { cause: String, message: String },
}

impl MediaState {
    pub fn error(cause: impl fmt::Display, message: impl Into<String>) -> Self {
        MediaState::Error {
            cause: cause.to_string(),
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MediaState::Error { .. })
    }

    /// States driven by individual client connections.
    fn is_client_state(&self) -> bool {
        matches!(
            self,
            MediaState::Connecting | MediaState::Connected | MediaState::Disconnected
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaState::Nothing => "nothing",
            MediaState::Initialized => "initialized",
            MediaState::Connecting => "connecting",
            MediaState::Connected => "connected",
            MediaState::Disconnected => "disconnected",
            MediaState::Error { .. } => "error",
        }
    }

    fn validate_transition(&self, to: &MediaState) -> Result<()> {
        if self.is_terminal() {
            return Err(LifecycleError::MediaTerminal(self.to_string()));
        }
        if self == to {
            if self.is_client_state() {
                return Ok(());
            }
            return Err(LifecycleError::MediaRepeated(to.to_string()));
        }

        let valid = match (self, to) {
            (_, MediaState::Nothing) => false,
            (_, MediaState::Error { .. }) => true,

            (MediaState::Nothing, MediaState::Initialized) => true,
            (MediaState::Initialized, MediaState::Connecting) => true,

            // From Connecting
            (MediaState::Connecting, MediaState::Connected) => true,
            (MediaState::Connecting, MediaState::Disconnected) => true,

            // Another controller connects
            (MediaState::Connected, MediaState::Connecting) => true,
            (MediaState::Disconnected, MediaState::Connecting) => true,

            (MediaState::Connected, MediaState::Disconnected) => true,
            // One client left while another was still connecting
            (MediaState::Disconnected, MediaState::Connected) => true,
            _ => false,
        };

        if !valid {
            if *to == MediaState::Nothing {
                return Err(LifecycleError::InvalidTarget(to.to_string()));
            }
            return Err(LifecycleError::MediaTransition {
                from: self.to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for MediaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaState::Error { message, .. } => write!(f, "error({})", message),
            other => f.write_str(other.as_str()),
        }
    }
}

// ============================================================================
// State Registry
// ============================================================================

struct Current {
    owner: Option<OwnerId>,
    state: ServiceState,
    media: MediaState,
}

/// Holds both state machines and publishes every change on `watch` channels.
pub struct StateRegistry {
    current: Mutex<Current>,
    service_event: watch::Sender<ServiceEvent>,
    service_state: watch::Sender<ServiceState>,
    media_state: watch::Sender<MediaState>,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(Current {
                owner: None,
                state: ServiceState::Nothing,
                media: MediaState::Nothing,
            }),
            service_event: watch::Sender::new(ServiceEvent::OnInitialize),
            service_state: watch::Sender::new(ServiceState::Nothing),
            media_state: watch::Sender::new(MediaState::Nothing),
        }
    }

    /// Apply a lifecycle event on behalf of `owner` and return the resulting
    /// state.
    ///
    /// `OnStartCommand` received outside `Created` is recorded as the last
    /// event without changing state. `OnBind` always targets `Started`.
    ///
    /// # Errors
    ///
    /// Returns an error when the transition repeats the current state, skips a
    /// rank, re-initializes, or comes from an owner other than the pinned one.
    pub fn try_on_event(&self, owner: OwnerId, event: ServiceEvent) -> Result<ServiceState> {
        let mut current = self.current.lock();

        if event.starts_only_from_created() && current.state != ServiceState::Created {
            Self::check_owner(&current, owner, event.target())?;
            debug!(event = %event, state = %current.state, "Lifecycle event recorded");
            self.service_event.send_replace(event);
            return Ok(current.state);
        }

        let to = event.target();
        Self::validate_transition(&current, owner, to)?;

        let from = current.state;
        if to == ServiceState::Initialized {
            current.owner = Some(owner);
        }
        current.state = to;
        drop(current);

        debug!(event = %event, from = %from, to = %to, "Service state updated");
        self.service_event.send_replace(event);
        self.service_state.send_replace(to);
        Ok(to)
    }

    /// Move the media connection state and return the new state.
    ///
    /// # Errors
    ///
    /// Returns an error for a repeated `Initialized`, `Nothing` as a target,
    /// any change out of `Error`, and transitions outside the connection
    /// graph.
    pub fn try_update_media_state(&self, state: MediaState) -> Result<MediaState> {
        let mut current = self.current.lock();
        current.media.validate_transition(&state)?;
        if current.media == state {
            return Ok(state);
        }
        let from = std::mem::replace(&mut current.media, state.clone());
        drop(current);

        debug!(from = %from, to = %state, "Media state updated");
        self.media_state.send_replace(state.clone());
        Ok(state)
    }

    fn check_owner(current: &Current, owner: OwnerId, to: ServiceState) -> Result<()> {
        match current.owner {
            None => Err(LifecycleError::Unowned(to)),
            Some(expected) if expected != owner => Err(LifecycleError::OwnerMismatch {
                expected,
                actual: owner,
            }),
            Some(_) => Ok(()),
        }
    }

    fn validate_transition(current: &Current, owner: OwnerId, to: ServiceState) -> Result<()> {
        let from = current.state;
        if to == ServiceState::Nothing {
            return Err(LifecycleError::InvalidTarget(to.to_string()));
        }
        if to == from {
            return Err(LifecycleError::Repeated(to));
        }
        if to == ServiceState::Initialized {
            if from != ServiceState::Nothing {
                return Err(LifecycleError::AlreadyInitialized(from));
            }
            return Ok(());
        }

        Self::check_owner(current, owner, to)?;
        if from == ServiceState::Destroyed || !(to.up_from(from) || to.down_from(from)) {
            return Err(LifecycleError::Jump { from, to });
        }
        Ok(())
    }

    pub fn state(&self) -> ServiceState {
        self.current.lock().state
    }

    pub fn media(&self) -> MediaState {
        self.current.lock().media.clone()
    }

    pub fn last_event(&self) -> ServiceEvent {
        *self.service_event.borrow()
    }

    pub fn owner(&self) -> Option<OwnerId> {
        self.current.lock().owner
    }

    /// Push-updated view of the service state.
    pub fn service_state(&self) -> watch::Receiver<ServiceState> {
        self.service_state.subscribe()
    }

    pub fn service_event(&self) -> watch::Receiver<ServiceEvent> {
        self.service_event.subscribe()
    }

    pub fn media_state(&self) -> watch::Receiver<MediaState> {
        self.media_state.subscribe()
    }

    pub fn was_launched(&self) -> bool {
        self.state() != ServiceState::Nothing
    }

    /// Initialized and not yet destroyed.
    pub fn is_alive(&self) -> bool {
        let state = self.state();
        state.at_least(ServiceState::Initialized) && state != ServiceState::Destroyed
    }

    pub fn is_destroyed(&self) -> bool {
        self.state() == ServiceState::Destroyed
    }

    pub fn is_foreground(&self) -> bool {
        self.state().is_foreground()
    }
}

impl Default for StateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = self.current.lock();
        f.debug_struct("StateRegistry")
            .field("owner", &current.owner)
            .field("state", &current.state)
            .field("media", &current.media)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launched(owner: OwnerId) -> StateRegistry {
        let states = StateRegistry::new();
        states.try_on_event(owner, ServiceEvent::OnInitialize).unwrap();
        states.try_on_event(owner, ServiceEvent::OnCreate).unwrap();
        states
    }

    #[test]
    fn test_ranks_reuse_values_on_descent() {
        assert_eq!(ServiceState::Paused.rank(), ServiceState::Started.rank());
        assert_eq!(ServiceState::Stopped.rank(), ServiceState::Created.rank());
        assert_eq!(ServiceState::Destroyed.rank(), ServiceState::Initialized.rank());
        assert!(ServiceState::Paused.down_from(ServiceState::Foreground));
        assert!(ServiceState::Foreground.up_from(ServiceState::Paused));
        assert!(ServiceState::Foreground.at_least(ServiceState::Started));
        assert!(ServiceState::Stopped.at_most(ServiceState::Created));
    }

    #[test]
    fn test_full_lifecycle() {
        let owner = OwnerId::new();
        let states = launched(owner);
        for (event, expected) in [
            (ServiceEvent::OnStartCommand, ServiceState::Started),
            (ServiceEvent::OnForeground, ServiceState::Foreground),
            (ServiceEvent::OnPause, ServiceState::Paused),
            (ServiceEvent::OnForeground, ServiceState::Foreground),
            (ServiceEvent::OnPause, ServiceState::Paused),
            (ServiceEvent::OnStop, ServiceState::Stopped),
            (ServiceEvent::OnDestroy, ServiceState::Destroyed),
        ] {
            assert_eq!(states.try_on_event(owner, event), Ok(expected));
        }
        assert!(states.is_destroyed());
        assert!(!states.is_alive());
        assert!(states.try_on_event(owner, ServiceEvent::OnCreate).is_err());
        assert!(states.was_launched());
    }

    #[test]
    fn test_repeat_and_jump_rejected() {
        let owner = OwnerId::new();
        let states = launched(owner);
        assert_eq!(
            states.try_on_event(owner, ServiceEvent::OnCreate),
            Err(LifecycleError::Repeated(ServiceState::Created))
        );
        assert_eq!(
            states.try_on_event(owner, ServiceEvent::OnPause),
            Err(LifecycleError::Jump {
                from: ServiceState::Created,
                to: ServiceState::Paused
            })
        );
        assert_eq!(states.state(), ServiceState::Created);

        let fresh = StateRegistry::new();
        fresh.try_on_event(owner, ServiceEvent::OnInitialize).unwrap();
        assert_eq!(
            fresh.try_on_event(owner, ServiceEvent::OnPause),
            Err(LifecycleError::Jump {
                from: ServiceState::Initialized,
                to: ServiceState::Paused
            })
        );
    }

    #[test]
    fn test_destroy_straight_after_create() {
        let owner = OwnerId::new();
        let states = launched(owner);
        // Created (1) -> Destroyed (0) is a single rank
        assert_eq!(
            states.try_on_event(owner, ServiceEvent::OnDestroy),
            Ok(ServiceState::Destroyed)
        );
        assert!(states.is_destroyed());
    }

    #[test]
    fn test_owner_pinned_on_initialize() {
        let owner = OwnerId::new();
        let states = launched(owner);
        let intruder = OwnerId::new();
        assert_eq!(
            states.try_on_event(intruder, ServiceEvent::OnStartCommand),
            Err(LifecycleError::OwnerMismatch {
                expected: owner,
                actual: intruder
            })
        );
        assert_eq!(
            states.try_on_event(intruder, ServiceEvent::OnInitialize),
            Err(LifecycleError::AlreadyInitialized(ServiceState::Created))
        );
        assert_eq!(states.owner(), Some(owner));
    }

    #[test]
    fn test_create_before_initialize_rejected() {
        let states = StateRegistry::new();
        assert_eq!(
            states.try_on_event(OwnerId::new(), ServiceEvent::OnCreate),
            Err(LifecycleError::Unowned(ServiceState::Created))
        );
        assert!(!states.was_launched());
    }

    #[test]
    fn test_start_outside_created_is_recorded_only() {
        let owner = OwnerId::new();
        let states = launched(owner);
        states.try_on_event(owner, ServiceEvent::OnStartCommand).unwrap();
        assert_eq!(states.state(), ServiceState::Started);

        assert_eq!(
            states.try_on_event(owner, ServiceEvent::OnStartCommand),
            Ok(ServiceState::Started)
        );
        assert_eq!(states.last_event(), ServiceEvent::OnStartCommand);
        assert_eq!(states.state(), ServiceState::Started);
    }

    #[test]
    fn test_bind_follows_rank_rules() {
        let owner = OwnerId::new();
        let states = launched(owner);
        assert_eq!(
            states.try_on_event(owner, ServiceEvent::OnBind),
            Ok(ServiceState::Started)
        );
        assert_eq!(
            states.try_on_event(owner, ServiceEvent::OnBind),
            Err(LifecycleError::Repeated(ServiceState::Started))
        );

        states.try_on_event(owner, ServiceEvent::OnForeground).unwrap();
        assert_eq!(
            states.try_on_event(owner, ServiceEvent::OnBind),
            Ok(ServiceState::Started)
        );
        assert_eq!(states.last_event(), ServiceEvent::OnBind);
        assert!(!states.is_foreground());
    }

    #[test]
    fn test_media_connection_graph() {
        let states = StateRegistry::new();
        assert_eq!(
            states.try_update_media_state(MediaState::Connecting),
            Err(LifecycleError::MediaTransition {
                from: "nothing".into(),
                to: "connecting".into()
            })
        );
        for state in [
            MediaState::Initialized,
            MediaState::Connecting,
            MediaState::Connected,
            MediaState::Disconnected,
            MediaState::Connecting,
            MediaState::Connected,
            MediaState::Connecting,
            MediaState::Disconnected,
        ] {
            states.try_update_media_state(state).unwrap();
        }
        assert_eq!(
            states.try_update_media_state(MediaState::Initialized),
            Err(LifecycleError::MediaTransition {
                from: "disconnected".into(),
                to: "initialized".into()
            })
        );
        assert_eq!(
            states.try_update_media_state(MediaState::Nothing),
            Err(LifecycleError::InvalidTarget("nothing".into()))
        );
    }

    #[test]
    fn test_client_states_may_repeat() {
        let states = StateRegistry::new();
        states.try_update_media_state(MediaState::Initialized).unwrap();
        assert_eq!(
            states.try_update_media_state(MediaState::Initialized),
            Err(LifecycleError::MediaRepeated("initialized".into()))
        );

        let mut media = states.media_state();
        media.borrow_and_update();
        for state in [
            MediaState::Connecting,
            MediaState::Connecting,
            MediaState::Connected,
            MediaState::Connected,
            MediaState::Disconnected,
            MediaState::Disconnected,
            MediaState::Connected,
        ] {
            assert_eq!(states.try_update_media_state(state.clone()), Ok(state));
        }
        assert_eq!(states.media(), MediaState::Connected);

        states.try_update_media_state(MediaState::Disconnected).unwrap();
        media.borrow_and_update();
        states.try_update_media_state(MediaState::Disconnected).unwrap();
        // repeats publish nothing
        assert!(!media.has_changed().unwrap());
    }

    #[test]
    fn test_media_error_is_terminal() {
        let states = StateRegistry::new();
        states
            .try_update_media_state(MediaState::error("engine gone", "onConnect failed"))
            .unwrap();
        assert!(states.media().is_terminal());
        assert!(matches!(
            states.try_update_media_state(MediaState::Connecting),
            Err(LifecycleError::MediaTerminal(_))
        ));
        assert!(matches!(
            states.try_update_media_state(MediaState::error("again", "retry")),
            Err(LifecycleError::MediaTerminal(_))
        ));
    }

    #[test]
    fn test_watch_channels_follow_updates() {
        let owner = OwnerId::new();
        let states = StateRegistry::new();
        let mut service = states.service_state();
        let mut media = states.media_state();
        assert_eq!(*service.borrow(), ServiceState::Nothing);

        states.try_on_event(owner, ServiceEvent::OnInitialize).unwrap();
        assert!(service.has_changed().unwrap());
        assert_eq!(*service.borrow_and_update(), ServiceState::Initialized);

        states.try_update_media_state(MediaState::Initialized).unwrap();
        assert_eq!(*media.borrow_and_update(), MediaState::Initialized);

        // rejected transitions publish nothing
        let _ = states.try_on_event(owner, ServiceEvent::OnForeground);
        assert!(!service.has_changed().unwrap());
    }

    #[test]
    fn test_media_state_serialization() {
        let json = serde_json::to_string(&MediaState::error("timeout", "onPostConnect failed"))
            .unwrap();
        assert!(json.contains("\"state\":\"error\""));
        let back: MediaState = serde_json::from_str(&json).unwrap();
        assert!(back.is_terminal());
    }
}

//! Playback engine bridge traits and supporting transport types.
//!
//! The session core never plays audio itself. Hosts hand it a [`Player`]
//! (the transport primitive set of their engine) and the core forwards
//! commands to it, subscribes to its events through [`PlayerListener`], and
//! reads queue, progress and property snapshots back out.
//!
//! The engine is trusted to serialize concurrent commands against one player.

use crate::{
    error::{BridgeError, Result},
    platform::PlatformSendSync,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for a player instance handed to the core by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(Uuid);

impl PlayerId {
    /// Generate a new player identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Repeat behaviour of the player queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    #[default]
    Off,
    One,
    All,
}

impl RepeatMode {
    /// Mode reached by a single toggle press: `Off -> One -> All -> Off`.
    pub fn toggled(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::One,
            RepeatMode::One => RepeatMode::All,
            RepeatMode::All => RepeatMode::Off,
        }
    }
}

/// Shuffle behaviour of the player queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShuffleMode {
    #[default]
    Off,
    On,
}

impl ShuffleMode {
    pub fn toggled(self) -> Self {
        match self {
            ShuffleMode::Off => ShuffleMode::On,
            ShuffleMode::On => ShuffleMode::Off,
        }
    }

    pub fn is_enabled(self) -> bool {
        matches!(self, ShuffleMode::On)
    }
}

/// Engine-side readiness of the current media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Nothing loaded, or the player was stopped.
    #[default]
    Idle,
    /// Waiting for data before playback can start.
    Buffering,
    /// Able to play immediately from the current position.
    Ready,
    /// Reached the end of the queue.
    Ended,
}

/// Ordered list of media ids with the index of the current item.
///
/// `current_index` is `None` exactly when the list is empty; otherwise it
/// points inside the list. Duplicate ids are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaybackQueue {
    items: Vec<String>,
    current_index: Option<usize>,
}

impl PlaybackQueue {
    /// Sentinel reported for the current index of an empty queue.
    pub const UNSET_INDEX: i64 = -1;

    /// Build a queue, validating the index invariant.
    pub fn new(items: Vec<String>, current_index: Option<usize>) -> Result<Self> {
        match (items.is_empty(), current_index) {
            (true, None) => Ok(Self::empty()),
            (true, Some(index)) => Err(BridgeError::InvalidArgument(format!(
                "index {index} set on an empty queue"
            ))),
            (false, None) => Err(BridgeError::InvalidArgument(
                "non-empty queue requires a current index".to_string(),
            )),
            (false, Some(index)) if index >= items.len() => {
                Err(BridgeError::InvalidArgument(format!(
                    "index {index} out of bounds for queue of {}",
                    items.len()
                )))
            }
            (false, Some(index)) => Ok(Self {
                items,
                current_index: Some(index),
            }),
        }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            current_index: None,
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Current index with `-1` standing for "no item".
    pub fn raw_current_index(&self) -> i64 {
        self.current_index
            .map(|index| index as i64)
            .unwrap_or(Self::UNSET_INDEX)
    }

    pub fn current_item(&self) -> Option<&str> {
        self.current_index
            .and_then(|index| self.items.get(index))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns `true` when `index` addresses an item of this queue.
    pub fn contains_index(&self, index: usize) -> bool {
        index < self.items.len()
    }
}

/// Position information of the current media item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackProgress {
    pub position: Duration,
    pub buffered_position: Duration,
    /// `None` while the duration of the current item is unknown.
    pub duration: Option<Duration>,
    /// Playback speed multiplier; `1.0` is normal speed.
    pub speed: f32,
}

impl PlaybackProgress {
    pub const UNSET: PlaybackProgress = PlaybackProgress {
        position: Duration::ZERO,
        buffered_position: Duration::ZERO,
        duration: None,
        speed: 1.0,
    };
}

impl Default for PlaybackProgress {
    fn default() -> Self {
        Self::UNSET
    }
}

/// Transport properties reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerProperties {
    pub engine_state: EngineState,
    pub play_when_ready: bool,
    pub is_playing: bool,
    pub repeat_mode: RepeatMode,
    pub shuffle_mode: ShuffleMode,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Events emitted by a [`Player`] to its registered listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum PlayerEvent {
    /// The current media item changed (including the first item being set).
    MediaItemTransition {
        index: Option<usize>,
        media_id: Option<String>,
    },
    /// Queue contents changed.
    TimelineChanged,
    PlaybackStateChanged(EngineState),
    PlayWhenReadyChanged(bool),
    IsPlayingChanged(bool),
    RepeatModeChanged(RepeatMode),
    ShuffleModeChanged(ShuffleMode),
    /// Position jumped, usually because of a seek.
    PositionDiscontinuity { position: Duration },
}

/// Receives events from a [`Player`].
///
/// Dispatch is synchronous on the engine's delivery path; implementations
/// must not block.
pub trait PlayerListener: PlatformSendSync {
    fn on_event(&self, event: &PlayerEvent);
}

/// Transport primitive set of a host playback engine.
///
/// Implementations must tolerate concurrent callers. Commands issued after
/// [`Player::release`] fail with [`BridgeError::Released`].
#[async_trait::async_trait]
pub trait Player: PlatformSendSync {
    /// Stable identifier of this player instance.
    fn id(&self) -> PlayerId;

    async fn play(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    /// Seek within the current media item.
    async fn seek_to_position(&self, position: Duration) -> Result<()>;

    /// Make `index` the current media item and seek to `start_position`.
    /// Must fail with a rejection when `index` is outside the queue.
    async fn seek_to_index(&self, index: usize, start_position: Duration) -> Result<()>;

    async fn seek_to_next(&self) -> Result<()>;

    async fn seek_to_previous(&self) -> Result<()>;

    async fn set_play_when_ready(&self, play_when_ready: bool) -> Result<()>;

    async fn set_repeat_mode(&self, mode: RepeatMode) -> Result<()>;

    async fn set_shuffle_mode(&self, mode: ShuffleMode) -> Result<()>;

    /// Volume is normalized to `0.0..=1.0`.
    async fn set_volume(&self, volume: f32) -> Result<()>;

    fn queue(&self) -> PlaybackQueue;

    fn progress(&self) -> PlaybackProgress;

    fn properties(&self) -> PlayerProperties;

    /// Register a listener. Registering the same instance twice is a no-op;
    /// returns whether the listener was added.
    fn add_listener(&self, listener: Arc<dyn PlayerListener>) -> bool;

    /// Remove every registration of `listener`; returns whether one existed.
    fn remove_listener(&self, listener: &Arc<dyn PlayerListener>) -> bool;

    /// Release engine resources. Idempotent.
    fn release(&self);

    fn is_released(&self) -> bool;
}

/// Convenience result type alias for playback operations.
pub type PlaybackResult<T> = std::result::Result<T, BridgeError>;

//! In-memory playback engine.
//!
//! `LocalPlayer` keeps a queue of media items and extrapolates the playback
//! position from a [`Clock`], which is enough for desktop hosts without a
//! native engine and for exercising the session core end to end. It emits the
//! same event set a real engine would.

use async_trait::async_trait;
use bridge_traits::{
    clock::{Clock, SystemClock},
    error::{BridgeError, Result},
    platform::same_instance,
    playback::{
        EngineState, PlaybackProgress, PlaybackQueue, Player, PlayerEvent, PlayerId,
        PlayerListener, PlayerProperties, RepeatMode, ShuffleMode,
    },
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Seeking back within this offset restarts the current item instead of
/// moving to the previous one.
const PREVIOUS_RESTART_THRESHOLD: Duration = Duration::from_secs(3);

/// How far ahead of the position the engine pretends to have buffered.
const BUFFER_AHEAD: Duration = Duration::from_secs(10);

/// Entry of the local queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub media_id: String,
    pub duration: Option<Duration>,
}

impl MediaItem {
    pub fn new(media_id: impl Into<String>, duration: Option<Duration>) -> Self {
        Self {
            media_id: media_id.into(),
            duration,
        }
    }
}

struct EngineInner {
    items: Vec<MediaItem>,
    current_index: Option<usize>,
    /// Position at `anchor_millis`.
    anchor_position: Duration,
    anchor_millis: i64,
    play_when_ready: bool,
    engine_state: EngineState,
    repeat_mode: RepeatMode,
    shuffle_mode: ShuffleMode,
    speed: f32,
    volume: f32,
}

impl EngineInner {
    fn is_playing(&self) -> bool {
        self.play_when_ready && self.engine_state == EngineState::Ready
    }

    fn current_duration(&self) -> Option<Duration> {
        self.current_index
            .and_then(|index| self.items.get(index))
            .and_then(|item| item.duration)
    }

    /// Extrapolated position, not clamped to the item duration.
    fn raw_position_at(&self, now_millis: i64) -> Duration {
        let mut position = self.anchor_position;
        if self.is_playing() {
            let elapsed = (now_millis - self.anchor_millis).max(0) as f64 / 1000.0;
            position += Duration::from_secs_f64(elapsed * f64::from(self.speed.max(0.0)));
        }
        position
    }

    fn position_at(&self, now_millis: i64) -> Duration {
        let position = self.raw_position_at(now_millis);
        match self.current_duration() {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    fn anchor(&mut self, position: Duration, now_millis: i64) {
        self.anchor_position = position;
        self.anchor_millis = now_millis;
    }

    fn next_index(&self) -> Option<usize> {
        let current = self.current_index?;
        if current + 1 < self.items.len() {
            Some(current + 1)
        } else if self.repeat_mode == RepeatMode::All {
            Some(0)
        } else {
            None
        }
    }

    fn previous_index(&self) -> Option<usize> {
        let current = self.current_index?;
        if current > 0 {
            Some(current - 1)
        } else if self.repeat_mode == RepeatMode::All && !self.items.is_empty() {
            Some(self.items.len() - 1)
        } else {
            None
        }
    }

    fn queue(&self) -> PlaybackQueue {
        let ids = self.items.iter().map(|item| item.media_id.clone()).collect();
        PlaybackQueue::new(ids, self.current_index).unwrap_or_default()
    }

    fn transition_event(&self) -> PlayerEvent {
        PlayerEvent::MediaItemTransition {
            index: self.current_index,
            media_id: self
                .current_index
                .and_then(|index| self.items.get(index))
                .map(|item| item.media_id.clone()),
        }
    }
}

/// Queue-backed engine driven entirely in memory.
pub struct LocalPlayer {
    id: PlayerId,
    clock: Arc<dyn Clock>,
    inner: Mutex<EngineInner>,
    listeners: Mutex<Vec<Arc<dyn PlayerListener>>>,
    released: AtomicBool,
    release_calls: AtomicUsize,
}

impl LocalPlayer {
    /// Create an empty player using the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let now = clock.unix_timestamp_millis();
        Self {
            id: PlayerId::new(),
            clock,
            inner: Mutex::new(EngineInner {
                items: Vec::new(),
                current_index: None,
                anchor_position: Duration::ZERO,
                anchor_millis: now,
                play_when_ready: false,
                engine_state: EngineState::Idle,
                repeat_mode: RepeatMode::Off,
                shuffle_mode: ShuffleMode::Off,
                speed: 1.0,
                volume: 1.0,
            }),
            listeners: Mutex::new(Vec::new()),
            released: AtomicBool::new(false),
            release_calls: AtomicUsize::new(0),
        }
    }

    /// Replace the queue and make `start_index` current.
    ///
    /// An empty `items` list clears the queue and ignores `start_index`.
    pub fn set_queue(&self, items: Vec<MediaItem>, start_index: usize) -> Result<()> {
        self.ensure_live()?;
        if !items.is_empty() && start_index >= items.len() {
            return Err(BridgeError::InvalidArgument(format!(
                "start index {start_index} out of bounds for queue of {}",
                items.len()
            )));
        }

        let now = self.now();
        let events = {
            let mut inner = self.inner.lock();
            let was_playing = inner.is_playing();
            let previous_state = inner.engine_state;

            inner.current_index = if items.is_empty() {
                None
            } else {
                Some(start_index)
            };
            inner.items = items;
            inner.anchor(Duration::ZERO, now);
            inner.engine_state = if inner.items.is_empty() {
                EngineState::Idle
            } else {
                EngineState::Ready
            };

            let mut events = vec![PlayerEvent::TimelineChanged, inner.transition_event()];
            if inner.engine_state != previous_state {
                events.push(PlayerEvent::PlaybackStateChanged(inner.engine_state));
            }
            if inner.is_playing() != was_playing {
                events.push(PlayerEvent::IsPlayingChanged(inner.is_playing()));
            }
            events
        };

        debug!(player_id = %self.id, "Queue replaced");
        self.dispatch(events);
        Ok(())
    }

    /// Apply the item completions that happened since the last call.
    ///
    /// A finished item moves to the next one (or loops with
    /// [`RepeatMode::One`]); finishing the last item without a repeat mode
    /// stops at its end in [`EngineState::Ended`].
    pub fn tick(&self) -> Result<()> {
        self.ensure_live()?;
        let now = self.now();
        let events = {
            let mut inner = self.inner.lock();
            let mut events = Vec::new();
            // bounded so zero-length items cannot spin
            for _ in 0..=inner.items.len() {
                if !inner.is_playing() {
                    break;
                }
                let Some(duration) = inner.current_duration() else {
                    break;
                };
                let position = inner.raw_position_at(now);
                if position < duration {
                    break;
                }
                let overshoot = position - duration;
                let next = match inner.repeat_mode {
                    RepeatMode::One => inner.current_index,
                    _ => inner.next_index(),
                };
                match next {
                    Some(index) => {
                        inner.current_index = Some(index);
                        inner.anchor(overshoot, now);
                        events.push(inner.transition_event());
                    }
                    None => {
                        inner.anchor(duration, now);
                        inner.engine_state = EngineState::Ended;
                        events.push(PlayerEvent::PlaybackStateChanged(EngineState::Ended));
                        events.push(PlayerEvent::IsPlayingChanged(false));
                        break;
                    }
                }
            }
            events
        };
        if !events.is_empty() {
            debug!(player_id = %self.id, events = events.len(), "Engine advanced");
        }
        self.dispatch(events);
        Ok(())
    }

    /// Change the playback speed multiplier.
    pub fn set_playback_speed(&self, speed: f32) -> Result<()> {
        self.ensure_live()?;
        if !(speed.is_finite() && speed >= 0.0) {
            return Err(BridgeError::InvalidArgument(format!(
                "invalid playback speed {speed}"
            )));
        }
        let now = self.now();
        let mut inner = self.inner.lock();
        let position = inner.position_at(now);
        inner.anchor(position, now);
        inner.speed = speed;
        Ok(())
    }

    /// Simulate the engine stalling for data, or recovering from a stall.
    pub fn set_buffering(&self, buffering: bool) -> Result<()> {
        self.ensure_live()?;
        let now = self.now();
        let events = {
            let mut inner = self.inner.lock();
            if inner.items.is_empty() {
                return Ok(());
            }
            let was_playing = inner.is_playing();
            let position = inner.position_at(now);
            inner.anchor(position, now);
            let target = if buffering {
                EngineState::Buffering
            } else {
                EngineState::Ready
            };
            if inner.engine_state == target {
                return Ok(());
            }
            inner.engine_state = target;
            let mut events = vec![PlayerEvent::PlaybackStateChanged(target)];
            if inner.is_playing() != was_playing {
                events.push(PlayerEvent::IsPlayingChanged(inner.is_playing()));
            }
            events
        };
        self.dispatch(events);
        Ok(())
    }

    pub fn volume(&self) -> f32 {
        self.inner.lock().volume
    }

    /// Number of listeners currently attached.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Number of times [`Player::release`] has been called.
    pub fn release_count(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }

    fn now(&self) -> i64 {
        self.clock.unix_timestamp_millis()
    }

    fn ensure_live(&self) -> Result<()> {
        if self.released.load(Ordering::SeqCst) {
            Err(BridgeError::Released(format!("player {}", self.id)))
        } else {
            Ok(())
        }
    }

    fn dispatch(&self, events: Vec<PlayerEvent>) {
        if events.is_empty() {
            return;
        }
        let listeners = self.listeners.lock().clone();
        for event in &events {
            trace!(player_id = %self.id, ?event, "Dispatching engine event");
            for listener in &listeners {
                listener.on_event(event);
            }
        }
    }

    fn move_to(&self, index: usize, start_position: Duration) -> Result<()> {
        let now = self.now();
        let events = {
            let mut inner = self.inner.lock();
            if index >= inner.items.len() {
                return Err(BridgeError::Rejected(format!(
                    "seek index {index} outside queue of {}",
                    inner.items.len()
                )));
            }
            let changed = inner.current_index != Some(index);
            inner.current_index = Some(index);
            let start = match inner.current_duration() {
                Some(duration) => start_position.min(duration),
                None => start_position,
            };
            inner.anchor(start, now);

            let mut events = Vec::with_capacity(2);
            if changed {
                events.push(inner.transition_event());
            }
            events.push(PlayerEvent::PositionDiscontinuity { position: start });
            events
        };
        self.dispatch(events);
        Ok(())
    }

    fn apply_play_when_ready(&self, play_when_ready: bool) -> Result<()> {
        let now = self.now();
        let events = {
            let mut inner = self.inner.lock();
            if play_when_ready && inner.items.is_empty() {
                return Err(BridgeError::Rejected("queue is empty".to_string()));
            }
            let was_playing = inner.is_playing();
            let position = inner.position_at(now);
            inner.anchor(position, now);

            let mut events = Vec::new();
            if inner.play_when_ready != play_when_ready {
                inner.play_when_ready = play_when_ready;
                events.push(PlayerEvent::PlayWhenReadyChanged(play_when_ready));
            }
            if play_when_ready && inner.engine_state == EngineState::Ended {
                inner.anchor(Duration::ZERO, now);
                inner.engine_state = EngineState::Ready;
                events.push(PlayerEvent::PlaybackStateChanged(EngineState::Ready));
            }
            if inner.is_playing() != was_playing {
                events.push(PlayerEvent::IsPlayingChanged(inner.is_playing()));
            }
            events
        };
        self.dispatch(events);
        Ok(())
    }
}

impl Default for LocalPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LocalPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalPlayer")
            .field("id", &self.id)
            .field("released", &self.released.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Player for LocalPlayer {
    fn id(&self) -> PlayerId {
        self.id
    }

    async fn play(&self) -> Result<()> {
        self.ensure_live()?;
        self.apply_play_when_ready(true)
    }

    async fn pause(&self) -> Result<()> {
        self.ensure_live()?;
        self.apply_play_when_ready(false)
    }

    async fn seek_to_position(&self, position: Duration) -> Result<()> {
        self.ensure_live()?;
        let index = self
            .inner
            .lock()
            .current_index
            .ok_or_else(|| BridgeError::Rejected("queue is empty".to_string()))?;
        self.move_to(index, position)
    }

    async fn seek_to_index(&self, index: usize, start_position: Duration) -> Result<()> {
        self.ensure_live()?;
        self.move_to(index, start_position)
    }

    async fn seek_to_next(&self) -> Result<()> {
        self.ensure_live()?;
        let next = self
            .inner
            .lock()
            .next_index()
            .ok_or_else(|| BridgeError::Rejected("no next item".to_string()))?;
        self.move_to(next, Duration::ZERO)
    }

    async fn seek_to_previous(&self) -> Result<()> {
        self.ensure_live()?;
        let now = self.now();
        let (current, previous, position) = {
            let inner = self.inner.lock();
            (
                inner.current_index,
                inner.previous_index(),
                inner.position_at(now),
            )
        };
        let current =
            current.ok_or_else(|| BridgeError::Rejected("queue is empty".to_string()))?;
        match previous {
            Some(previous) if position <= PREVIOUS_RESTART_THRESHOLD => {
                self.move_to(previous, Duration::ZERO)
            }
            _ => self.move_to(current, Duration::ZERO),
        }
    }

    async fn set_play_when_ready(&self, play_when_ready: bool) -> Result<()> {
        self.ensure_live()?;
        self.apply_play_when_ready(play_when_ready)
    }

    async fn set_repeat_mode(&self, mode: RepeatMode) -> Result<()> {
        self.ensure_live()?;
        let changed = {
            let mut inner = self.inner.lock();
            std::mem::replace(&mut inner.repeat_mode, mode) != mode
        };
        if changed {
            self.dispatch(vec![PlayerEvent::RepeatModeChanged(mode)]);
        }
        Ok(())
    }

    async fn set_shuffle_mode(&self, mode: ShuffleMode) -> Result<()> {
        self.ensure_live()?;
        let changed = {
            let mut inner = self.inner.lock();
            std::mem::replace(&mut inner.shuffle_mode, mode) != mode
        };
        if changed {
            self.dispatch(vec![PlayerEvent::ShuffleModeChanged(mode)]);
        }
        Ok(())
    }

    async fn set_volume(&self, volume: f32) -> Result<()> {
        self.ensure_live()?;
        if !(0.0..=1.0).contains(&volume) {
            return Err(BridgeError::InvalidArgument(format!(
                "volume {volume} outside 0.0..=1.0"
            )));
        }
        self.inner.lock().volume = volume;
        Ok(())
    }

    fn queue(&self) -> PlaybackQueue {
        self.inner.lock().queue()
    }

    fn progress(&self) -> PlaybackProgress {
        let now = self.now();
        let inner = self.inner.lock();
        let position = inner.position_at(now);
        let duration = inner.current_duration();
        let buffered = if inner.items.is_empty() {
            Duration::ZERO
        } else {
            let ahead = position + BUFFER_AHEAD;
            duration.map_or(ahead, |duration| ahead.min(duration))
        };
        PlaybackProgress {
            position,
            buffered_position: buffered,
            duration,
            speed: inner.speed,
        }
    }

    fn properties(&self) -> PlayerProperties {
        let inner = self.inner.lock();
        PlayerProperties {
            engine_state: inner.engine_state,
            play_when_ready: inner.play_when_ready,
            is_playing: inner.is_playing(),
            repeat_mode: inner.repeat_mode,
            shuffle_mode: inner.shuffle_mode,
            has_next: inner.next_index().is_some(),
            has_previous: inner.current_index.is_some(),
        }
    }

    fn add_listener(&self, listener: Arc<dyn PlayerListener>) -> bool {
        if self.released.load(Ordering::SeqCst) {
            return false;
        }
        let mut listeners = self.listeners.lock();
        if listeners.iter().any(|l| same_instance(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    fn remove_listener(&self, listener: &Arc<dyn PlayerListener>) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|l| !same_instance(l, listener));
        listeners.len() != before
    }

    fn release(&self) {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        let now = self.now();
        {
            let mut inner = self.inner.lock();
            let position = inner.position_at(now);
            inner.anchor(position, now);
            inner.play_when_ready = false;
            inner.engine_state = EngineState::Idle;
        }
        self.listeners.lock().clear();
        debug!(player_id = %self.id, "Player released");
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[derive(Default)]
    struct RecordingListener {
        events: Mutex<Vec<PlayerEvent>>,
    }

    impl PlayerListener for RecordingListener {
        fn on_event(&self, event: &PlayerEvent) {
            self.events.lock().push(event.clone());
        }
    }

    fn items(ids: &[&str]) -> Vec<MediaItem> {
        ids.iter()
            .map(|id| MediaItem::new(*id, Some(Duration::from_secs(180))))
            .collect()
    }

    fn player_with(ids: &[&str]) -> (LocalPlayer, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let player = LocalPlayer::with_clock(clock.clone());
        player.set_queue(items(ids), 0).unwrap();
        (player, clock)
    }

    #[tokio::test]
    async fn seek_to_index_within_bounds() {
        let (player, _) = player_with(&["a", "b", "c"]);

        player
            .seek_to_index(2, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(player.queue().current_index(), Some(2));
        assert_eq!(player.progress().position, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn seek_to_index_out_of_bounds_is_rejected() {
        let (player, _) = player_with(&["a", "b"]);

        let err = player.seek_to_index(2, Duration::ZERO).await.unwrap_err();

        assert!(err.is_rejection());
        assert_eq!(player.queue().current_index(), Some(0));
    }

    #[tokio::test]
    async fn empty_queue_rejects_seeks_and_play() {
        let player = LocalPlayer::new();

        assert!(player.seek_to_index(0, Duration::ZERO).await.is_err());
        assert!(player.seek_to_next().await.is_err());
        assert!(player.play().await.is_err());
        assert_eq!(player.queue().raw_current_index(), -1);
    }

    #[tokio::test]
    async fn next_respects_repeat_all() {
        let (player, _) = player_with(&["a", "b"]);

        player.seek_to_next().await.unwrap();
        assert!(player.seek_to_next().await.is_err());

        player.set_repeat_mode(RepeatMode::All).await.unwrap();
        player.seek_to_next().await.unwrap();
        assert_eq!(player.queue().current_index(), Some(0));
    }

    #[tokio::test]
    async fn previous_restarts_item_after_threshold() {
        let (player, clock) = player_with(&["a", "b"]);
        player.seek_to_index(1, Duration::ZERO).await.unwrap();
        player.play().await.unwrap();

        clock.advance(Duration::from_secs(10));
        player.seek_to_previous().await.unwrap();
        assert_eq!(player.queue().current_index(), Some(1));
        assert_eq!(player.progress().position, Duration::ZERO);

        player.seek_to_previous().await.unwrap();
        assert_eq!(player.queue().current_index(), Some(0));
    }

    #[tokio::test]
    async fn position_advances_with_clock_and_speed() {
        let (player, clock) = player_with(&["a"]);
        player.play().await.unwrap();

        clock.advance(Duration::from_secs(2));
        assert_eq!(player.progress().position, Duration::from_secs(2));

        player.set_playback_speed(2.0).unwrap();
        clock.advance(Duration::from_secs(1));
        assert_eq!(player.progress().position, Duration::from_secs(4));

        player.pause().await.unwrap();
        clock.advance(Duration::from_secs(5));
        assert_eq!(player.progress().position, Duration::from_secs(4));
    }

    #[tokio::test]
    async fn play_emits_state_events() {
        let (player, _) = player_with(&["a"]);
        let listener = Arc::new(RecordingListener::default());
        player.add_listener(listener.clone());

        player.play().await.unwrap();

        let events = listener.events.lock().clone();
        assert_eq!(
            events,
            vec![
                PlayerEvent::PlayWhenReadyChanged(true),
                PlayerEvent::IsPlayingChanged(true),
            ]
        );
    }

    #[tokio::test]
    async fn duplicate_listener_registration_dispatches_once() {
        let (player, _) = player_with(&["a"]);
        let listener = Arc::new(RecordingListener::default());
        let as_dyn: Arc<dyn PlayerListener> = listener.clone();

        assert!(player.add_listener(as_dyn.clone()));
        assert!(!player.add_listener(as_dyn.clone()));
        player.set_repeat_mode(RepeatMode::One).await.unwrap();

        assert_eq!(listener.events.lock().len(), 1);
        assert!(player.remove_listener(&as_dyn));
        assert!(!player.remove_listener(&as_dyn));
    }

    #[tokio::test]
    async fn release_is_idempotent_and_rejects_commands() {
        let (player, _) = player_with(&["a"]);
        player.add_listener(Arc::new(RecordingListener::default()));

        player.release();
        player.release();

        assert!(player.is_released());
        assert_eq!(player.release_count(), 2);
        assert_eq!(player.listener_count(), 0);
        assert!(matches!(
            player.play().await.unwrap_err(),
            BridgeError::Released(_)
        ));
    }

    #[tokio::test]
    async fn tick_moves_through_the_queue_and_ends() {
        let (player, clock) = player_with(&["a", "b"]);
        let listener = Arc::new(RecordingListener::default());
        player.add_listener(listener.clone());
        player.play().await.unwrap();
        listener.events.lock().clear();

        clock.advance(Duration::from_secs(185));
        player.tick().unwrap();
        assert_eq!(player.queue().current_index(), Some(1));
        assert_eq!(player.progress().position, Duration::from_secs(5));
        assert!(player.properties().is_playing);

        clock.advance(Duration::from_secs(200));
        player.tick().unwrap();
        let properties = player.properties();
        assert_eq!(properties.engine_state, EngineState::Ended);
        assert!(!properties.is_playing);
        assert!(properties.play_when_ready);
        assert_eq!(player.progress().position, Duration::from_secs(180));

        assert_eq!(
            listener.events.lock().clone(),
            vec![
                PlayerEvent::MediaItemTransition {
                    index: Some(1),
                    media_id: Some("b".to_string()),
                },
                PlayerEvent::PlaybackStateChanged(EngineState::Ended),
                PlayerEvent::IsPlayingChanged(false),
            ]
        );

        // play after the end restarts the current item
        clock.advance(Duration::from_secs(30));
        player.tick().unwrap();
        player.play().await.unwrap();
        assert_eq!(player.properties().engine_state, EngineState::Ready);
        assert_eq!(player.progress().position, Duration::ZERO);
    }

    #[tokio::test]
    async fn tick_loops_with_repeat_one() {
        let (player, clock) = player_with(&["a", "b"]);
        player.set_repeat_mode(RepeatMode::One).await.unwrap();
        player.play().await.unwrap();

        clock.advance(Duration::from_secs(190));
        player.tick().unwrap();
        assert_eq!(player.queue().current_index(), Some(0));
        assert_eq!(player.progress().position, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn tick_is_idle_while_paused() {
        let (player, clock) = player_with(&["a"]);
        clock.advance(Duration::from_secs(500));
        player.tick().unwrap();
        assert_eq!(player.properties().engine_state, EngineState::Ready);
    }

    #[tokio::test]
    async fn volume_is_validated() {
        let player = LocalPlayer::new();
        assert!(player.set_volume(1.5).await.is_err());
        player.set_volume(0.25).await.unwrap();
        assert_eq!(player.volume(), 0.25);
    }
}

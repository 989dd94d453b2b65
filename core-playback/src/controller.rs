//! # Playback Controller
//!
//! Issues transport commands against the player of one session and, after a
//! command succeeds, fans a facet refresh out to every observer it owns.
//!
//! ## Request results
//!
//! Every command resolves to a [`RequestResult`]. Engine failures, a missing
//! player and a disposed controller all produce `success == false` without a
//! fan-out; they are never raised as errors. On success the fan-out runs as a
//! background task in the controller scope and can be awaited through the
//! returned [`FanOutHandle`].
//!
//! ## Disposal
//!
//! [`PlaybackController::dispose`] cancels the controller scope, disposes all
//! observers (which dispose their collectors), asserts that nothing is left
//! attached, then tells the owning presenter to forget the controller.

use crate::context::SessionContext;
use crate::observer::{Facet, ObserverId, ObserverInner, PlaybackObserver};
use crate::presenter::PresenterShared;
use bridge_traits::playback::PlaybackResult;
use bridge_traits::{
    PlaybackProgress, PlaybackQueue, Player, PlayerProperties, RepeatMode, SessionId, ShuffleMode,
};
use core_async::sync::{CancellationToken, Mutex as AsyncMutex};
use core_async::task::JoinHandle;
use core_runtime::events::PlaybackEvent;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControllerId(Uuid);

impl ControllerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Transport command kinds, used for logging and fan-out routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Play,
    Pause,
    SeekPosition,
    SeekIndex,
    SeekNext,
    SeekPrevious,
    SetPlayWhenReady,
    SetRepeatMode,
    SetShuffleMode,
    CompareAndSet,
}

impl Command {
    pub fn name(self) -> &'static str {
        match self {
            Command::Play => "play",
            Command::Pause => "pause",
            Command::SeekPosition => "seek_position",
            Command::SeekIndex => "seek_index",
            Command::SeekNext => "seek_next",
            Command::SeekPrevious => "seek_previous",
            Command::SetPlayWhenReady => "set_play_when_ready",
            Command::SetRepeatMode => "set_repeat_mode",
            Command::SetShuffleMode => "set_shuffle_mode",
            Command::CompareAndSet => "compare_and_set",
        }
    }

    /// Facets invalidated when the command succeeds.
    pub fn facets(self) -> &'static [Facet] {
        match self {
            Command::Play | Command::Pause | Command::SetPlayWhenReady => &[Facet::PlayWhenReady],
            Command::SeekPosition => &[Facet::Progress],
            Command::SeekIndex | Command::SeekNext | Command::SeekPrevious => &[Facet::Queue],
            Command::SetRepeatMode => &[Facet::RepeatMode],
            Command::SetShuffleMode => &[Facet::ShuffleMode],
            Command::CompareAndSet => &Facet::ALL,
        }
    }
}

// ============================================================================
// Request Results
// ============================================================================

/// Background refresh of observers after a successful command.
#[derive(Debug)]
pub struct FanOutHandle {
    handle: JoinHandle<bool>,
    token: CancellationToken,
    timeout: Duration,
}

impl FanOutHandle {
    /// Wait until every observer was refreshed. Returns `false` if the
    /// fan-out was cancelled, failed or exceeded the configured timeout.
    pub async fn wait(self) -> bool {
        match core_async::time::timeout(self.timeout, self.handle).await {
            Ok(Ok(completed)) => completed,
            Ok(Err(err)) => {
                warn!(error = %err, "Fan-out task failed");
                false
            }
            Err(_) => {
                self.token.cancel();
                false
            }
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Outcome of a controller command.
#[derive(Debug)]
pub struct RequestResult {
    pub success: bool,
    pub fan_out: Option<FanOutHandle>,
}

impl RequestResult {
    fn succeeded(fan_out: FanOutHandle) -> Self {
        Self {
            success: true,
            fan_out: Some(fan_out),
        }
    }

    fn failed() -> Self {
        Self {
            success: false,
            fan_out: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Wait for the fan-out. `true` only if the command succeeded and all
    /// observers were refreshed.
    pub async fn wait(self) -> bool {
        match self.fan_out {
            Some(fan_out) if self.success => fan_out.wait().await,
            _ => false,
        }
    }
}

// ============================================================================
// Compare-and-set
// ============================================================================

/// Engine state a compare-and-set predicate is evaluated against.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub queue: PlaybackQueue,
    pub progress: PlaybackProgress,
    pub properties: PlayerProperties,
}

impl PlaybackSnapshot {
    pub fn capture(player: &dyn Player) -> Self {
        Self {
            queue: player.queue(),
            progress: player.progress(),
            properties: player.properties(),
        }
    }
}

/// A single field write applied by a compare-and-set request.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldWrite {
    PlayWhenReady(bool),
    SeekToIndex {
        index: usize,
        start_position: Duration,
    },
    SeekToPosition(Duration),
    RepeatMode(RepeatMode),
    ShuffleMode(ShuffleMode),
}

impl FieldWrite {
    async fn apply(&self, player: &dyn Player) -> PlaybackResult<()> {
        match self {
            FieldWrite::PlayWhenReady(value) => player.set_play_when_ready(*value).await,
            FieldWrite::SeekToIndex {
                index,
                start_position,
            } => player.seek_to_index(*index, *start_position).await,
            FieldWrite::SeekToPosition(position) => player.seek_to_position(*position).await,
            FieldWrite::RepeatMode(mode) => player.set_repeat_mode(*mode).await,
            FieldWrite::ShuffleMode(mode) => player.set_shuffle_mode(*mode).await,
        }
    }
}

type Predicate = Box<dyn Fn(&PlaybackSnapshot) -> bool + Send + Sync>;

/// Conditional batch of writes.
///
/// The predicate is evaluated on a fresh snapshot; if it holds, the writes
/// are applied in order. Compare-and-set requests issued through controllers
/// of the same presenter never interleave.
pub struct CompareAndSet {
    predicate: Predicate,
    writes: Vec<FieldWrite>,
}

impl CompareAndSet {
    pub fn new<P>(predicate: P) -> Self
    where
        P: Fn(&PlaybackSnapshot) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
            writes: Vec::new(),
        }
    }

    pub fn unconditional() -> Self {
        Self::new(|_| true)
    }

    pub fn write(mut self, write: FieldWrite) -> Self {
        self.writes.push(write);
        self
    }

    pub fn writes(&self) -> &[FieldWrite] {
        &self.writes
    }
}

impl fmt::Debug for CompareAndSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompareAndSet")
            .field("writes", &self.writes)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Command surface for one session. Cloning yields another handle to the
/// same controller.
#[derive(Clone)]
pub struct PlaybackController {
    inner: Arc<ControllerInner>,
}

pub(crate) struct ControllerInner {
    id: ControllerId,
    ctx: SessionContext,
    scope: CancellationToken,
    presenter: Weak<PresenterShared>,
    cas_lock: Arc<AsyncMutex<()>>,
    disposed: Mutex<bool>,
    observers: Mutex<Vec<Arc<ObserverInner>>>,
}

impl PlaybackController {
    pub(crate) fn new(
        ctx: SessionContext,
        scope: CancellationToken,
        presenter: Weak<PresenterShared>,
        cas_lock: Arc<AsyncMutex<()>>,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                id: ControllerId::new(),
                ctx,
                scope,
                presenter,
                cas_lock,
                disposed: Mutex::new(false),
                observers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Controller handed out by an already disposed presenter.
    pub(crate) fn detached(ctx: SessionContext) -> Self {
        let controller = Self::new(
            ctx,
            CancellationToken::new(),
            Weak::new(),
            Arc::new(AsyncMutex::new(())),
        );
        controller.inner.scope.cancel();
        *controller.inner.disposed.lock() = true;
        controller
    }

    pub fn id(&self) -> ControllerId {
        self.inner.id
    }

    pub fn session_id(&self) -> &SessionId {
        &self.inner.ctx.session_id
    }

    pub fn is_disposed(&self) -> bool {
        *self.inner.disposed.lock()
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.lock().len()
    }

    /// Create an observer owned by this controller. A disposed controller
    /// returns an observer that is already disposed.
    pub fn create_observer(&self) -> PlaybackObserver {
        let disposed = self.inner.disposed.lock();
        if *disposed {
            return PlaybackObserver::detached(self.inner.ctx.clone());
        }
        let observer = PlaybackObserver::new(
            self.inner.ctx.clone(),
            self.inner.scope.child_token(),
            Arc::downgrade(&self.inner),
        );
        self.inner.observers.lock().push(observer.inner().clone());
        observer
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get_queue(&self) -> PlaybackQueue {
        self.live_player()
            .map(|player| player.queue())
            .unwrap_or_default()
    }

    pub fn get_progress(&self) -> PlaybackProgress {
        self.live_player()
            .map(|player| player.progress())
            .unwrap_or_default()
    }

    pub fn get_properties(&self) -> PlayerProperties {
        self.live_player()
            .map(|player| player.properties())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> Option<PlaybackSnapshot> {
        self.live_player()
            .map(|player| PlaybackSnapshot::capture(player.as_ref()))
    }

    // ========================================================================
    // Commands
    // ========================================================================

    pub async fn request_play(&self) -> RequestResult {
        self.execute(Command::Play, |player| async move { player.play().await })
            .await
    }

    pub async fn request_pause(&self) -> RequestResult {
        self.execute(Command::Pause, |player| async move { player.pause().await })
            .await
    }

    pub async fn request_seek_position(&self, position: Duration) -> RequestResult {
        self.execute(Command::SeekPosition, move |player| async move {
            player.seek_to_position(position).await
        })
        .await
    }

    /// Seek to `index` in the queue. Out-of-range indices are left to the
    /// engine, which rejects them.
    pub async fn request_seek_index(&self, index: usize, start_position: Duration) -> RequestResult {
        self.execute(Command::SeekIndex, move |player| async move {
            player.seek_to_index(index, start_position).await
        })
        .await
    }

    pub async fn request_seek_next(&self) -> RequestResult {
        self.execute(Command::SeekNext, |player| async move {
            player.seek_to_next().await
        })
        .await
    }

    pub async fn request_seek_previous(&self) -> RequestResult {
        self.execute(Command::SeekPrevious, |player| async move {
            player.seek_to_previous().await
        })
        .await
    }

    pub async fn request_set_play_when_ready(&self, play_when_ready: bool) -> RequestResult {
        self.execute(Command::SetPlayWhenReady, move |player| async move {
            player.set_play_when_ready(play_when_ready).await
        })
        .await
    }

    pub async fn request_set_repeat_mode(&self, mode: RepeatMode) -> RequestResult {
        self.execute(Command::SetRepeatMode, move |player| async move {
            player.set_repeat_mode(mode).await
        })
        .await
    }

    pub async fn request_set_shuffle_mode(&self, mode: ShuffleMode) -> RequestResult {
        self.execute(Command::SetShuffleMode, move |player| async move {
            player.set_shuffle_mode(mode).await
        })
        .await
    }

    /// Apply `request.writes` if its predicate holds on the current state.
    ///
    /// A false predicate writes nothing. A failing write stops the batch;
    /// writes already applied stay applied.
    pub async fn request_compare_and_set(&self, request: CompareAndSet) -> RequestResult {
        let command = Command::CompareAndSet;
        if self.is_disposed() {
            return RequestResult::failed();
        }

        let scope = self.inner.scope.clone();
        let _serial = core_async::select! {
            _ = scope.cancelled() => return self.finish(command, false),
            guard = self.inner.cas_lock.lock() => guard,
        };

        let Some(player) = self.live_player() else {
            debug!(session_id = %self.inner.ctx.session_id, "No player for compare-and-set");
            return self.finish(command, false);
        };

        let snapshot = PlaybackSnapshot::capture(player.as_ref());
        if !(request.predicate)(&snapshot) {
            debug!(controller = %self.inner.id, "Compare-and-set predicate rejected snapshot");
            return self.finish(command, false);
        }

        for write in &request.writes {
            let outcome = core_async::select! {
                _ = scope.cancelled() => return self.finish(command, false),
                outcome = write.apply(player.as_ref()) => outcome,
            };
            if let Err(err) = outcome {
                warn!(controller = %self.inner.id, ?write, error = %err, "Compare-and-set write failed");
                return self.finish(command, false);
            }
        }

        self.finish(command, true)
    }

    // ========================================================================
    // Disposal
    // ========================================================================

    /// Cancel all work, dispose every observer and detach from the
    /// presenter. Idempotent.
    pub fn dispose(&self) {
        let mut disposed = self.inner.disposed.lock();
        if *disposed {
            return;
        }
        self.inner.scope.cancel();
        *disposed = true;

        let observers = self.inner.observers.lock().clone();
        for observer in &observers {
            observer.dispose();
            #[cfg(debug_assertions)]
            assert!(
                !self.inner.has_observer(observer.id()),
                "{} still attached to controller {} after dispose",
                observer.id(),
                self.inner.id
            );
        }

        assert!(
            self.inner.scope.is_cancelled() && self.inner.observers.lock().is_empty(),
            "controller {} disposed with live observers",
            self.inner.id
        );
        drop(disposed);

        info!(
            controller = %self.inner.id,
            session_id = %self.inner.ctx.session_id,
            observers = observers.len(),
            "Controller disposed"
        );
        self.inner.ctx.emit(PlaybackEvent::ControllerDisposed {
            session_id: self.inner.ctx.session_id.to_string(),
            controller_id: self.inner.id.to_string(),
            observers: observers.len(),
        });

        if let Some(presenter) = self.inner.presenter.upgrade() {
            presenter.release_controller(self.inner.id);
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn live_player(&self) -> Option<Arc<dyn Player>> {
        if self.is_disposed() {
            return None;
        }
        self.inner.ctx.player()
    }

    async fn execute<F, Fut>(&self, command: Command, op: F) -> RequestResult
    where
        F: FnOnce(Arc<dyn Player>) -> Fut,
        Fut: Future<Output = PlaybackResult<()>>,
    {
        if self.is_disposed() {
            debug!(controller = %self.inner.id, command = command.name(), "Command on disposed controller");
            return RequestResult::failed();
        }

        let Some(player) = self.inner.ctx.player() else {
            debug!(
                session_id = %self.inner.ctx.session_id,
                command = command.name(),
                "No player for session"
            );
            return self.finish(command, false);
        };

        let scope = self.inner.scope.clone();
        let outcome = core_async::select! {
            _ = scope.cancelled() => None,
            outcome = op(player) => Some(outcome),
        };

        match outcome {
            Some(Ok(())) => self.finish(command, true),
            Some(Err(err)) => {
                warn!(
                    controller = %self.inner.id,
                    command = command.name(),
                    error = %err,
                    "Command failed"
                );
                self.finish(command, false)
            }
            None => {
                debug!(controller = %self.inner.id, command = command.name(), "Command cancelled");
                RequestResult::failed()
            }
        }
    }

    fn finish(&self, command: Command, success: bool) -> RequestResult {
        self.inner.ctx.emit(PlaybackEvent::CommandCompleted {
            session_id: self.inner.ctx.session_id.to_string(),
            controller_id: self.inner.id.to_string(),
            command: command.name().to_string(),
            success,
        });
        if success {
            RequestResult::succeeded(self.spawn_fan_out(command.facets()))
        } else {
            RequestResult::failed()
        }
    }

    fn spawn_fan_out(&self, facets: &'static [Facet]) -> FanOutHandle {
        let observers = self.inner.observers.lock().clone();
        let token = self.inner.scope.child_token();
        let task_token = token.clone();

        let handle = self.inner.ctx.spawner.spawn(async move {
            for observer in observers {
                if task_token.is_cancelled() {
                    return false;
                }
                observer.refresh(facets);
                core_async::task::yield_now().await;
            }
            !task_token.is_cancelled()
        });

        FanOutHandle {
            handle,
            token,
            timeout: self.inner.ctx.config.fan_out_timeout,
        }
    }
}

impl fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackController")
            .field("id", &self.inner.id)
            .field("session_id", &self.inner.ctx.session_id)
            .field("disposed", &self.is_disposed())
            .field("observers", &self.observer_count())
            .finish()
    }
}

impl ControllerInner {
    pub fn remove_observer(&self, id: ObserverId) {
        self.observers.lock().retain(|observer| observer.id() != id);
    }

    #[cfg(debug_assertions)]
    fn has_observer(&self, id: ObserverId) -> bool {
        self.observers.lock().iter().any(|observer| observer.id() == id)
    }
}

//! # Session Registry
//!
//! Owns the single current `(session, player)` pair, swaps it atomically and
//! fans out session, player and engine notifications to registered listeners.
//!
//! ## Locking
//!
//! Swaps and listener-set mutations are serialized by a re-entrant writer
//! lock, so a listener may register or unregister listeners (or trigger a
//! nested swap) from inside a notification on the same thread. The current
//! record itself sits behind a short-lived mutex that is never held while
//! listeners run.

use crate::error::{PlaybackError, Result};
use crate::listeners::{ListenerRegistry, OnChanged};
use bridge_traits::{same_instance, MediaSession, Player, PlayerListener, SessionId};
use core_runtime::events::{CoreEvent, EventBus, SessionEvent};
use parking_lot::{Mutex, ReentrantMutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Current session together with the player it carried when installed.
#[derive(Clone)]
pub struct SessionRecord {
    pub session: Arc<dyn MediaSession>,
    pub player: Arc<dyn Player>,
}

impl SessionRecord {
    pub fn session_id(&self) -> SessionId {
        self.session.id()
    }
}

impl std::fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecord")
            .field("session_id", &self.session.id())
            .field("player_id", &self.player.id())
            .finish()
    }
}

pub type SessionChangedListener = dyn OnChanged<dyn MediaSession>;
pub type PlayerChangedListener = dyn OnChanged<dyn Player>;

/// Holder of the current media session.
pub struct SessionRegistry {
    writer: ReentrantMutex<()>,
    current: Mutex<Option<SessionRecord>>,
    released: AtomicBool,
    player_listeners: ListenerRegistry<dyn PlayerListener>,
    player_changed: ListenerRegistry<PlayerChangedListener>,
    session_changed: ListenerRegistry<SessionChangedListener>,
    event_bus: Option<EventBus>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            writer: ReentrantMutex::new(()),
            current: Mutex::new(None),
            released: AtomicBool::new(false),
            player_listeners: ListenerRegistry::new(),
            player_changed: ListenerRegistry::new(),
            session_changed: ListenerRegistry::new(),
            event_bus: None,
        }
    }

    /// Publish session events on `bus` in addition to listener callbacks.
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn current(&self) -> Option<SessionRecord> {
        self.current.lock().clone()
    }

    pub fn current_session(&self) -> Option<Arc<dyn MediaSession>> {
        self.current.lock().as_ref().map(|record| record.session.clone())
    }

    pub fn current_player(&self) -> Option<Arc<dyn Player>> {
        self.current.lock().as_ref().map(|record| record.player.clone())
    }

    /// Current record if its session carries `session_id`.
    pub fn record_for(&self, session_id: &SessionId) -> Option<SessionRecord> {
        self.current
            .lock()
            .as_ref()
            .filter(|record| record.session.id() == *session_id)
            .cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.current.lock().is_some()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    // ========================================================================
    // Swaps
    // ========================================================================

    /// Make `session` the current session.
    ///
    /// The previous session is released. If the new session carries a
    /// different player, the old player is released too and every registered
    /// player listener moves to the new player before player-changed
    /// listeners run. Returns `false` when `session` is already current or
    /// the registry was released.
    pub fn change_local_session(&self, session: Arc<dyn MediaSession>) -> bool {
        let _writer = self.writer.lock();
        if self.is_released() {
            warn!(session_id = %session.id(), "Ignoring session change on released registry");
            return false;
        }

        let new_player = session.player();
        let previous = {
            let mut current = self.current.lock();
            if let Some(record) = current.as_ref() {
                if same_instance(&record.session, &session) {
                    drop(current);
                    warn!(session_id = %session.id(), "Session is already current");
                    return false;
                }
            }
            current.replace(SessionRecord {
                session: session.clone(),
                player: new_player.clone(),
            })
        };

        match previous {
            None => {
                info!(session_id = %session.id(), player_id = %new_player.id(), "Session initialized");
                self.notify_session_changed(None, &session);
                self.move_player(None, &new_player);
            }
            Some(old) => {
                info!(
                    old_session_id = %old.session.id(),
                    session_id = %session.id(),
                    "Replacing current session"
                );
                old.session.release();
                self.notify_session_changed(Some(&old.session), &session);

                if !same_instance(&old.player, &new_player) {
                    old.player.release();
                    self.move_player(Some(&old.player), &new_player);
                }
            }
        }

        true
    }

    /// Attach `player` to the current session.
    ///
    /// Returns `Ok(false)` when `player` is already the current player.
    pub fn change_session_player(&self, player: Arc<dyn Player>, release_old: bool) -> Result<bool> {
        let _writer = self.writer.lock();
        if self.is_released() {
            return Err(PlaybackError::RegistryReleased);
        }

        let (old_player, session) = {
            let mut current = self.current.lock();
            let record = current.as_mut().ok_or(PlaybackError::SessionNotInitialized)?;
            if same_instance(&record.player, &player) {
                return Ok(false);
            }
            let old = std::mem::replace(&mut record.player, player.clone());
            (old, record.session.clone())
        };

        debug!(
            session_id = %session.id(),
            old_player_id = %old_player.id(),
            player_id = %player.id(),
            release_old,
            "Changing session player"
        );
        session.set_player(player.clone());
        if release_old {
            old_player.release();
        }
        self.move_player(Some(&old_player), &player);

        Ok(true)
    }

    // ========================================================================
    // Listener Management
    // ========================================================================

    /// Register an engine listener. It is attached to the current player
    /// immediately and follows every later player change.
    pub fn register_player_listener(&self, listener: Arc<dyn PlayerListener>) -> bool {
        let _writer = self.writer.lock();
        if self.is_released() {
            return false;
        }
        if !self.player_listeners.register(listener.clone()) {
            return false;
        }
        if let Some(player) = self.current_player() {
            player.add_listener(listener);
        }
        true
    }

    pub fn unregister_player_listener(&self, listener: &Arc<dyn PlayerListener>) -> bool {
        let _writer = self.writer.lock();
        if !self.player_listeners.unregister(listener) {
            return false;
        }
        if let Some(player) = self.current_player() {
            player.remove_listener(listener);
        }
        true
    }

    pub fn register_player_changed(&self, listener: Arc<PlayerChangedListener>) -> bool {
        let _writer = self.writer.lock();
        !self.is_released() && self.player_changed.register(listener)
    }

    pub fn unregister_player_changed(&self, listener: &Arc<PlayerChangedListener>) -> bool {
        let _writer = self.writer.lock();
        self.player_changed.unregister(listener)
    }

    pub fn register_session_changed(&self, listener: Arc<SessionChangedListener>) -> bool {
        let _writer = self.writer.lock();
        !self.is_released() && self.session_changed.register(listener)
    }

    pub fn unregister_session_changed(&self, listener: &Arc<SessionChangedListener>) -> bool {
        let _writer = self.writer.lock();
        self.session_changed.unregister(listener)
    }

    pub fn player_listener_count(&self) -> usize {
        self.player_listeners.len()
    }

    // ========================================================================
    // Release
    // ========================================================================

    /// Detach all listeners and release the current session and player.
    /// Idempotent.
    pub fn release(&self) {
        let _writer = self.writer.lock();
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }

        let record = self.current.lock().take();
        let engine_listeners = self.player_listeners.clear();
        self.player_changed.clear();
        self.session_changed.clear();

        if let Some(record) = record {
            for listener in &engine_listeners {
                record.player.remove_listener(listener);
            }
            let session_id = record.session.id();
            record.session.release();
            record.player.release();
            info!(session_id = %session_id, "Session registry released");
            self.emit(SessionEvent::Released {
                session_id: session_id.to_string(),
            });
        }
    }

    // ========================================================================
    // Fan-out
    // ========================================================================

    fn notify_session_changed(&self, old: Option<&Arc<dyn MediaSession>>, new: &Arc<dyn MediaSession>) {
        self.session_changed
            .dispatch(|listener| listener.on_changed(old, new));
        self.emit(SessionEvent::SessionChanged {
            old_session_id: old.map(|session| session.id().to_string()),
            new_session_id: new.id().to_string(),
        });
    }

    fn move_player(&self, old: Option<&Arc<dyn Player>>, new: &Arc<dyn Player>) {
        for listener in self.player_listeners.snapshot() {
            if let Some(old) = old {
                old.remove_listener(&listener);
            }
            new.add_listener(listener);
        }

        self.player_changed
            .dispatch(|listener| listener.on_changed(old, new));

        let session_id = self
            .current_session()
            .map(|session| session.id().to_string())
            .unwrap_or_default();
        self.emit(SessionEvent::PlayerChanged {
            session_id,
            old_player_id: old.map(|player| player.id().to_string()),
            new_player_id: new.id().to_string(),
        });
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Session(event));
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

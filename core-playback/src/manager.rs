//! # Session Manager
//!
//! Host-facing owner of the [`SessionRegistry`]. Adds the one-shot
//! initialization guard, a cancellation scope for everything bound to the
//! session, and the [`PlaybackConnection`] surface handed to controllers.

use crate::connection::PlaybackConnection;
use crate::error::Result;
use crate::listeners::OnChanged;
use crate::registry::{SessionChangedListener, SessionRecord, SessionRegistry};
use bridge_traits::{MediaSession, Player, PlayerListener, SessionId};
use core_async::sync::CancellationToken;
use core_runtime::events::EventBus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub struct SessionManager {
    registry: SessionRegistry,
    scope: CancellationToken,
    released: AtomicBool,
}

impl SessionManager {
    /// Create a manager whose scope is a child of `parent`.
    pub fn new(parent: &CancellationToken, event_bus: Option<EventBus>) -> Self {
        let registry = match event_bus {
            Some(bus) => SessionRegistry::new().with_event_bus(bus),
            None => SessionRegistry::new(),
        };
        Self {
            registry,
            scope: parent.child_token(),
            released: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Cancelled when the manager is released or its parent scope ends.
    pub fn scope(&self) -> CancellationToken {
        self.scope.clone()
    }

    /// Install the first session. Later calls are ignored.
    pub fn initialize_session(&self, session: Arc<dyn MediaSession>) -> bool {
        if self.is_released() {
            warn!(session_id = %session.id(), "Session manager already released");
            return false;
        }
        if self.registry.is_initialized() {
            warn!(session_id = %session.id(), "Session already initialized");
            return false;
        }
        self.registry.change_local_session(session)
    }

    pub fn change_local_session(&self, session: Arc<dyn MediaSession>) -> bool {
        if self.is_released() {
            return false;
        }
        self.registry.change_local_session(session)
    }

    pub fn change_session_player(&self, player: Arc<dyn Player>, release_old: bool) -> Result<bool> {
        self.registry.change_session_player(player, release_old)
    }

    pub fn current(&self) -> Option<SessionRecord> {
        self.registry.current()
    }

    pub fn current_session(&self) -> Option<Arc<dyn MediaSession>> {
        self.registry.current_session()
    }

    pub fn current_session_id(&self) -> Option<SessionId> {
        self.registry.current_session().map(|session| session.id())
    }

    pub fn session_player(&self) -> Option<Arc<dyn Player>> {
        self.registry.current_player()
    }

    pub fn register_session_changed(&self, listener: Arc<SessionChangedListener>) -> bool {
        !self.is_released() && self.registry.register_session_changed(listener)
    }

    pub fn unregister_session_changed(&self, listener: &Arc<SessionChangedListener>) -> bool {
        self.registry.unregister_session_changed(listener)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Cancel the scope and release the registry. Idempotent.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Releasing session manager");
        self.scope.cancel();
        self.registry.release();
    }
}

impl PlaybackConnection for SessionManager {
    fn player(&self, session_id: &SessionId) -> Option<Arc<dyn Player>> {
        self.registry.record_for(session_id).map(|record| record.player)
    }

    fn register_player_listener(&self, listener: Arc<dyn PlayerListener>) -> bool {
        !self.is_released() && self.registry.register_player_listener(listener)
    }

    fn unregister_player_listener(&self, listener: &Arc<dyn PlayerListener>) -> bool {
        self.registry.unregister_player_listener(listener)
    }

    fn register_player_changed(&self, listener: Arc<dyn OnChanged<dyn Player>>) -> bool {
        !self.is_released() && self.registry.register_player_changed(listener)
    }

    fn unregister_player_changed(&self, listener: &Arc<dyn OnChanged<dyn Player>>) -> bool {
        self.registry.unregister_player_changed(listener)
    }
}

//! In-memory media session.

use bridge_traits::{
    playback::Player,
    session::{MediaSession, SessionId},
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Session that simply carries its current player.
pub struct LocalSession {
    id: SessionId,
    player: Mutex<Arc<dyn Player>>,
    released: AtomicBool,
    release_calls: AtomicUsize,
}

impl LocalSession {
    pub fn new(id: impl Into<SessionId>, player: Arc<dyn Player>) -> Self {
        Self {
            id: id.into(),
            player: Mutex::new(player),
            released: AtomicBool::new(false),
            release_calls: AtomicUsize::new(0),
        }
    }

    /// Number of times [`MediaSession::release`] has been called.
    pub fn release_count(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for LocalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSession")
            .field("id", &self.id)
            .field("released", &self.released.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl MediaSession for LocalSession {
    fn id(&self) -> SessionId {
        self.id.clone()
    }

    fn player(&self) -> Arc<dyn Player> {
        Arc::clone(&self.player.lock())
    }

    fn set_player(&self, player: Arc<dyn Player>) {
        *self.player.lock() = player;
    }

    fn release(&self) {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        if !self.released.swap(true, Ordering::SeqCst) {
            debug!(session_id = %self.id, "Session released");
        }
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::LocalPlayer;
    use bridge_traits::platform::same_instance;

    #[test]
    fn set_player_swaps_without_releasing() {
        let first: Arc<dyn Player> = Arc::new(LocalPlayer::new());
        let second: Arc<dyn Player> = Arc::new(LocalPlayer::new());
        let session = LocalSession::new("FLAMM", first.clone());

        session.set_player(second.clone());

        assert!(same_instance(&session.player(), &second));
        assert!(!first.is_released());
        assert!(!session.is_released());
    }

    #[test]
    fn release_counts_every_call() {
        let session = LocalSession::new("FLAMM", Arc::new(LocalPlayer::new()));
        session.release();
        session.release();
        assert!(session.is_released());
        assert_eq!(session.release_count(), 2);
        assert_eq!(session.id().as_str(), "FLAMM");
    }
}

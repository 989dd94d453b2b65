//! Capability surface controllers and collectors use to reach the engine.

use crate::listeners::OnChanged;
use bridge_traits::{Player, PlayerListener, SessionId};
use std::sync::Arc;

/// Lookup and subscription surface offered by the session owner.
///
/// Player listeners registered here follow the current player across swaps.
pub trait PlaybackConnection: Send + Sync {
    /// Player of the current session, if `session_id` names it.
    fn player(&self, session_id: &SessionId) -> Option<Arc<dyn Player>>;

    fn register_player_listener(&self, listener: Arc<dyn PlayerListener>) -> bool;

    fn unregister_player_listener(&self, listener: &Arc<dyn PlayerListener>) -> bool;

    fn register_player_changed(&self, listener: Arc<dyn OnChanged<dyn Player>>) -> bool;

    fn unregister_player_changed(&self, listener: &Arc<dyn OnChanged<dyn Player>>) -> bool;
}

//! Media session bridge trait.
//!
//! A session is the host's logical playback context: it is what remote
//! controllers connect to, and it carries the current [`Player`]. The core
//! keeps at most one live session at a time.

use crate::{platform::PlatformSendSync, playback::Player};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifier controllers use to address a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Host media session wrapping the current player.
pub trait MediaSession: PlatformSendSync {
    fn id(&self) -> SessionId;

    /// Player currently attached to this session.
    fn player(&self) -> Arc<dyn Player>;

    /// Attach a different player without replacing the session.
    fn set_player(&self, player: Arc<dyn Player>);

    /// Release session resources. Does not release the attached player.
    fn release(&self);

    fn is_released(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_round_trips_as_plain_string() {
        let id = SessionId::new("FLAMM");
        assert_eq!(id.as_str(), "FLAMM");
        assert_eq!(id.to_string(), "FLAMM");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"FLAMM\"");
        assert_eq!(SessionId::from("FLAMM"), id);
    }
}

//! # Playback Error Types
//!
//! Errors raised by the session layer itself. Transport command failures are
//! not errors: controllers report them as unsuccessful request results.

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Errors that can occur in the session registry and its configuration.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// An operation needed a current session but none was installed yet.
    #[error("No session has been initialized")]
    SessionNotInitialized,

    /// The registry was released and no longer accepts swaps.
    #[error("Session registry already released")]
    RegistryReleased,

    /// Configuration value out of range.
    #[error("Invalid playback configuration: {0}")]
    Config(String),

    /// No runtime was injected and none drives the calling thread.
    #[error("No async runtime available for playback tasks")]
    NoRuntime,

    /// Error reported by the host engine.
    #[error("Engine error: {0}")]
    Bridge(#[from] BridgeError),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            PlaybackError::SessionNotInitialized => true,
            PlaybackError::Bridge(err) => matches!(err, BridgeError::NotAvailable(_)),
            _ => false,
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(PlaybackError::SessionNotInitialized.is_transient());
        assert!(PlaybackError::Bridge(BridgeError::NotAvailable("engine".into())).is_transient());
        assert!(!PlaybackError::RegistryReleased.is_transient());
        assert!(!PlaybackError::Bridge(BridgeError::Rejected("index".into())).is_transient());
    }
}

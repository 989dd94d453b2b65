//! Errors raised while configuring the runtime or installing logging.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value is unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid log filter '{filter}': {reason}")]
    LogFilter { filter: String, reason: String },

    /// A global `tracing` subscriber is already installed.
    #[error("Logging already initialized: {0}")]
    LoggingInstalled(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_error_names_the_directive() {
        let err = Error::LogFilter {
            filter: "core_playback=verbose".to_string(),
            reason: "invalid level".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid log filter 'core_playback=verbose': invalid level"
        );
    }
}

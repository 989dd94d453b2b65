//! # Playback Configuration
//!
//! Tuning for controllers and collectors.

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Controller and collector configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaybackConfig {
    /// Poll intervals shorter than this are treated as "don't poll".
    ///
    /// Default: 100 ms.
    #[serde(default = "default_min_poll_interval")]
    pub min_poll_interval: Duration,

    /// Upper bound applied by the seek-bar interval handler.
    ///
    /// Default: 1 second.
    #[serde(default = "default_max_poll_interval")]
    pub max_poll_interval: Duration,

    /// Interval used by progression collectors without a custom handler
    /// while the player is playing.
    ///
    /// Default: 500 ms.
    #[serde(default = "default_poll_interval")]
    pub default_poll_interval: Duration,

    /// How long [`RequestResult::wait`](crate::RequestResult::wait) waits for
    /// observers to refresh.
    ///
    /// Default: 5 seconds.
    #[serde(default = "default_fan_out_timeout")]
    pub fan_out_timeout: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            min_poll_interval: default_min_poll_interval(),
            max_poll_interval: default_max_poll_interval(),
            default_poll_interval: default_poll_interval(),
            fan_out_timeout: default_fan_out_timeout(),
        }
    }
}

impl PlaybackConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.min_poll_interval.is_zero() {
            return Err(PlaybackError::Config(
                "min_poll_interval must be > 0".to_string(),
            ));
        }

        if self.max_poll_interval < self.min_poll_interval {
            return Err(PlaybackError::Config(
                "max_poll_interval cannot be shorter than min_poll_interval".to_string(),
            ));
        }

        if self.default_poll_interval < self.min_poll_interval
            || self.default_poll_interval > self.max_poll_interval
        {
            return Err(PlaybackError::Config(
                "default_poll_interval must lie between min_poll_interval and max_poll_interval"
                    .to_string(),
            ));
        }

        if self.fan_out_timeout.is_zero() {
            return Err(PlaybackError::Config(
                "fan_out_timeout must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Discard handler results below the polling floor.
    pub(crate) fn accept_interval(&self, interval: Option<Duration>) -> Option<Duration> {
        interval.filter(|interval| *interval >= self.min_poll_interval)
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_min_poll_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_max_poll_interval() -> Duration {
    Duration::from_millis(1000)
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_fan_out_timeout() -> Duration {
    Duration::from_secs(5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PlaybackConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_poll_interval, Duration::from_millis(100));
        assert_eq!(config.max_poll_interval, Duration::from_millis(1000));
    }

    #[test]
    fn rejects_inverted_bounds() {
        let config = PlaybackConfig {
            max_poll_interval: Duration::from_millis(50),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PlaybackError::Config(_))));
    }

    #[test]
    fn rejects_default_outside_bounds() {
        let config = PlaybackConfig {
            default_poll_interval: Duration::from_secs(2),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: PlaybackConfig =
            serde_json::from_str(r#"{"default_poll_interval":{"secs":0,"nanos":250000000}}"#)
                .unwrap();
        assert_eq!(config.default_poll_interval, Duration::from_millis(250));
        assert_eq!(config.fan_out_timeout, Duration::from_secs(5));
    }

    #[test]
    fn accept_interval_applies_floor() {
        let config = PlaybackConfig::default();
        assert_eq!(config.accept_interval(Some(Duration::from_millis(99))), None);
        assert_eq!(
            config.accept_interval(Some(Duration::from_millis(100))),
            Some(Duration::from_millis(100))
        );
        assert_eq!(config.accept_interval(None), None);
    }
}

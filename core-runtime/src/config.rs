//! # Core Configuration Module
//!
//! Configuration for the playback session core.
//!
//! ## Overview
//!
//! The configuration uses a builder to construct a [`CoreConfig`] holding the
//! host-provided bridges and service settings. `build()` fails fast with an
//! actionable [`Error::Config`] when a value is unusable. Engines own their
//! time source; hosts hand a clock to the player they construct.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .session_id("FLAMM")
//!     .event_buffer_size(256)
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.session_id.as_str(), "FLAMM");
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Session ids must not be blank
//! CoreConfig::builder()
//!     .session_id("  ")
//!     .build()
//!     .expect("Should fail - blank session id");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use crate::logging::LoggingConfig;
use bridge_traits::{LoggerSink, SessionId};
use std::sync::Arc;

/// Session id used when the host does not choose one.
pub const DEFAULT_SESSION_ID: &str = "FLAMM";

/// Largest event buffer accepted by [`CoreConfig::validate`].
pub const MAX_EVENT_BUFFER_SIZE: usize = 65_536;

/// Core configuration for the playback session core.
#[derive(Clone)]
pub struct CoreConfig {
    /// Id of the single local session
    pub session_id: SessionId,

    /// Per-subscriber buffer of the event bus
    pub event_buffer_size: usize,

    /// Optional host log sink; wired into [`LoggingConfig`] by
    /// [`CoreConfig::logging_config`]
    pub logger_sink: Option<Arc<dyn LoggerSink>>,

    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("session_id", &self.session_id)
            .field("event_buffer_size", &self.event_buffer_size)
            .field(
                "logger_sink",
                &self.logger_sink.as_ref().map(|_| "LoggerSink { ... }"),
            )
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional behaviour of the service host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Publish lifecycle, session and command events on the event bus
    pub publish_events: bool,

    /// Release the session when the service stops, not only when destroyed
    pub release_session_on_stop: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            publish_events: true,
            release_session_on_stop: false,
        }
    }
}

impl CoreConfig {
    /// Creates a new builder with default settings.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        let id = self.session_id.as_str();
        if id.trim().is_empty() {
            return Err(Error::Config(
                "session_id must not be empty. Use a stable, host-unique identifier such as \
                 the default \"FLAMM\"."
                    .to_string(),
            ));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(Error::Config(format!(
                "session_id '{}' must not contain whitespace",
                id
            )));
        }
        if self.event_buffer_size == 0 || self.event_buffer_size > MAX_EVENT_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "event_buffer_size must be between 1 and {}, got {}",
                MAX_EVENT_BUFFER_SIZE, self.event_buffer_size
            )));
        }
        Ok(())
    }

    /// Logging configuration forwarding to the configured host sink, if any.
    pub fn logging_config(&self) -> LoggingConfig {
        match &self.logger_sink {
            Some(sink) => LoggingConfig::default().with_logger_sink(Arc::clone(sink)),
            None => LoggingConfig::default(),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            session_id: SessionId::new(DEFAULT_SESSION_ID),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            logger_sink: None,
            features: FeatureFlags::default(),
        }
    }
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    session_id: Option<SessionId>,
    event_buffer_size: Option<usize>,
    logger_sink: Option<Arc<dyn LoggerSink>>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the local session id.
    ///
    /// Default: `"FLAMM"`
    pub fn session_id(mut self, id: impl Into<SessionId>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    /// Sets the event bus buffer size.
    ///
    /// Default: 100 events
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the host log sink.
    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    pub fn publish_events(mut self, enabled: bool) -> Self {
        self.features.publish_events = enabled;
        self
    }

    pub fn release_session_on_stop(mut self, enabled: bool) -> Self {
        self.features.release_session_on_stop = enabled;
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<CoreConfig> {
        let defaults = CoreConfig::default();
        let config = CoreConfig {
            session_id: self.session_id.unwrap_or(defaults.session_id),
            event_buffer_size: self.event_buffer_size.unwrap_or(defaults.event_buffer_size),
            logger_sink: self.logger_sink,
            features: self.features,
        };

        config.validate()?;
        Ok(config)
    }
}

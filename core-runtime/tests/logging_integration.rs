//! Integration tests for logging system

use async_trait::async_trait;
use bridge_traits::error::Result as SinkResult;
use bridge_traits::logging::{LogEntry, LogLevel, LoggerSink};
use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LoggingConfig};
use core_runtime::Error;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct CollectingSink {
    entries: Mutex<Vec<LogEntry>>,
}

#[async_trait]
impl LoggerSink for CollectingSink {
    async fn log(&self, entry: LogEntry) -> SinkResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Warn
    }
}

#[test]
fn test_global_init_forwards_to_sink_and_rejects_second_init() {
    let sink = Arc::new(CollectingSink::default());
    let config = CoreConfig::builder()
        .logger_sink(sink.clone())
        .build()
        .unwrap()
        .logging_config()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Debug);

    init_logging(config).unwrap();

    tracing::debug!(target: "core_playback::controller", "below sink level");
    tracing::warn!(target: "core_playback::registry", title = "Secret Song", "redundant swap");

    {
        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "redundant swap");
        assert_eq!(
            entries[0].fields.get("title"),
            Some(&"[REDACTED]".to_string())
        );
    }

    let second = init_logging(LoggingConfig::default());
    assert!(matches!(second, Err(Error::LoggingInstalled(_))));
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LoggingConfig::default().format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LoggingConfig::default().format, LogFormat::Json);
}

#[test]
fn test_redaction_helpers() {
    assert_eq!(redact_if_sensitive("artist", "Someone"), "[REDACTED]");
    assert_eq!(
        redact_if_sensitive("uri", "file:///music/album/track.flac"),
        "track.flac"
    );
    assert_eq!(redact_if_sensitive("controller_id", "c-1"), "c-1");
}

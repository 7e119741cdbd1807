//! Logger dependency for the event bus and blackboard.
//!
//! The bus and coordinator never reach for a global logger directly; they
//! hold an `Arc<dyn FleetLogger>` handed to them at construction.
//! [`LogFacade`] forwards to the `log` crate and is what production code
//! uses. [`RecordingLogger`] keeps every record in memory so tests can
//! assert on exact messages.

use std::fmt;

use parking_lot::Mutex;
use serde_json::Value;

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured logger used by the coordination layer.
///
/// `fields` carries the structured part of a record (event data, error
/// payloads). Implementors decide how to render it.
pub trait FleetLogger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str, fields: Option<&Value>);

    fn debug(&self, message: &str, fields: Option<&Value>) {
        self.log(LogLevel::Debug, message, fields);
    }

    fn info(&self, message: &str, fields: Option<&Value>) {
        self.log(LogLevel::Info, message, fields);
    }

    fn warn(&self, message: &str, fields: Option<&Value>) {
        self.log(LogLevel::Warn, message, fields);
    }

    fn error(&self, message: &str, fields: Option<&Value>) {
        self.log(LogLevel::Error, message, fields);
    }
}

/// Forwards records to the `log` facade.
///
/// Fields are appended as compact JSON. The `target` defaults to
/// `aqe_fleet` and can be narrowed per component.
#[derive(Debug, Clone)]
pub struct LogFacade {
    target: String,
}

impl Default for LogFacade {
    fn default() -> Self {
        Self::new("aqe_fleet")
    }
}

impl LogFacade {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl FleetLogger for LogFacade {
    fn log(&self, level: LogLevel, message: &str, fields: Option<&Value>) {
        let level = match level {
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        };
        match fields {
            Some(fields) => log::log!(target: self.target.as_str(), level, "{} {}", message, fields),
            None => log::log!(target: self.target.as_str(), level, "{}", message),
        }
    }
}

/// A single captured record.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub fields: Option<Value>,
}

/// In-memory logger that captures every record.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured records, oldest first.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Captured records at one level.
    pub fn at_level(&self, level: LogLevel) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == level)
            .cloned()
            .collect()
    }

    /// Whether a record with exactly this level and message was captured.
    pub fn contains(&self, level: LogLevel, message: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|r| r.level == level && r.message == message)
    }

    /// First record with this level and message, if any.
    pub fn find(&self, level: LogLevel, message: &str) -> Option<LogRecord> {
        self.records
            .lock()
            .iter()
            .find(|r| r.level == level && r.message == message)
            .cloned()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl FleetLogger for RecordingLogger {
    fn log(&self, level: LogLevel, message: &str, fields: Option<&Value>) {
        self.records.lock().push(LogRecord {
            level,
            message: message.to_string(),
            fields: fields.cloned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recording_logger_captures_in_order() {
        let logger = RecordingLogger::new();
        logger.info("first", None);
        logger.error("second", Some(&json!({"code": 7})));

        let records = logger.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level, LogLevel::Info);
        assert_eq!(records[0].message, "first");
        assert_eq!(records[1].fields, Some(json!({"code": 7})));
    }

    #[test]
    fn test_recording_logger_queries() {
        let logger = RecordingLogger::new();
        logger.debug("noise", None);
        logger.warn("careful", None);

        assert!(logger.contains(LogLevel::Warn, "careful"));
        assert!(!logger.contains(LogLevel::Info, "careful"));
        assert_eq!(logger.at_level(LogLevel::Debug).len(), 1);

        logger.clear();
        assert!(logger.records().is_empty());
    }

    #[test]
    fn test_log_facade_does_not_panic_without_subscriber() {
        let _ = env_logger::builder().is_test(true).try_init();
        let logger = LogFacade::new("aqe_fleet::test");
        logger.info("hello", Some(&json!({"a": 1})));
        logger.error("bye", None);
        assert_eq!(logger.target(), "aqe_fleet::test");
    }
}

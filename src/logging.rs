//! Structured logging for the link benchmark
//!
//! This module provides:
//! - Levelled, structured log entries with arbitrary JSON fields
//! - Console, JSON and compact output formats
//! - Session and per-test correlation IDs
//! - An in-memory sink so tests can assert on what was logged
//!
//! The benchmark engine runs to completion on a single task, so entries are
//! written synchronously as soon as they are built.

use crate::error::{BenchmarkError, Result};
use crate::models::Config;
use chrono::{DateTime, Utc};
use colored::{Color, Colorize};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Trace level - stale events, per-frame details
    Trace = 0,
    /// Debug level - state transitions
    Debug = 1,
    /// Info level - test lifecycle
    Info = 2,
    /// Warning level - remote failures, aborts
    Warn = 3,
    /// Error level - the node cannot continue the test
    Error = 4,
    /// Fatal level - the process is about to exit
    Fatal = 5,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Console color of the level tag
    pub fn color(&self) -> Color {
        match self {
            LogLevel::Trace => Color::White,
            LogLevel::Debug => Color::Cyan,
            LogLevel::Info => Color::Green,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
            LogLevel::Fatal => Color::Magenta,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = BenchmarkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            _ => Err(BenchmarkError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// One structured log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Logger name/component
    pub logger: String,
    /// Correlation ID for tracking related events
    pub correlation_id: Option<String>,
    /// Additional structured fields
    pub fields: HashMap<String, serde_json::Value>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// JSON format for structured logging
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = BenchmarkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "console" => Ok(LogFormat::Console),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(BenchmarkError::parse(format!("Invalid log format: {}", s))),
        }
    }
}

/// Where formatted entries go
#[derive(Debug, Clone)]
pub enum LogSink {
    /// stderr for warnings and above, stdout for the rest
    Console,
    /// Keep entries in memory
    Memory(Arc<Mutex<Vec<LogEntry>>>),
    /// Drop everything
    Silent,
}

/// State shared by a logger and everything derived from it with [`Logger::named`]
#[derive(Debug, Default)]
struct LogContext {
    session_id: Option<String>,
    current_correlation_id: Option<String>,
    context_fields: HashMap<String, serde_json::Value>,
}

/// Named, levelled logger writing to a [`LogSink`]
///
/// Clones share their context (session id, correlation id, context fields).
#[derive(Debug, Clone)]
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    format: LogFormat,
    name: String,
    sink: LogSink,
    context: Arc<Mutex<LogContext>>,
}

impl Logger {
    /// Create a new logger
    pub fn new(name: &str) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            format: LogFormat::Console,
            name: name.to_string(),
            sink: LogSink::Console,
            context: Arc::new(Mutex::new(LogContext::default())),
        }
    }

    /// Logger that discards all entries
    pub fn silent(name: &str) -> Self {
        Self {
            sink: LogSink::Silent,
            ..Self::new(name)
        }
    }

    /// Logger that records every entry at or above `min_level`
    pub fn memory(name: &str, min_level: LogLevel) -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        let logger = Self {
            min_level,
            sink: LogSink::Memory(Arc::clone(&entries)),
            ..Self::new(name)
        };
        (logger, entries)
    }

    /// Console logger configured from `config`, opening a new session
    pub fn with_config(name: &str, config: &Config) -> Self {
        let configured = config.log_level.parse().unwrap_or(LogLevel::Info);
        let min_level = if config.debug {
            LogLevel::Debug.min(configured)
        } else if config.verbose {
            LogLevel::Info.min(configured)
        } else {
            configured
        };

        let context = LogContext {
            session_id: Some(Uuid::new_v4().to_string()),
            ..LogContext::default()
        };
        Self {
            min_level,
            use_color: config.enable_color,
            format: config.log_format.parse().unwrap_or(LogFormat::Console),
            name: name.to_string(),
            sink: LogSink::Console,
            context: Arc::new(Mutex::new(context)),
        }
    }

    pub fn session_id(&self) -> Option<String> {
        self.context.lock().ok().and_then(|context| context.session_id.clone())
    }

    /// Derive a logger for a sub-component sharing this logger's context
    pub fn named(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add context field for all subsequent log entries
    pub fn add_context_field<T: Serialize>(&self, key: &str, value: T) {
        if let Ok(json_value) = serde_json::to_value(value) {
            if let Ok(mut context) = self.context.lock() {
                context.context_fields.insert(key.to_string(), json_value);
            }
        }
    }

    /// Start a correlated operation
    pub fn start_operation(&self, operation_name: &str) -> String {
        let correlation_id = Uuid::new_v4().to_string();
        if let Ok(mut context) = self.context.lock() {
            context.current_correlation_id = Some(correlation_id.clone());
        }

        self.info(&format!("Started operation: {}", operation_name))
            .field("operation", operation_name)
            .field("operation_type", "start")
            .log();

        correlation_id
    }

    /// End a correlated operation
    pub fn end_operation(&self, correlation_id: &str, operation_name: &str, success: bool) {
        self.info(&format!("Completed operation: {} (success: {})", operation_name, success))
            .correlation_id(correlation_id)
            .field("operation", operation_name)
            .field("operation_type", "end")
            .field("success", success)
            .log();

        if let Ok(mut context) = self.context.lock() {
            if context.current_correlation_id.as_deref() == Some(correlation_id) {
                context.current_correlation_id = None;
            }
        }
    }

    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn trace(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Trace, message)
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    fn write_entry(&self, mut entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }

        if let Ok(context) = self.context.lock() {
            if let Some(session_id) = &context.session_id {
                entry
                    .fields
                    .insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
            }
            if entry.correlation_id.is_none() {
                entry.correlation_id = context.current_correlation_id.clone();
            }
            for (key, value) in &context.context_fields {
                entry.fields.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }

        match &self.sink {
            LogSink::Silent => {}
            LogSink::Memory(entries) => {
                if let Ok(mut entries) = entries.lock() {
                    entries.push(entry);
                }
            }
            LogSink::Console => {
                let output = match self.format {
                    LogFormat::Console => self.format_console(&entry),
                    LogFormat::Json => self.format_json(&entry),
                    LogFormat::Compact => self.format_compact(&entry),
                };

                // Write to stderr for errors/warnings, stdout for others
                if entry.level >= LogLevel::Warn {
                    let _ = writeln!(io::stderr(), "{}", output);
                } else {
                    let _ = writeln!(io::stdout(), "{}", output);
                }
            }
        }
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let padded = format!("{:>5}", level_str);
        let formatted_level = if self.use_color {
            padded.color(entry.level.color()).to_string()
        } else {
            padded
        };

        let mut output = format!("{} {} [{}] {}", timestamp, formatted_level, entry.logger, entry.message);

        if let Some(correlation_id) = &entry.correlation_id {
            let short: String = correlation_id.chars().take(8).collect();
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let mut fields_str: Vec<String> = entry
                .fields
                .iter()
                .filter(|(k, _)| k.as_str() != "session_id")
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            fields_str.sort();
            if !fields_str.is_empty() {
                output.push_str(&format!(" {{{}}}", fields_str.join(", ")));
            }
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => format!(
                "{{\"error\": \"Failed to serialize log entry\", \"message\": \"{}\"}}",
                entry.message
            ),
        }
    }

    fn format_compact(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%H:%M:%S%.3f");
        format!(
            "{} {} {}: {}",
            timestamp,
            entry.level.as_str().chars().next().unwrap_or('?'),
            entry.logger,
            entry.message
        )
    }
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: HashMap::new(),
            },
        }
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Add error information
    pub fn error_info(self, error: &BenchmarkError) -> Self {
        self.field("error", error.to_string())
            .field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
    }

    /// Finalize and write the log entry
    pub fn log(self) {
        if self.logger.would_log(self.entry.level) {
            self.logger.write_entry(self.entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert!(LogLevel::from_str("invalid").is_err());
    }

    #[test]
    fn test_verbose_lowers_threshold_to_info() {
        let config = Config {
            log_level: "error".into(),
            verbose: true,
            ..Default::default()
        };
        let logger = Logger::with_config("TEST", &config);
        assert!(logger.would_log(LogLevel::Info));
        assert!(!logger.would_log(LogLevel::Debug));
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::from_str("JSON").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("compact").unwrap(), LogFormat::Compact);
        assert!(LogFormat::from_str("xml").is_err());
    }

    #[test]
    fn test_logger_with_config() {
        let config = Config {
            debug: true,
            enable_color: false,
            ..Default::default()
        };

        let logger = Logger::with_config("TEST", &config);
        assert_eq!(logger.min_level, LogLevel::Debug);
        assert!(!logger.use_color);
        assert!(logger.session_id().is_some());

        let quiet = Logger::with_config("TEST", &Config { log_level: "warn".into(), ..Default::default() });
        assert!(!quiet.would_log(LogLevel::Info));
    }

    #[test]
    fn test_memory_sink_filters_by_level() {
        let (logger, entries) = Logger::memory("TEST", LogLevel::Info);
        logger.debug("hidden").log();
        logger.warn("shown").field("peer", "0001").log();

        let entries = entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "shown");
        assert_eq!(entries[0].fields["peer"], serde_json::json!("0001"));
    }

    #[test]
    fn test_operation_correlation_applies_to_entries() {
        let (logger, entries) = Logger::memory("TEST", LogLevel::Trace);
        let id = logger.start_operation("benchmark test");
        logger.debug("inside").log();
        logger.end_operation(&id, "benchmark test", true);
        logger.debug("outside").log();

        let entries = entries.lock().unwrap();
        assert_eq!(entries[1].correlation_id.as_deref(), Some(id.as_str()));
        assert_eq!(entries[3].correlation_id, None);
    }

    #[test]
    fn test_named_logger_shares_context() {
        let (logger, entries) = Logger::memory("ENGINE", LogLevel::Info);
        logger.add_context_field("node", "0001");
        logger.named("LINK").info("hello").log();

        let entries = entries.lock().unwrap();
        assert_eq!(entries[0].logger, "LINK");
        assert_eq!(entries[0].fields["node"], serde_json::json!("0001"));
    }

    #[test]
    fn test_log_formats() {
        let entry = LogEntry {
            timestamp: Utc::now(),
            level: LogLevel::Info,
            message: "Test message".to_string(),
            logger: "TEST".to_string(),
            correlation_id: Some("test-id-12345".to_string()),
            fields: {
                let mut map = HashMap::new();
                map.insert("key".to_string(), serde_json::Value::String("value".to_string()));
                map
            },
        };

        let logger = Logger::new("TEST");

        let console_output = logger.format_console(&entry);
        assert!(console_output.contains("INFO"));
        assert!(console_output.contains("Test message"));
        assert!(console_output.contains("test-id-"));

        let json_output = logger.format_json(&entry);
        assert!(json_output.starts_with('{'));
        assert!(json_output.ends_with('}'));

        let compact_output = logger.format_compact(&entry);
        assert!(compact_output.contains(" I "));
        assert!(compact_output.contains("Test message"));
    }

    #[test]
    fn test_session_id_shared_by_named_loggers() {
        let logger = Logger::with_config("lbm", &Config::default());
        let child = logger.named("udp");
        assert_eq!(child.name(), "udp");
        assert_eq!(child.session_id(), logger.session_id());
        assert!(Logger::new("TEST").session_id().is_none());
    }

    #[test]
    fn test_error_info_fields() {
        let (logger, entries) = Logger::memory("TEST", LogLevel::Trace);
        logger
            .warn("Start rejected")
            .error_info(&BenchmarkError::timeout("no ACK"))
            .log();

        let entries = entries.lock().unwrap();
        let line = serde_json::to_string(&entries[0]).unwrap();
        let parsed: LogEntry = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed.level, LogLevel::Warn);
        assert_eq!(parsed.fields["error"], serde_json::json!("Timeout: no ACK"));
        assert!(parsed.fields.contains_key("error_category"));
    }
}

//! Structured query log
//!
//! - Structured logs (JSON), one line = one event
//! - Deterministic key ordering
//! - Explicit levels with a configurable verbosity cutoff
//! - Synchronous, no buffering
//!
//! `Query` is the most verbose level; enabling it emits every rendered
//! statement, including BEGIN/COMMIT/ROLLBACK, tagged with the
//! operation's trace id. Logging is purely observational and never
//! affects operation semantics.

use std::fmt;
use std::io::{self, Write};

/// Log levels, least verbose first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Nothing is emitted
    Off = 0,
    /// Operation failures
    Error = 1,
    /// Recoverable issues
    Warn = 2,
    /// Normal operations
    Info = 3,
    /// Every issued statement
    Query = 4,
}

impl LogLevel {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "OFF",
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Query => "QUERY",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A leveled, structured logger scoped to one client.
///
/// Events at or below the configured verbosity are emitted; query
/// events go to stdout, errors to stderr.
#[derive(Debug, Clone)]
pub struct QueryLog {
    level: LogLevel,
}

impl QueryLog {
    /// Creates a logger with the given verbosity cutoff
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// Returns the configured verbosity
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Checks whether events of a level would be emitted
    pub fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Off && level <= self.level
    }

    /// Log a statement at QUERY level
    pub fn query(&self, trace_id: &str, statement: &str) {
        if self.enabled(LogLevel::Query) {
            Self::log_to_writer(
                LogLevel::Query,
                "query",
                &[("statement", statement), ("trace_id", trace_id)],
                &mut io::stdout(),
            );
        }
    }

    /// Log at INFO level
    pub fn info(&self, event: &str, fields: &[(&str, &str)]) {
        if self.enabled(LogLevel::Info) {
            Self::log_to_writer(LogLevel::Info, event, fields, &mut io::stdout());
        }
    }

    /// Log at WARN level
    pub fn warn(&self, event: &str, fields: &[(&str, &str)]) {
        if self.enabled(LogLevel::Warn) {
            Self::log_to_writer(LogLevel::Warn, event, fields, &mut io::stdout());
        }
    }

    /// Log at ERROR level (stderr)
    pub fn error(&self, event: &str, fields: &[(&str, &str)]) {
        if self.enabled(LogLevel::Error) {
            Self::log_to_writer(LogLevel::Error, event, fields, &mut io::stderr());
        }
    }

    /// Internal log implementation that writes to a given writer
    fn log_to_writer<W: Write>(
        level: LogLevel,
        event: &str,
        fields: &[(&str, &str)],
        writer: &mut W,
    ) {
        // Build JSON manually to keep ordering deterministic
        let mut output = String::with_capacity(256);

        output.push('{');

        // Always output event first
        output.push_str("\"event\":\"");
        Self::escape_json_string(&mut output, event);
        output.push('"');

        // Then level
        output.push_str(",\"level\":\"");
        output.push_str(level.as_str());
        output.push('"');

        // Sort fields alphabetically for deterministic output
        let mut sorted_fields: Vec<_> = fields.iter().collect();
        sorted_fields.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted_fields {
            output.push_str(",\"");
            Self::escape_json_string(&mut output, key);
            output.push_str("\":\"");
            Self::escape_json_string(&mut output, value);
            output.push('"');
        }

        output.push('}');
        output.push('\n');

        // Write atomically (one syscall)
        let _ = writer.write_all(output.as_bytes());
        let _ = writer.flush();
    }

    /// Escape special characters for JSON strings
    fn escape_json_string(output: &mut String, s: &str) {
        for c in s.chars() {
            match c {
                '"' => output.push_str("\\\""),
                '\\' => output.push_str("\\\\"),
                '\n' => output.push_str("\\n"),
                '\r' => output.push_str("\\r"),
                '\t' => output.push_str("\\t"),
                c if c.is_control() => {
                    output.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => output.push(c),
            }
        }
    }
}

impl Default for QueryLog {
    fn default() -> Self {
        Self::new(LogLevel::Error)
    }
}

/// Capture a log line to a buffer for testing
#[cfg(test)]
pub fn capture_log(level: LogLevel, event: &str, fields: &[(&str, &str)]) -> String {
    let mut buffer = Vec::new();
    QueryLog::log_to_writer(level, event, fields, &mut buffer);
    String::from_utf8(buffer).unwrap()
}

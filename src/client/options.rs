//! Client configuration
//!
//! Constructed by the caller and passed explicitly; there is no global
//! client state. Lifetime is scoped by the caller: acquired at startup,
//! dropped at shutdown.

use crate::observability::LogLevel;

/// Options for constructing a [`crate::client::Client`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Log verbosity; `Query` emits every issued statement
    pub log_level: LogLevel,
}

impl ClientOptions {
    /// Creates the default options (errors only)
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the log verbosity
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_errors_only() {
        assert_eq!(ClientOptions::default().log_level, LogLevel::Error);
    }

    #[test]
    fn test_builder() {
        let options = ClientOptions::new().with_log_level(LogLevel::Query);
        assert_eq!(options.log_level, LogLevel::Query);
    }
}

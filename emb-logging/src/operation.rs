//! Log operation for the Emacs module bridge.
//!
//! This module provides the record type stored by the module logger.

use std::fmt;

use crate::level::LogLevel;

/// One captured log record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOperation {
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Module path or target the record was logged under (optional)
    pub target: Option<String>,
}

impl LogOperation {
    /// Create a new log operation
    #[must_use]
    pub const fn new(level: LogLevel, message: String) -> Self {
        Self { level, message, target: None }
    }

    /// Create a new log operation with a target
    pub fn with_target<S1: Into<String>, S2: Into<String>>(
        level: LogLevel,
        message: S1,
        target: S2,
    ) -> Self {
        Self { level, message: message.into(), target: Some(target.into()) }
    }
}

impl fmt::Display for LogOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(f, "[{}] {}: {}", self.level, target, self.message),
            None => write!(f, "[{}] {}", self.level, self.message),
        }
    }
}

//! Pipeline log helpers.
//!
//! Conversion steps report progress through these helpers instead of
//! printing. Each entry becomes a `tracing` event under the `mdflow`
//! target, so the caller decides where logs go (the CLI installs a
//! stderr subscriber, library users bring their own).

use serde::{Deserialize, Serialize};

/// Log level of a pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth for sub-steps
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// Emit this entry as a tracing event.
    pub fn emit(&self) {
        let msg = self.message.as_str();
        let indent = self.indent;
        match self.level {
            LogLevel::Info => tracing::info!(target: "mdflow", indent, "{}", msg),
            LogLevel::Success => {
                tracing::info!(target: "mdflow", status = "success", indent, "{}", msg)
            }
            LogLevel::Warning => tracing::warn!(target: "mdflow", indent, "{}", msg),
            LogLevel::Error => tracing::error!(target: "mdflow", indent, "{}", msg),
        }
    }
}

pub fn log_info(msg: impl Into<String>) {
    LogEntry::info(msg).emit();
}

pub fn log_success(msg: impl Into<String>) {
    LogEntry::success(msg).emit();
}

pub fn log_warning(msg: impl Into<String>) {
    LogEntry::warning(msg).emit();
}

pub fn log_error(msg: impl Into<String>) {
    LogEntry::error(msg).emit();
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LogEntry::info(msg).with_indent(indent).emit();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serializes_lowercase_level() {
        let entry = LogEntry::warning("2 columns not mapped").with_indent(1);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["level"], "warning");
        assert_eq!(json["indent"], 1);
    }

    #[test]
    fn test_emit_without_subscriber_is_noop() {
        log_info("classifying");
        log_success("done");
        log_info_indent("nested", 2);
    }
}

use std::time::Duration;

use thiserror::Error;

/// Failures while acquiring raw data from an external tool or sample file.
///
/// Each variant is fatal to one data source only; callers decide how the run
/// degrades.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{tool} not found. Install with: {install_hint}")]
    ToolUnavailable {
        tool: String,
        install_hint: String,
    },

    #[error("Permission denied for: {operation}. Try running with: {suggestion}")]
    PermissionDenied {
        operation: String,
        suggestion: String,
    },

    #[error("{operation} timed out after {} seconds", .timeout.as_secs())]
    Timeout {
        operation: String,
        timeout: Duration,
    },

    #[error("Failed to parse {tool} output: {details}")]
    ParseFailure { tool: String, details: String },

    #[error("Device error for {device}: {reason}")]
    DeviceFailure { device: String, reason: String },

    #[error("{tool} failed: {details}")]
    CommandFailed { tool: String, details: String },

    #[error("Sample file not found: {0}")]
    SampleMissing(String),

    #[error("invalid device pattern: {0}")]
    Pattern(String),

    #[error("failed to read {path}: {source}")]
    Listing {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run {tool}: {source}")]
    Io {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    /// Stable snake_case label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::ToolUnavailable { .. } => "tool_unavailable",
            ToolError::PermissionDenied { .. } => "permission_denied",
            ToolError::Timeout { .. } => "timeout",
            ToolError::ParseFailure { .. } => "parse_failure",
            ToolError::DeviceFailure { .. } => "device_failure",
            ToolError::CommandFailed { .. } => "command_failed",
            ToolError::SampleMissing(_) => "sample_missing",
            ToolError::Pattern(_) => "pattern",
            ToolError::Listing { .. } => "listing",
            ToolError::Io { .. } => "io",
        }
    }
}

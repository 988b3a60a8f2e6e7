//! Error types and Result aliases for the monitor bridge

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the monitor bridge
#[derive(Debug, Error)]
pub enum Error {
    // === Session errors ===
    /// Could not reach the monitor endpoint
    #[error("Failed to connect to monitor at {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// The monitor stream closed or failed mid-session
    #[error("Connection to monitor lost: {reason}")]
    ConnectionClosed { reason: String },

    /// No end-of-response marker arrived in time
    #[error("Monitor did not answer '{command}' within {duration:?}")]
    Timeout { command: String, duration: Duration },

    /// The monitor console reported a failure for one command
    #[error("{message}")]
    MonitorReported { command: String, message: String },

    /// The bridge was used after teardown
    #[error("Bridge is closed; the monitor session is no longer available")]
    BridgeClosed,

    // === Log errors ===
    /// No log file is configured for this bridge
    #[error("No emulator log file configured (set monitor.log_file)")]
    LogNotConfigured,

    /// The emulator log could not be read
    #[error("Failed to read log '{}': {reason}", path.display())]
    LogReadFailed { path: PathBuf, reason: String },

    // === Command errors ===
    /// The keyword could not be rendered as a single monitor command
    #[error("Invalid monitor command: {reason}")]
    InvalidCommand { reason: String },

    // === Configuration errors ===
    /// Failed to load configuration file
    #[error("Failed to load config from '{}': {reason}", path.display())]
    ConfigLoadFailed { path: PathBuf, reason: String },

    /// Configuration file not found
    #[error("Configuration file not found")]
    ConfigNotFound,

    /// Configuration validation failed
    #[error("Configuration validation failed for '{field}': {reason}")]
    ConfigValidationFailed { field: String, reason: String },

    /// Failed to serialize configuration
    #[error("Failed to serialize config as {format}: {reason}")]
    ConfigSerializationFailed { format: String, reason: String },

    /// Failed to parse configuration
    #[error("Failed to parse {format} config: {reason}")]
    ConfigParseFailed { format: String, reason: String },

    /// A prompt or marker pattern did not compile
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// I/O errors outside the monitor stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used for session policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    Timeout,
    MonitorReported,
    BridgeClosed,
    InvalidCommand,
    Config,
    Io,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ConnectionFailed { .. } | Error::ConnectionClosed { .. } => {
                ErrorKind::Connection
            }
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::MonitorReported { .. } => ErrorKind::MonitorReported,
            Error::BridgeClosed => ErrorKind::BridgeClosed,
            Error::InvalidCommand { .. } => ErrorKind::InvalidCommand,
            Error::ConfigLoadFailed { .. }
            | Error::ConfigNotFound
            | Error::ConfigValidationFailed { .. }
            | Error::ConfigSerializationFailed { .. }
            | Error::ConfigParseFailed { .. }
            | Error::InvalidPattern { .. } => ErrorKind::Config,
            Error::LogNotConfigured => ErrorKind::Config,
            Error::Io(_) | Error::LogReadFailed { .. } => ErrorKind::Io,
        }
    }

    /// Whether this error leaves the monitor session unusable.
    ///
    /// A lost connection or a missed reply boundary cannot be resynchronized
    /// on a line-oriented console, so both end the session.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Connection | ErrorKind::Timeout)
    }
}

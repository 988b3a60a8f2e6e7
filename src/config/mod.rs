//! Configuration management for the monitor bridge
//!
//! Covers the monitor endpoint and its console conventions, the keyword
//! gateway's reply policy, and logging. Every section has defaults, so a
//! partial file only overrides what it names.

pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Prompt shown by the monitor, e.g. `(monitor) ` or `(machine-0) `.
///
/// The trailing space is required. Output lines such as `(none)` end in a
/// newline instead, so a read that stops before that newline is not taken
/// for a prompt.
pub const DEFAULT_PROMPT_PATTERN: &str = r"^\([^()\n]*\) $";

/// Default telnet port of the monitor console
pub const DEFAULT_MONITOR_PORT: u16 = 4567;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Monitor connection and console conventions
    pub monitor: MonitorConfig,

    /// Keyword gateway reply policy
    pub gateway: GatewayConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// How the monitor signals the end of a response
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TerminatorKind {
    /// A prompt line matching `prompt_pattern`
    #[default]
    Prompt,
    /// An empty line
    BlankLine,
}

/// Monitor connection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Monitor host name or address
    pub host: String,

    /// Monitor TCP port
    pub port: u16,

    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,

    /// Maximum wait for an end-of-response marker, in milliseconds
    pub response_timeout_ms: u64,

    /// End-of-response convention
    pub terminator: TerminatorKind,

    /// Regex matched against the last line of output when `terminator = "prompt"`
    pub prompt_pattern: String,

    /// Appended to every command line
    pub line_terminator: String,

    /// Answer telnet option negotiation
    pub negotiate_telnet: bool,

    /// Send an empty line after the greeting before the first command
    pub prime_session: bool,

    /// Commands run once right after connecting
    pub startup_commands: Vec<String>,

    /// Command written on shutdown, if any
    pub quit_command: Option<String>,

    /// File the emulator log is copied to with `logFile`, if any
    pub log_file: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_MONITOR_PORT,
            connect_timeout_ms: 5_000,
            response_timeout_ms: 15_000,
            terminator: TerminatorKind::Prompt,
            prompt_pattern: DEFAULT_PROMPT_PATTERN.to_string(),
            line_terminator: "\n".to_string(),
            negotiate_telnet: true,
            prime_session: true,
            startup_commands: Vec::new(),
            quit_command: None,
            log_file: None,
        }
    }
}

impl MonitorConfig {
    /// `host:port` of the monitor
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// Monitor command that points the emulator log at `log_file`
    pub fn log_file_command(&self) -> Option<String> {
        self.log_file
            .as_ref()
            .map(|path| format!("logFile @{}", path.display()))
    }
}

/// Keyword gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Prefixes that mark a reply as a failed command.
    ///
    /// The defaults cover the explicit `Error:` form and the monitor's
    /// `There was an error executing command ...` report.
    pub error_markers: Vec<String>,

    /// Drop the monitor's echo of the command from the reply
    pub strip_echo: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            error_markers: vec!["Error:".to_string(), "There was an error".to_string()],
            strip_echo: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,

    /// Colorize log output
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

impl Config {
    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let loader = loader::ConfigLoader::new();
        let format = loader::ConfigFormat::from_path(path).unwrap_or(loader::ConfigFormat::Toml);
        let config = loader.load_config_file(path, format)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let monitor = &self.monitor;

        if monitor.host.trim().is_empty() {
            return Err(Error::ConfigValidationFailed {
                field: "monitor.host".to_string(),
                reason: "Host cannot be empty".to_string(),
            });
        }

        if monitor.port == 0 {
            return Err(Error::ConfigValidationFailed {
                field: "monitor.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        for (field, value) in [
            ("monitor.connect_timeout_ms", monitor.connect_timeout_ms),
            ("monitor.response_timeout_ms", monitor.response_timeout_ms),
        ] {
            if value == 0 {
                return Err(Error::ConfigValidationFailed {
                    field: field.to_string(),
                    reason: "Timeout must be greater than 0".to_string(),
                });
            }
            if value > 3_600_000 {
                return Err(Error::ConfigValidationFailed {
                    field: field.to_string(),
                    reason: "Timeout cannot exceed 1 hour (3600000 ms)".to_string(),
                });
            }
        }

        if monitor.terminator == TerminatorKind::Prompt {
            if monitor.prompt_pattern.is_empty() {
                return Err(Error::ConfigValidationFailed {
                    field: "monitor.prompt_pattern".to_string(),
                    reason: "Prompt pattern cannot be empty".to_string(),
                });
            }
            regex::Regex::new(&monitor.prompt_pattern).map_err(|e| {
                Error::ConfigValidationFailed {
                    field: "monitor.prompt_pattern".to_string(),
                    reason: e.to_string(),
                }
            })?;
        }

        if monitor.line_terminator.is_empty() {
            return Err(Error::ConfigValidationFailed {
                field: "monitor.line_terminator".to_string(),
                reason: "Line terminator cannot be empty".to_string(),
            });
        }

        let scripted = monitor
            .startup_commands
            .iter()
            .map(|c| ("monitor.startup_commands", c))
            .chain(monitor.quit_command.iter().map(|c| ("monitor.quit_command", c)));
        for (field, command) in scripted {
            if command.contains(['\n', '\r']) {
                return Err(Error::ConfigValidationFailed {
                    field: field.to_string(),
                    reason: format!("Command must be a single line: {:?}", command),
                });
            }
        }

        if let Some(command) = monitor.log_file_command() {
            if command.contains(['\n', '\r']) {
                return Err(Error::ConfigValidationFailed {
                    field: "monitor.log_file".to_string(),
                    reason: "Log file path must be a single line".to_string(),
                });
            }
        }

        if self.gateway.error_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(Error::ConfigValidationFailed {
                field: "gateway.error_markers".to_string(),
                reason: "Error markers cannot be empty strings".to_string(),
            });
        }

        Ok(())
    }
}

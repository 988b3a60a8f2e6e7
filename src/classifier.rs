//! Reply classification
//!
//! The monitor never sends a status code. A reply is a failure only by
//! convention: its text starts with an error marker. This module turns that
//! convention into an explicit [`ClassifiedResult`] so nothing downstream
//! has to look at raw console text.

use serde::{Deserialize, Serialize};

use crate::config::{Config, GatewayConfig};
use crate::error::Result;
use crate::monitor::prompt::ResponseTerminator;
use crate::monitor::RawReply;

/// Outcome of one monitor command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassifiedResult {
    /// The command succeeded; the value may be empty
    Ok(String),
    /// The console reported a failure
    Err(String),
}

impl ClassifiedResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, ClassifiedResult::Ok(_))
    }

    pub fn is_err(&self) -> bool {
        matches!(self, ClassifiedResult::Err(_))
    }
}

/// Pure classifier for monitor replies
#[derive(Debug, Clone)]
pub struct ReplyClassifier {
    terminator: ResponseTerminator,
    error_markers: Vec<String>,
    strip_echo: bool,
}

impl ReplyClassifier {
    pub fn new(terminator: ResponseTerminator, error_markers: Vec<String>) -> Self {
        Self {
            terminator,
            error_markers,
            strip_echo: true,
        }
    }

    /// Build a classifier from the bridge configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let terminator = ResponseTerminator::from_config(&config.monitor)?;
        let GatewayConfig {
            error_markers,
            strip_echo,
        } = config.gateway.clone();
        Ok(Self::new(terminator, error_markers).with_strip_echo(strip_echo))
    }

    /// Enable or disable removal of the command echo
    pub fn with_strip_echo(mut self, strip_echo: bool) -> Self {
        self.strip_echo = strip_echo;
        self
    }

    pub fn error_markers(&self) -> &[String] {
        &self.error_markers
    }

    /// Classify raw reply text (terminator included)
    ///
    /// Multi-line output is kept verbatim. For errors, everything after the
    /// marker is the message.
    pub fn classify(&self, raw: &str) -> ClassifiedResult {
        let body = self.terminator.strip(raw).trim();

        for marker in &self.error_markers {
            if let Some(message) = body.strip_prefix(marker.as_str()) {
                return ClassifiedResult::Err(message.trim_start().to_string());
            }
        }

        ClassifiedResult::Ok(body.to_string())
    }

    /// Classify a captured reply, dropping the echoed command first
    pub fn classify_reply(&self, reply: &RawReply) -> ClassifiedResult {
        if self.strip_echo {
            self.classify(strip_echo(&reply.text, &reply.command))
        } else {
            self.classify(&reply.text)
        }
    }
}

/// Remove a leading echo of `command` from `text`
fn strip_echo<'a>(text: &'a str, command: &str) -> &'a str {
    let command = command.trim();
    if command.is_empty() {
        return text;
    }

    let (first, rest) = match text.find('\n') {
        Some(i) => (&text[..i], &text[i + 1..]),
        None => (text, ""),
    };

    if first.trim() == command {
        rest
    } else {
        text
    }
}

//! End-of-response detection
//!
//! The monitor has no framing beyond line termination: a response is over
//! when the console prints its prompt again (or, for some consoles, an empty
//! line). [`ResponseTerminator`] finds that boundary in captured text.

use regex::Regex;
use std::ops::Range;

use crate::config::{MonitorConfig, TerminatorKind};
use crate::error::{Error, Result};

/// Recognizes the monitor's end-of-response marker
#[derive(Debug, Clone)]
pub enum ResponseTerminator {
    /// The last line of output matches a prompt pattern
    Prompt(Regex),
    /// The output contains an empty line
    BlankLine,
}

impl ResponseTerminator {
    /// Build a prompt terminator from a regex pattern
    pub fn prompt(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(ResponseTerminator::Prompt(regex))
    }

    /// Build a prompt terminator that matches one literal prompt token
    pub fn literal_prompt(token: &str) -> Self {
        let pattern = format!(r"^{}\s*$", regex::escape(token));
        // An escaped literal always compiles
        ResponseTerminator::Prompt(Regex::new(&pattern).expect("escaped prompt literal"))
    }

    /// Build the terminator described by the monitor configuration
    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        match config.terminator {
            TerminatorKind::Prompt => Self::prompt(&config.prompt_pattern),
            TerminatorKind::BlankLine => Ok(ResponseTerminator::BlankLine),
        }
    }

    /// Locate the marker in `text`.
    ///
    /// Returns the byte range of the marker, or `None` if the response is
    /// still incomplete. `text` is expected with carriage returns already
    /// removed.
    pub fn marker(&self, text: &str) -> Option<Range<usize>> {
        match self {
            ResponseTerminator::Prompt(regex) => {
                let start = text.rfind('\n').map_or(0, |i| i + 1);
                let last_line = &text[start..];
                if !last_line.trim().is_empty() && regex.is_match(last_line) {
                    Some(start..text.len())
                } else {
                    None
                }
            }
            ResponseTerminator::BlankLine => {
                if text.starts_with('\n') {
                    return Some(0..1);
                }
                text.find("\n\n").map(|i| i + 1..i + 2)
            }
        }
    }

    /// Byte offset where the response body ends (the start of the marker)
    pub fn find(&self, text: &str) -> Option<usize> {
        self.marker(text).map(|range| range.start)
    }

    /// Whether `text` ends with a complete response
    pub fn is_complete(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    /// Return the response body with the marker removed.
    ///
    /// Text without a marker is returned unchanged.
    pub fn strip<'a>(&self, text: &'a str) -> &'a str {
        match self.find(text) {
            Some(end) => &text[..end],
            None => text,
        }
    }
}

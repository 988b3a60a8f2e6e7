//! Monitor command line rendering
//!
//! A keyword call (method name plus loosely typed arguments) becomes exactly
//! one console line. Values are rendered the way the monitor's own parser
//! reads them: bare tokens where possible, double-quoted strings otherwise.
//! [`tokenize`] is the inverse and is used to check rendered lines.

use serde_json::Value;
use std::fmt;

use crate::error::{Error, Result};

/// A single, validated monitor command line (without line terminator)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    method: String,
    line: String,
}

impl CommandLine {
    /// Render a keyword call into a command line
    ///
    /// Numbers render as decimal literals and booleans as `true`/`false`.
    /// Arrays expand positionally, objects expand to `key=value` arguments
    /// and `null` renders nothing.
    pub fn render(method: &str, args: &[Value]) -> Result<Self> {
        validate_method(method)?;

        let mut tokens = vec![method.to_string()];
        for arg in args {
            render_value(arg, &mut tokens);
        }

        Ok(Self {
            method: method.to_string(),
            line: tokens.join(" "),
        })
    }

    /// Use a pre-formatted line verbatim (startup and quit commands)
    pub fn raw(line: &str) -> Result<Self> {
        if line.contains(['\n', '\r']) {
            return Err(Error::InvalidCommand {
                reason: format!("command contains a line terminator: {:?}", line),
            });
        }

        let method = line.split_whitespace().next().unwrap_or_default().to_string();
        Ok(Self {
            method,
            line: line.to_string(),
        })
    }

    /// The command verb
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The full line as sent to the monitor
    pub fn as_str(&self) -> &str {
        &self.line
    }

    /// Whether this is an empty line (used to prime the console)
    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

/// Check that a method name is a single bare token
fn validate_method(method: &str) -> Result<()> {
    if method.is_empty() {
        return Err(Error::InvalidCommand {
            reason: "method name cannot be empty".to_string(),
        });
    }

    if method
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || c == '"')
    {
        return Err(Error::InvalidCommand {
            reason: format!("method name must be a single token: {:?}", method),
        });
    }

    Ok(())
}

fn render_value(value: &Value, tokens: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => tokens.push(b.to_string()),
        Value::Number(n) => tokens.push(n.to_string()),
        Value::String(s) => tokens.push(render_token(s)),
        Value::Array(items) => {
            for item in items {
                render_value(item, tokens);
            }
        }
        Value::Object(map) => {
            for (key, value) in map {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                tokens.push(render_token(&format!("{}={}", key, text)));
            }
        }
    }
}

fn needs_quoting(text: &str) -> bool {
    text.is_empty()
        || text
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '"')
}

/// Render one string argument as a monitor token
pub fn render_token(text: &str) -> String {
    if !needs_quoting(text) {
        return text.to_string();
    }

    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

/// Split a command line into its tokens
///
/// Bare tokens are taken literally; quoted tokens have their escapes
/// resolved.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let Some(&first) = chars.peek() else {
            break;
        };

        let mut token = String::new();
        if first == '"' {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.next() {
                        Some('n') => token.push('\n'),
                        Some('r') => token.push('\r'),
                        Some('t') => token.push('\t'),
                        Some('"') => token.push('"'),
                        Some('\\') => token.push('\\'),
                        Some(other) => {
                            token.push('\\');
                            token.push(other);
                        }
                        None => break,
                    },
                    other => token.push(other),
                }
            }
            if !closed {
                return Err(Error::InvalidCommand {
                    reason: format!("unterminated quoted argument in {:?}", line),
                });
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }

    Ok(tokens)
}

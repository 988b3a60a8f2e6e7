//! ANSI escape code processing
//!
//! Monitor consoles colorize prompts and error lines. None of that is part
//! of a keyword's value, so output is stripped before it is classified.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// Matches 7-bit `ESC` sequences and their 8-bit C1 equivalents
static ESCAPE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\x1b[@-_]|[\x{80}-\x{9f}])[0-?]*[ -/]*[@-~]")
        .expect("ANSI escape pattern is valid")
});

/// Remove ANSI escape sequences from text
///
/// Returns the input unchanged (borrowed) when it contains no escapes.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    ESCAPE_REGEX.replace_all(text, "")
}

/// Check whether text carries any escape sequence
pub fn contains_ansi(text: &str) -> bool {
    ESCAPE_REGEX.is_match(text)
}

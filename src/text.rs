//! Text normalization helpers shared by the extractor and the venue parser.

use crate::error::{ExportError, Result};
use regex::Regex;

/// Collapse the text the way the profile page renders it.
///
/// Non-breaking spaces become ordinary spaces, any whitespace run becomes a
/// single space and the ends are trimmed. Idempotent.
pub fn normalize(text: &str) -> String {
    text.replace('\u{00A0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// [`normalize`] for values that may be absent; `None` becomes empty text.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

/// Parse the leading digit run of a cell (`"12*"` -> 12).
///
/// Returns `None` when the text does not start with a digit or the number
/// does not fit in a `u32`.
pub fn leading_u32(text: &str) -> Option<u32> {
    let text = text.trim_start();
    let end = text
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text[..end].parse().ok()
}

/// Finds 4-digit year tokens in the 1900-2099 range.
#[derive(Debug, Clone)]
pub struct YearFinder {
    re: Regex,
}

impl YearFinder {
    pub fn new() -> Result<Self> {
        let re = Regex::new(r"\b(?:19|20)[0-9]{2}\b")
            .map_err(|e| ExportError::Parse(e.to_string()))?;
        Ok(Self { re })
    }

    /// First year token in the text, if any
    pub fn first<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.re.find(text).map(|m| m.as_str())
    }

    /// Remove every year token from the text
    pub fn strip(&self, text: &str) -> String {
        self.re.replace_all(text, "").into_owned()
    }
}

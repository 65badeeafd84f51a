//! Custom error types for rustgsexport.
//!
//! Heuristic misses while reading venues are never errors; they degrade to
//! empty fields. Everything listed here aborts the export action it occurs in.

use thiserror::Error;

/// Main error type for rustgsexport operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// An affordance the action depends on is absent from the page
    /// (no rows, no "load more" control, no export control, no BibTeX link).
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Selector or pattern construction error
    #[error("Parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writing or reading error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias using `ExportError`
pub type Result<T> = std::result::Result<T, ExportError>;

/// Extension trait for turning an absent page affordance into an error
pub trait OptionExt<T> {
    /// Convert Option to Result with a missing-input message
    fn ok_or_missing(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_missing(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| ExportError::MissingInput(msg.to_string()))
    }
}

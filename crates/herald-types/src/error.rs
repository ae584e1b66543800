//! Error types for shared values.

use thiserror::Error;

/// Errors raised while rendering a component for a locale.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranslateError {
    /// A pattern referenced an argument that was not supplied.
    #[error("Translation '{key}' references missing argument {index}")]
    MissingArgument { key: String, index: usize },

    /// A pattern could not be parsed.
    #[error("Malformed translation pattern for '{key}': {reason}")]
    MalformedPattern { key: String, reason: String },

    /// The translator itself failed.
    #[error("Translator failure: {0}")]
    Translator(String),
}

/// Errors raised by boss bar mutators.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BossBarError {
    /// Percent outside `[0, 1]` or not a number.
    #[error("Boss bar percent must be within [0, 1], got {0}")]
    InvalidPercent(f32),
}

//! Error types for the parser.
//!
//! `ParserError` covers every way a parse can fail: malformed markup from the
//! tokenizer, a failing listener, and the I/O and configuration problems of
//! the layers around the extraction engine. None of them are retried.

use thiserror::Error;

/// Error type returned by event listeners.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for the parser library.
#[derive(Debug, Error)]
pub enum ParserError {
    /// The tokenizer found a syntax violation.
    #[error("Malformed XML at line {line}: {message}")]
    MalformedMarkup { line: usize, message: String },

    /// A registered listener failed while handling an event.
    #[error("Listener for '{rule}' failed: {source}")]
    Listener {
        rule: String,
        #[source]
        source: ListenerError,
    },

    /// A listener was registered for a rule key the table does not define.
    #[error("Unknown rule '{rule}'{}", .variant.as_ref().map(|v| format!(" for {v} parser")).unwrap_or_default())]
    UnknownRule {
        rule: String,
        variant: Option<String>,
    },

    /// A reconstructed fragment could not be converted to an object tree.
    #[error("Fragment conversion failed: {0}")]
    Fragment(#[from] roxmltree::Error),

    /// The input source produced bytes that are not valid UTF-8.
    #[error("Invalid UTF-8 in input at byte offset {offset}")]
    Encoding { offset: u64 },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ParserError {
    /// Build a `MalformedMarkup` error.
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedMarkup {
            line,
            message: message.into(),
        }
    }

    /// Whether this error originated in the XML input rather than in a listener
    /// or the surrounding I/O layer.
    #[must_use]
    pub fn is_markup_error(&self) -> bool {
        matches!(self, Self::MalformedMarkup { .. } | Self::Fragment(_))
    }
}

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;

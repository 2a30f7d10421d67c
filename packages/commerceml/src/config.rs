//! Configuration constants and validation for the parser.

use crate::error::{ParserError, Result};

/// Default number of bytes requested from a reader per chunk (64 KiB).
///
/// Matches the read buffer size of a typical file stream, so one chunk is one
/// read call.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Largest accepted chunk size (16 MiB).
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Environment variable overriding the chunk size.
pub const ENV_CHUNK_SIZE: &str = "COMMERCEML_CHUNK_SIZE";

/// Environment variable toggling text trimming.
pub const ENV_TRIM_TEXT: &str = "COMMERCEML_TRIM_TEXT";

/// Environment variable toggling whitespace normalization.
pub const ENV_NORMALIZE_TEXT: &str = "COMMERCEML_NORMALIZE_TEXT";

/// Parser settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Bytes read from the input per chunk.
    pub chunk_size: usize,
    /// Strip leading and trailing whitespace from text nodes.
    pub trim_text: bool,
    /// Collapse whitespace runs inside text nodes to a single space.
    pub normalize_text: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            trim_text: true,
            normalize_text: true,
        }
    }
}

impl ParserConfig {
    /// Create a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the environment, falling back to defaults for
    /// unset variables.
    ///
    /// # Errors
    /// Returns `ParserError::Config` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var(ENV_CHUNK_SIZE) {
            let chunk_size = value.trim().parse::<usize>().map_err(|_| {
                ParserError::Config(format!("{ENV_CHUNK_SIZE} is not a number: '{value}'"))
            })?;
            validate_chunk_size(chunk_size)?;
            config.chunk_size = chunk_size;
        }

        if let Ok(value) = std::env::var(ENV_TRIM_TEXT) {
            config.trim_text = parse_flag(ENV_TRIM_TEXT, &value)?;
        }

        if let Ok(value) = std::env::var(ENV_NORMALIZE_TEXT) {
            config.normalize_text = parse_flag(ENV_NORMALIZE_TEXT, &value)?;
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub fn with_trim_text(mut self, trim_text: bool) -> Self {
        self.trim_text = trim_text;
        self
    }

    #[must_use]
    pub fn with_normalize_text(mut self, normalize_text: bool) -> Self {
        self.normalize_text = normalize_text;
        self
    }

    /// Check that all settings are within range.
    ///
    /// # Errors
    /// Returns `ParserError::Config` for an out-of-range chunk size.
    pub fn validate(&self) -> Result<()> {
        validate_chunk_size(self.chunk_size)
    }
}

/// Validate a chunk size.
///
/// # Examples
/// ```
/// use commerceml_parser::config::validate_chunk_size;
///
/// assert!(validate_chunk_size(4096).is_ok());
/// assert!(validate_chunk_size(0).is_err());
/// ```
pub fn validate_chunk_size(chunk_size: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(ParserError::Config(
            "chunk size must be at least 1 byte".to_string(),
        ));
    }
    if chunk_size > MAX_CHUNK_SIZE {
        return Err(ParserError::Config(format!(
            "chunk size {chunk_size} exceeds maximum of {MAX_CHUNK_SIZE} bytes"
        )));
    }
    Ok(())
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ParserError::Config(format!(
            "{name} must be a boolean, got '{value}'"
        ))),
    }
}

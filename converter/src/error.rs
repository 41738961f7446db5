//! Error types for the MDFlow conversion pipeline.
//!
//! - [`ParseError`] - Matrix parsing errors (malformed quoting)
//! - [`BuildError`] - Spec document building errors
//! - [`RulesError`] - Validation rule loading errors
//! - [`ConfigError`] - Environment configuration errors
//! - [`ConvertError`] - Top-level conversion errors
//!
//! Classification, header mapping and validation never fail; they degrade
//! to a best-effort result instead, so they have no error type here.
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Matrix Parsing Errors
// =============================================================================

/// Errors while splitting delimited text into a matrix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A quoted cell was opened and never closed before end of input.
    #[error("Unterminated quoted cell starting on line {line}")]
    UnterminatedQuote { line: usize },

    /// The underlying CSV reader rejected a record.
    #[error("Malformed record on line {line}: {message}")]
    Malformed { line: usize, message: String },

    /// Raw bytes could not be decoded.
    #[error("Failed to decode input: {0}")]
    Encoding(String),
}

// =============================================================================
// Document Building Errors
// =============================================================================

/// Errors while building a spec document from pasted content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Content is empty after trimming.
    #[error("Input is empty")]
    EmptyInput,

    /// Tabular content could not be parsed.
    #[error("Table parsing failed: {0}")]
    Parse(#[from] ParseError),
}

// =============================================================================
// Validation Rule Errors
// =============================================================================

/// Errors while loading a validation rule set.
#[derive(Debug, Error)]
pub enum RulesError {
    /// Rule file is not valid JSON or has unknown fields.
    #[error("Invalid rules JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// ID pattern does not compile.
    #[error("Invalid ID pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// No preset with that name.
    #[error("Unknown rules preset: {0}")]
    UnknownPreset(String),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while reading configuration overrides from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Variable is set but its value cannot be used.
    #[error("Invalid value for {var}: '{value}' ({reason})")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },
}

// =============================================================================
// Conversion Errors (top-level)
// =============================================================================

/// Top-level conversion errors.
///
/// This is the error type returned by [`crate::pipeline::convert_paste`].
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Document building error (empty input or parse failure).
    #[error("{0}")]
    Build(#[from] BuildError),

    /// Requested template is not registered.
    #[error("Unknown template '{0}'")]
    UnknownTemplate(String),

    /// Rule set could not be loaded.
    #[error("Rules error: {0}")]
    Rules(#[from] RulesError),
}

impl From<ParseError> for ConvertError {
    fn from(err: ParseError) -> Self {
        ConvertError::Build(BuildError::Parse(err))
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for matrix parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for document building.
pub type BuildResult<T> = Result<T, BuildError>;

/// Result type for conversion.
pub type ConvertResult<T> = Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // ParseError -> BuildError -> ConvertError
        let parse_err = ParseError::UnterminatedQuote { line: 3 };
        let build_err: BuildError = parse_err.clone().into();
        assert!(build_err.to_string().contains("line 3"));

        let convert_err: ConvertError = parse_err.into();
        assert!(matches!(
            convert_err,
            ConvertError::Build(BuildError::Parse(ParseError::UnterminatedQuote { line: 3 }))
        ));

        let convert_err: ConvertError = BuildError::EmptyInput.into();
        assert!(convert_err.to_string().contains("empty"));
    }

    #[test]
    fn test_config_error_format() {
        let err = ConfigError::InvalidValue {
            var: "MDFLOW_TABLE_RATIO".into(),
            value: "abc".into(),
            reason: "expected a number".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("MDFLOW_TABLE_RATIO"));
        assert!(msg.contains("'abc'"));
    }
}

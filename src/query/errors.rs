//! Parse error types.

use thiserror::Error;

/// A parse failure with the byte offset of the offending token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at offset {offset}: {message}")]
pub struct ParseError {
    /// Human-readable description, including an expected-token hint
    pub message: String,
    /// Byte offset of the offending token in the query string
    pub offset: usize,
    /// What the parser found at that offset
    pub found: String,
    /// What the parser expected instead, if known
    pub expected: Option<String>,
}

impl ParseError {
    /// An unexpected token where something specific was expected.
    pub fn unexpected(offset: usize, expected: &str, found: impl Into<String>) -> Self {
        let found = found.into();
        Self {
            message: format!("expected {}, found {}", expected, found),
            offset,
            found,
            expected: Some(expected.to_string()),
        }
    }

    /// Input ended where more tokens were expected.
    pub fn unexpected_eof(offset: usize, expected: &str) -> Self {
        Self {
            message: format!("unexpected end of input, expected {}", expected),
            offset,
            found: "end of input".to_string(),
            expected: Some(expected.to_string()),
        }
    }

    /// A token that could not be lexed at all.
    pub fn invalid(offset: usize, message: impl Into<String>, found: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            offset,
            found: found.into(),
            expected: None,
        }
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_includes_hint() {
        let err = ParseError::unexpected(7, "literal", "`and`");
        assert_eq!(err.offset, 7);
        assert_eq!(err.expected.as_deref(), Some("literal"));
        assert!(err.to_string().contains("offset 7"));
        assert!(err.to_string().contains("expected literal"));
    }

    #[test]
    fn test_unexpected_eof() {
        let err = ParseError::unexpected_eof(20, "comparison operator");
        assert_eq!(err.found, "end of input");
        assert!(err.message.contains("comparison operator"));
    }
}

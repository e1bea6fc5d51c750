//! All error types for the cvdialog crate.
//!
//! Every failure in the core is fatal: lexing, parsing, model construction and
//! resource-set consistency checks abort with one of these. Verifier findings
//! are not errors; see [`crate::verify`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("lexical error at {line}:{column}: {message}")]
    Lex {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("syntax error: expected {expected}, got {found}")]
    Syntax { expected: String, found: String },

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("invalid resource: {0}")]
    InvalidResource(String),

    #[error("inconsistent resource set: {0}")]
    Consistency(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a syntax error in the `expected X, got Y` shape.
    pub fn syntax(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Error::Syntax {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Creates a resource-set consistency error.
    pub fn consistency(message: impl Into<String>) -> Self {
        Error::Consistency(message.into())
    }

    pub fn invalid_resource(message: impl Into<String>) -> Self {
        Error::InvalidResource(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_lex_error() {
        let error = Error::Lex {
            line: 3,
            column: 7,
            message: "unexpected character '$'".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "lexical error at 3:7: unexpected character '$'"
        );
    }

    #[test]
    fn test_syntax_error() {
        let error = Error::syntax("`(`", "identifier `foo`");
        assert_eq!(
            error.to_string(),
            "syntax error: expected `(`, got identifier `foo`"
        );
    }

    #[test]
    fn test_consistency_error() {
        let error = Error::consistency("mismatched dialog id");
        assert_eq!(
            error.to_string(),
            "inconsistent resource set: mismatched dialog id"
        );
    }

    #[test]
    fn test_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = Error::Io(io_error);
        assert!(error.to_string().contains("I/O error"));
    }

    #[test]
    fn test_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("{ invalid json }").unwrap_err();
        let error = Error::from(json_error);
        assert!(error.to_string().starts_with("JSON error"));
    }

    #[test]
    fn test_error_debug() {
        let error = Error::Unsupported("flags".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("Unsupported"));
        assert!(debug.contains("flags"));
    }
}

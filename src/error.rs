//! Error types for query parsing.

use thiserror::Error;

/// Errors produced while tokenizing, parsing, lowering or rendering a query.
///
/// Every error is terminal for the call that produced it: no partial query is
/// ever returned alongside an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AqpError {
    /// Malformed literal syntax: bad escape, unterminated quote or range.
    #[error("lex error: {0}")]
    Lex(String),

    /// Grammar violation: unbalanced grouping, dangling modifier, malformed
    /// range, excessive nesting, or a malformed query handed to the renderer.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// The lowered query holds more boolean clauses than allowed.
    #[error("too many boolean clauses: {count} exceeds the maximum of {max}")]
    TooManyClauses { max: usize, count: usize },

    /// An analyzer failed to tokenize term text.
    #[error("analysis error: {0}")]
    Analysis(String),

    /// Invalid parser configuration.
    #[error("invalid config: {0}")]
    Config(String),
}

/// Result type alias for query parsing operations.
pub type Result<T> = std::result::Result<T, AqpError>;

impl AqpError {
    pub fn lex<S: Into<String>>(msg: S) -> Self {
        AqpError::Lex(msg.into())
    }

    pub fn syntax<S: Into<String>>(msg: S) -> Self {
        AqpError::Syntax(msg.into())
    }

    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        AqpError::Analysis(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        AqpError::Config(msg.into())
    }

    /// Check whether this error was caused by the query text itself, as
    /// opposed to configuration or resource limits.
    pub fn is_input_error(&self) -> bool {
        matches!(self, AqpError::Lex(_) | AqpError::Syntax(_))
    }
}

impl From<serde_json::Error> for AqpError {
    fn from(err: serde_json::Error) -> Self {
        AqpError::Config(err.to_string())
    }
}

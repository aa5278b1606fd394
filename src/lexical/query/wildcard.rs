//! Wildcard query implementation for pattern matching.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lexical::query::{escape_term, write_boost};

/// A query that matches documents containing terms that match a wildcard pattern.
///
/// Supports the following wildcards:
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
/// - `\*` and `\?` match literal `*` and `?` characters
///
/// The pattern is kept in its escaped form so it renders back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WildcardQuery {
    /// The field to search in.
    field: String,
    /// The wildcard pattern.
    pattern: String,
    /// The boost factor for this query.
    boost: f32,
}

impl WildcardQuery {
    /// Create a new wildcard query.
    pub fn new<F: Into<String>, P: Into<String>>(field: F, pattern: P) -> Self {
        WildcardQuery {
            field: field.into(),
            pattern: pattern.into(),
            boost: 1.0,
        }
    }

    /// Set the boost factor for this query.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Get the field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Get the wildcard pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn boost(&self) -> f32 {
        self.boost
    }

    pub fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }
}

impl fmt::Display for WildcardQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            escape_term(&self.field, false),
            escape_term(&self.pattern, true)
        )?;
        write_boost(f, self.boost)
    }
}

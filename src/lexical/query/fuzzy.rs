//! Fuzzy query implementation for approximate string matching.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lexical::query::{escape_term, format_float, write_boost};

/// Similarity used when a fuzzy term is written without a value (`term~`).
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.5;

/// A fuzzy query for approximate string matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyQuery {
    /// Field to search in
    field: String,
    /// Term to search for
    term: String,
    /// Minimum similarity in `[0, 1)`; lower values accept more edits
    min_similarity: f32,
    /// Minimum prefix length that must match exactly
    prefix_length: u32,
    /// Boost factor for the query
    boost: f32,
}

impl FuzzyQuery {
    /// Create a new fuzzy query with default settings.
    pub fn new<F: Into<String>, T: Into<String>>(field: F, term: T) -> Self {
        FuzzyQuery {
            field: field.into(),
            term: term.into(),
            min_similarity: DEFAULT_MIN_SIMILARITY,
            prefix_length: 0,
            boost: 1.0,
        }
    }

    /// Set the minimum similarity.
    pub fn min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    /// Set the minimum prefix length that must match exactly.
    pub fn prefix_length(mut self, prefix_length: u32) -> Self {
        self.prefix_length = prefix_length;
        self
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

    /// Get the search term.
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn get_min_similarity(&self) -> f32 {
        self.min_similarity
    }

    /// Get the prefix length.
    pub fn get_prefix_length(&self) -> u32 {
        self.prefix_length
    }

    pub fn boost(&self) -> f32 {
        self.boost
    }

    pub fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }
}

impl fmt::Display for FuzzyQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}~{}",
            escape_term(&self.field, false),
            escape_term(&self.term, false),
            format_float(self.min_similarity)
        )?;
        write_boost(f, self.boost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuzzy_query_defaults() {
        let query = FuzzyQuery::new("field", "term");
        assert_eq!(query.get_min_similarity(), 0.5);
        assert_eq!(query.get_prefix_length(), 0);
        assert_eq!(query.to_string(), "field:term~0.5");
    }

    #[test]
    fn test_fuzzy_query_rendering_with_boost() {
        let query = FuzzyQuery::new("field", "three")
            .min_similarity(0.2)
            .with_boost(3.0);
        assert_eq!(query.to_string(), "field:three~0.2^3.0");
    }
}

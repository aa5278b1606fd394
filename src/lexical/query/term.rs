//! Term query: a single analyzed token in a field.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lexical::query::{escape_term, write_boost};

/// Matches documents whose `field` contains exactly `text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermQuery {
    field: String,
    text: String,
    boost: f32,
}

impl TermQuery {
    pub fn new<F: Into<String>, T: Into<String>>(field: F, text: T) -> Self {
        TermQuery {
            field: field.into(),
            text: text.into(),
            boost: 1.0,
        }
    }

    /// Set the boost factor for this query.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn boost(&self) -> f32 {
        self.boost
    }

    pub fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }
}

impl fmt::Display for TermQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            escape_term(&self.field, false),
            escape_term(&self.text, false)
        )?;
        write_boost(f, self.boost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_query_rendering() {
        assert_eq!(TermQuery::new("title", "dog").to_string(), "title:dog");
        assert_eq!(
            TermQuery::new("field", "three").with_boost(0.5).to_string(),
            "field:three^0.5"
        );
    }

    #[test]
    fn test_reserved_characters_are_escaped() {
        assert_eq!(TermQuery::new("f", "a:b").to_string(), r"f:a\:b");
        assert_eq!(TermQuery::new("f", "(x)").to_string(), r"f:\(x\)");
        assert_eq!(TermQuery::new("f", "OR").to_string(), r"f:\OR");
    }
}

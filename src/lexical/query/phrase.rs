//! Phrase query implementation for positional matching of several terms.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lexical::query::{escape_phrase_term, escape_term, write_boost};

/// A query matching a sequence of terms at consecutive positions.
///
/// With a non-zero `slop` the terms may be up to `slop` positions apart
/// (proximity search, written `"a b"~3`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseQuery {
    /// Field to search in
    field: String,
    /// Analyzed terms, in order
    terms: Vec<String>,
    /// Maximum positional distance allowed between terms
    slop: u32,
    boost: f32,
}

impl PhraseQuery {
    /// Create a new exact phrase query.
    pub fn new<F: Into<String>>(field: F, terms: Vec<String>) -> Self {
        PhraseQuery {
            field: field.into(),
            terms,
            slop: 0,
            boost: 1.0,
        }
    }

    /// Set the slop (proximity) for this phrase.
    pub fn with_slop(mut self, slop: u32) -> Self {
        self.slop = slop;
        self
    }

    /// Set the boost factor for this query.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn slop(&self) -> u32 {
        self.slop
    }

    pub fn boost(&self) -> f32 {
        self.boost
    }

    pub fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }
}

impl fmt::Display for PhraseQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self.terms.iter().map(|t| escape_phrase_term(t)).collect();
        write!(f, "{}:\"{}\"", escape_term(&self.field, false), terms.join(" "))?;
        if self.slop != 0 {
            write!(f, "~{}", self.slop)?;
        }
        write_boost(f, self.boost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_query_rendering() {
        let phrase = PhraseQuery::new("x", vec!["something".into(), "else".into()]);
        assert_eq!(phrase.to_string(), "x:\"something else\"");

        let phrase = phrase.with_slop(3).with_boost(2.0);
        assert_eq!(phrase.to_string(), "x:\"something else\"~3^2.0");
        assert_eq!(phrase.terms().len(), 2);
    }
}

//! Term range query over lexicographically ordered terms.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lexical::query::{escape_bound, escape_term, write_boost};

/// Matches terms between `lower` and `upper`.
///
/// A missing bound is open (rendered as `*`). Each side is inclusive
/// (`[`/`]`) or exclusive (`{`/`}`) on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermRangeQuery {
    field: String,
    lower: Option<String>,
    upper: Option<String>,
    include_lower: bool,
    include_upper: bool,
    boost: f32,
}

impl TermRangeQuery {
    pub fn new<F: Into<String>>(
        field: F,
        lower: Option<String>,
        upper: Option<String>,
        include_lower: bool,
        include_upper: bool,
    ) -> Self {
        TermRangeQuery {
            field: field.into(),
            lower,
            upper,
            include_lower,
            include_upper,
            boost: 1.0,
        }
    }

    /// Inclusive range, `[lower TO upper]`.
    pub fn inclusive<F: Into<String>>(field: F, lower: Option<String>, upper: Option<String>) -> Self {
        Self::new(field, lower, upper, true, true)
    }

    /// Exclusive range, `{lower TO upper}`.
    pub fn exclusive<F: Into<String>>(field: F, lower: Option<String>, upper: Option<String>) -> Self {
        Self::new(field, lower, upper, false, false)
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn lower(&self) -> Option<&str> {
        self.lower.as_deref()
    }

    pub fn upper(&self) -> Option<&str> {
        self.upper.as_deref()
    }

    pub fn includes_lower(&self) -> bool {
        self.include_lower
    }

    pub fn includes_upper(&self) -> bool {
        self.include_upper
    }

    pub fn boost(&self) -> f32 {
        self.boost
    }

    pub fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }
}

impl fmt::Display for TermRangeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}{} TO {}{}",
            escape_term(&self.field, false),
            if self.include_lower { '[' } else { '{' },
            self.lower.as_deref().map_or_else(|| "*".to_string(), escape_bound),
            self.upper.as_deref().map_or_else(|| "*".to_string(), escape_bound),
            if self.include_upper { ']' } else { '}' },
        )?;
        write_boost(f, self.boost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_rendering() {
        let range = TermRangeQuery::inclusive("field", Some("one".into()), Some("five".into()));
        assert_eq!(range.to_string(), "field:[one TO five]");

        let range = TermRangeQuery::exclusive("z", Some("one".into()), None);
        assert_eq!(range.to_string(), "z:{one TO *}");

        let range = TermRangeQuery::new("z", None, Some("m".into()), true, false).with_boost(2.0);
        assert_eq!(range.to_string(), "z:[* TO m}^2.0");
    }
}

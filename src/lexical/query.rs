//! Lowered query model and its canonical string rendering.
//!
//! A [`Query`] is what the parser produces: a tree of boolean queries whose
//! leaves are term, phrase, fuzzy, wildcard, range or match-all queries.
//! The `Display` implementation is the canonical rendering used for
//! debugging and exact-format regression tests:
//!
//! - `+`/`-`/no prefix per clause occurrence
//! - `field:term` for leaves, `(...)` around nested boolean queries
//! - trailing `^boost` / `~similarity` suffixes
//! - `[a TO b]` and `{a TO b}` range brackets

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AqpError, Result};

pub mod boolean;
pub mod fuzzy;
pub mod match_all;
pub mod parser;
pub mod phrase;
pub mod range;
pub mod term;
pub mod wildcard;

pub use boolean::{BooleanClause, BooleanQuery, BooleanQueryBuilder, Occur};
pub use fuzzy::FuzzyQuery;
pub use match_all::MatchAllQuery;
pub use phrase::PhraseQuery;
pub use range::TermRangeQuery;
pub use term::TermQuery;
pub use wildcard::WildcardQuery;

/// A lowered query.
///
/// The whole tree derives serde, so a parsed query can be stored or sent
/// as JSON and read back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Query {
    Term(TermQuery),
    Phrase(PhraseQuery),
    Fuzzy(FuzzyQuery),
    Wildcard(WildcardQuery),
    Range(TermRangeQuery),
    MatchAll(MatchAllQuery),
    Boolean(BooleanQuery),
}

impl Query {
    /// Get the boost factor.
    pub fn boost(&self) -> f32 {
        match self {
            Query::Term(q) => q.boost(),
            Query::Phrase(q) => q.boost(),
            Query::Fuzzy(q) => q.boost(),
            Query::Wildcard(q) => q.boost(),
            Query::Range(q) => q.boost(),
            Query::MatchAll(q) => q.boost(),
            Query::Boolean(q) => q.boost(),
        }
    }

    /// Set the boost factor.
    pub fn set_boost(&mut self, boost: f32) {
        match self {
            Query::Term(q) => q.set_boost(boost),
            Query::Phrase(q) => q.set_boost(boost),
            Query::Fuzzy(q) => q.set_boost(boost),
            Query::Wildcard(q) => q.set_boost(boost),
            Query::Range(q) => q.set_boost(boost),
            Query::MatchAll(q) => q.set_boost(boost),
            Query::Boolean(q) => q.set_boost(boost),
        }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.set_boost(boost);
        self
    }

    /// The field a leaf query targets. Boolean and match-all queries have none.
    pub fn field(&self) -> Option<&str> {
        match self {
            Query::Term(q) => Some(q.field()),
            Query::Phrase(q) => Some(q.field()),
            Query::Fuzzy(q) => Some(q.field()),
            Query::Wildcard(q) => Some(q.field()),
            Query::Range(q) => Some(q.field()),
            Query::MatchAll(_) | Query::Boolean(_) => None,
        }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Query::Boolean(_))
    }

    pub fn as_boolean(&self) -> Option<&BooleanQuery> {
        match self {
            Query::Boolean(q) => Some(q),
            _ => None,
        }
    }

    /// Total number of boolean clauses in this query tree.
    pub fn clause_count(&self) -> usize {
        match self {
            Query::Boolean(q) => q.clause_count(),
            _ => 0,
        }
    }

    /// Check that this query can be rendered faithfully.
    ///
    /// Queries built by the parser always pass. Hand-built queries may carry
    /// empty field names, non-finite or negative boosts, or an out of range
    /// fuzzy similarity.
    pub fn validate(&self) -> Result<()> {
        let boost = self.boost();
        if !boost.is_finite() || boost < 0.0 {
            return Err(AqpError::syntax(format!(
                "malformed query: invalid boost {boost}"
            )));
        }
        if let Some(field) = self.field()
            && field.is_empty()
        {
            return Err(AqpError::syntax("malformed query: empty field name"));
        }
        match self {
            Query::Phrase(q) if q.terms().is_empty() => {
                Err(AqpError::syntax("malformed query: phrase without terms"))
            }
            Query::Fuzzy(q) if !(0.0..1.0).contains(&q.get_min_similarity()) => {
                Err(AqpError::syntax(format!(
                    "malformed query: fuzzy similarity {} outside [0, 1)",
                    q.get_min_similarity()
                )))
            }
            Query::Wildcard(q) if q.pattern().is_empty() => {
                Err(AqpError::syntax("malformed query: empty wildcard pattern"))
            }
            Query::Boolean(q) => q.clauses().iter().try_for_each(|c| c.query.validate()),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Term(q) => fmt::Display::fmt(q, f),
            Query::Phrase(q) => fmt::Display::fmt(q, f),
            Query::Fuzzy(q) => fmt::Display::fmt(q, f),
            Query::Wildcard(q) => fmt::Display::fmt(q, f),
            Query::Range(q) => fmt::Display::fmt(q, f),
            Query::MatchAll(q) => fmt::Display::fmt(q, f),
            Query::Boolean(q) => fmt::Display::fmt(q, f),
        }
    }
}

macro_rules! impl_from_query {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Query {
                fn from(query: $ty) -> Self {
                    Query::$variant(query)
                }
            }
        )*
    };
}

impl_from_query!(
    Term(TermQuery),
    Phrase(PhraseQuery),
    Fuzzy(FuzzyQuery),
    Wildcard(WildcardQuery),
    Range(TermRangeQuery),
    MatchAll(MatchAllQuery),
    Boolean(BooleanQuery),
);

/// Render a query in its canonical textual form.
pub fn render(query: &Query) -> String {
    query.to_string()
}

/// Render a query after checking it is well formed.
///
/// A malformed, caller-constructed query is reported as a syntax error.
pub fn try_render(query: &Query) -> Result<String> {
    query.validate()?;
    Ok(render(query))
}

/// Format a float the way the canonical rendering expects: integral values
/// keep one decimal (`2.0`), others use the shortest round-trip form (`0.8`).
pub(crate) fn format_float(value: f32) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Escape a term, fuzzy term or field name so it lexes back as one word.
///
/// Wildcard patterns already carry their own backslash escapes for `*`, `?`
/// and `\`, so with `pattern` set backslashes pass through unchanged.
pub(crate) fn escape_term(text: &str, pattern: bool) -> String {
    let mut out = String::with_capacity(text.len());
    if matches!(text, "AND" | "OR" | "NOT") {
        out.push('\\');
    }
    for (i, ch) in text.chars().enumerate() {
        let reserved = match ch {
            '\\' => !pattern,
            '"' | '(' | ')' | '^' | '~' | ':' | '[' | ']' | '{' | '}' => true,
            '+' | '-' | '!' | '&' | '|' => i == 0,
            c => c.is_whitespace(),
        };
        if reserved {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Escape one range bound. A bare `*` would read back as an open bound.
pub(crate) fn escape_bound(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    if matches!(text, "TO" | "*") {
        out.push('\\');
    }
    for ch in text.chars() {
        if ch.is_whitespace() || matches!(ch, '\\' | '"' | ']' | '}') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Escape one phrase term for rendering between double quotes.
pub(crate) fn escape_phrase_term(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

pub(crate) fn write_boost(f: &mut fmt::Formatter<'_>, boost: f32) -> fmt::Result {
    if boost != 1.0 {
        write!(f, "^{}", format_float(boost))?;
    }
    Ok(())
}

//! Lexical queries: the lowered query model and the query string parser.
//!
//! # Module Structure
//!
//! - `query`: Query types, canonical rendering and the `parser` that builds them

pub mod query;

// Re-exports
pub use query::parser::QueryParser;
pub use query::{
    BooleanClause, BooleanQuery, FuzzyQuery, MatchAllQuery, Occur, PhraseQuery, Query,
    TermQuery, TermRangeQuery, WildcardQuery,
};

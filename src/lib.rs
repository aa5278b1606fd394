//! # aqp
//!
//! A parser for boolean, field-scoped search queries in the classic
//! query-string syntax.
//!
//! ## Features
//!
//! - Hand-written lexer with backslash and `\uXXXX` escapes
//! - Recursive descent parser with a bounded nesting depth
//! - Lowering to a boolean query tree through a pluggable analyzer
//! - Canonical, exact string rendering of lowered queries
//!
//! ```
//! use std::sync::Arc;
//!
//! use aqp::{DefaultOperator, QueryParser, WhitespaceAnalyzer};
//!
//! let parser = QueryParser::new(Arc::new(WhitespaceAnalyzer::new()))
//!     .with_default_operator(DefaultOperator::And);
//! let query = parser.parse("one OR two NOT three", "field").unwrap();
//! assert_eq!(aqp::render(&query), "field:one (+field:two -field:three)");
//! ```

pub mod analysis;
mod error;
pub mod lexical;

// Re-exports for the public API
pub use analysis::{
    Analyzer, KeywordAnalyzer, PerFieldAnalyzer, SimpleAnalyzer, StandardAnalyzer,
    WhitespaceAnalyzer,
};
pub use error::{AqpError, Result};
pub use lexical::query::parser::{
    DefaultOperator, ParseOutput, ParserConfig, ParserConfigBuilder, ParserState, QueryParser,
    SyntaxNode, Token, TokenKind, parse_syntax, tokenize,
};
pub use lexical::query::{BooleanClause, BooleanQuery, Occur, Query, render, try_render};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

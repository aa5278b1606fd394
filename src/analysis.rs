//! Text analysis used to normalize literal term and phrase text.
//!
//! The query parser never hands control syntax (operators, parentheses,
//! field colons) to an analyzer. Only the literal content of terms and
//! quoted phrases flows through it:
//!
//! ```text
//! Term text → Analyzer (per field) → Tokens → Term / Phrase query
//! ```
//!
//! # Examples
//!
//! ```
//! use aqp::analysis::{Analyzer, SimpleAnalyzer};
//!
//! let analyzer = SimpleAnalyzer::new();
//! let tokens = analyzer.analyze("body", "Hello, World!").unwrap();
//! assert_eq!(tokens, vec!["hello", "world"]);
//! ```

pub mod analyzer;
pub mod keyword;
pub mod per_field;
pub mod simple;
pub mod standard;
pub mod whitespace;

// Re-exports
pub use analyzer::Analyzer;
pub use keyword::KeywordAnalyzer;
pub use per_field::PerFieldAnalyzer;
pub use simple::SimpleAnalyzer;
pub use standard::StandardAnalyzer;
pub use whitespace::WhitespaceAnalyzer;

//! Query string parser.
//!
//! Turns query text into a lowered [`Query`] in three stages:
//!
//! ```text
//! query text → tokenize → Tokens → parse_syntax → SyntaxNode → lowering → Query
//! ```
//!
//! # Supported Syntax
//!
//! - `term`, `field:term`, `field:(a b)`: terms and field scopes
//! - `"a phrase"`, `"a phrase"~2`: phrases with optional proximity
//! - `te?t*`: wildcards, `*:*` matches everything
//! - `term~`, `term~0.7`: fuzzy terms
//! - `[a TO b]`, `{a TO *}`: inclusive and exclusive ranges
//! - `AND`/`&&`, `OR`/`||`, `NOT`/`!`, `+`, `-`: boolean operators and modifiers
//! - `^0.8`: boosts
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use aqp::analysis::WhitespaceAnalyzer;
//! use aqp::lexical::query::parser::{DefaultOperator, QueryParser};
//!
//! let parser = QueryParser::new(Arc::new(WhitespaceAnalyzer::new()))
//!     .with_default_operator(DefaultOperator::And);
//!
//! let query = parser.parse("+title:(dog cat)", "field").unwrap();
//! assert_eq!(query.to_string(), "+title:dog +title:cat");
//! ```

use std::fmt;
use std::sync::Arc;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::analysis::Analyzer;
use crate::error::{AqpError, Result};
use crate::lexical::query::Query;
use crate::lexical::query::boolean::Occur;
use crate::lexical::query::fuzzy::DEFAULT_MIN_SIMILARITY;

pub mod grammar;
pub mod lexer;
mod lower;
pub mod syntax;

pub use grammar::{DEFAULT_MAX_DEPTH, parse_syntax};
pub use lexer::{Token, TokenKind, tokenize};
pub use syntax::{BooleanOperator, SyntaxNode};

use lower::Lowering;

/// Default maximum number of boolean clauses in one lowered query.
pub const DEFAULT_MAX_CLAUSE_COUNT: usize = 1024;

/// Operator joining juxtaposed operands (`a b`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DefaultOperator {
    And,
    #[default]
    Or,
}

impl DefaultOperator {
    /// Occurrence given to operands that carry no modifier of their own.
    pub fn occur(self) -> Occur {
        match self {
            DefaultOperator::And => Occur::Must,
            DefaultOperator::Or => Occur::Should,
        }
    }
}

impl fmt::Display for DefaultOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultOperator::And => f.write_str("AND"),
            DefaultOperator::Or => f.write_str("OR"),
        }
    }
}

/// Configuration for [`QueryParser`].
///
/// Every field has a default, so a JSON document only needs the settings it
/// changes:
///
/// ```
/// use aqp::lexical::query::parser::{DefaultOperator, ParserConfig};
///
/// let config = ParserConfig::from_json(r#"{"default_operator": "AND"}"#).unwrap();
/// assert_eq!(config.default_operator, DefaultOperator::And);
/// assert_eq!(config.max_clause_count, 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Operator for juxtaposed operands.
    pub default_operator: DefaultOperator,

    /// Maximum number of boolean clauses in one lowered query.
    pub max_clause_count: usize,

    /// Maximum nesting of groups and prefix modifiers.
    pub max_depth: usize,

    /// Similarity used by `term~` without an explicit value.
    pub fuzzy_min_similarity: f32,

    /// Leading characters a fuzzy match must share with the term.
    pub fuzzy_prefix_length: u32,

    /// Slop used by phrases without an explicit `~` value.
    pub phrase_slop: u32,

    /// Lower-case wildcard, fuzzy and range text, which skips analysis.
    pub lowercase_expanded_terms: bool,

    /// Log the syntax tree of every parse at debug level.
    pub debug_trace: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            default_operator: DefaultOperator::Or,
            max_clause_count: DEFAULT_MAX_CLAUSE_COUNT,
            max_depth: DEFAULT_MAX_DEPTH,
            fuzzy_min_similarity: DEFAULT_MIN_SIMILARITY,
            fuzzy_prefix_length: 0,
            phrase_slop: 0,
            lowercase_expanded_terms: true,
            debug_trace: false,
        }
    }
}

impl ParserConfig {
    /// Create a builder for ParserConfig.
    pub fn builder() -> ParserConfigBuilder {
        ParserConfigBuilder::default()
    }

    /// Load and validate a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ParserConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the parser cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_clause_count == 0 {
            return Err(AqpError::config("max_clause_count must be greater than 0"));
        }
        if self.max_depth == 0 {
            return Err(AqpError::config("max_depth must be greater than 0"));
        }
        if !(0.0..1.0).contains(&self.fuzzy_min_similarity) {
            return Err(AqpError::config(format!(
                "fuzzy_min_similarity must be in [0, 1), got {}",
                self.fuzzy_min_similarity
            )));
        }
        Ok(())
    }
}

/// Builder for [`ParserConfig`].
#[derive(Debug, Default)]
pub struct ParserConfigBuilder {
    config: ParserConfig,
}

impl ParserConfigBuilder {
    pub fn default_operator(mut self, operator: DefaultOperator) -> Self {
        self.config.default_operator = operator;
        self
    }

    pub fn max_clause_count(mut self, count: usize) -> Self {
        self.config.max_clause_count = count;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    pub fn fuzzy_min_similarity(mut self, similarity: f32) -> Self {
        self.config.fuzzy_min_similarity = similarity;
        self
    }

    pub fn fuzzy_prefix_length(mut self, length: u32) -> Self {
        self.config.fuzzy_prefix_length = length;
        self
    }

    pub fn phrase_slop(mut self, slop: u32) -> Self {
        self.config.phrase_slop = slop;
        self
    }

    pub fn lowercase_expanded_terms(mut self, lowercase: bool) -> Self {
        self.config.lowercase_expanded_terms = lowercase;
        self
    }

    pub fn debug_trace(mut self, enabled: bool) -> Self {
        self.config.debug_trace = enabled;
        self
    }

    pub fn build(self) -> ParserConfig {
        self.config
    }
}

/// Settings for a single parse call.
///
/// Built from the parser configuration and the call arguments, then dropped
/// when the call returns. Nothing in it is shared between calls.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserState {
    pub default_field: String,
    pub default_operator: DefaultOperator,
    pub max_clause_count: usize,
    pub debug_trace: bool,
}

impl ParserState {
    pub fn new(config: &ParserConfig, default_field: impl Into<String>) -> Self {
        ParserState {
            default_field: default_field.into(),
            default_operator: config.default_operator,
            max_clause_count: config.max_clause_count,
            debug_trace: config.debug_trace,
        }
    }
}

/// Result of [`QueryParser::parse_with_trace`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    pub query: Query,
    /// Indented dump of the syntax tree the query was lowered from.
    pub trace: String,
}

/// Parser for query strings.
///
/// A parser is immutable once built and can be shared between threads; every
/// call works on its own [`ParserState`].
#[derive(Debug, Clone)]
pub struct QueryParser {
    analyzer: Arc<dyn Analyzer>,
    config: ParserConfig,
}

impl QueryParser {
    /// Create a parser with the default configuration.
    pub fn new(analyzer: Arc<dyn Analyzer>) -> Self {
        QueryParser {
            analyzer,
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with a validated configuration.
    pub fn with_config(analyzer: Arc<dyn Analyzer>, config: ParserConfig) -> Result<Self> {
        config.validate()?;
        Ok(QueryParser { analyzer, config })
    }

    /// Set the operator for juxtaposed operands.
    pub fn with_default_operator(mut self, operator: DefaultOperator) -> Self {
        self.config.default_operator = operator;
        self
    }

    /// Set the maximum number of boolean clauses. Zero is raised to one.
    pub fn with_max_clause_count(mut self, count: usize) -> Self {
        self.config.max_clause_count = count.max(1);
        self
    }

    /// Log the syntax tree of every parse at debug level.
    pub fn with_debug_trace(mut self, enabled: bool) -> Self {
        self.config.debug_trace = enabled;
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn analyzer(&self) -> &Arc<dyn Analyzer> {
        &self.analyzer
    }

    /// Parse `query`, resolving unqualified terms against `default_field`.
    pub fn parse(&self, query: &str, default_field: &str) -> Result<Query> {
        let state = ParserState::new(&self.config, default_field);
        let tree = self.syntax_tree(query, &state)?;
        if state.debug_trace {
            debug!("syntax tree for {query:?}:\n{}", tree.trace());
        }
        Lowering::new(self.analyzer.as_ref(), &self.config, &state).lower(&tree)
    }

    /// Parse `query` and also return a dump of its syntax tree.
    pub fn parse_with_trace(&self, query: &str, default_field: &str) -> Result<ParseOutput> {
        let state = ParserState::new(&self.config, default_field);
        let tree = self.syntax_tree(query, &state)?;
        let trace = tree.trace();
        if state.debug_trace {
            debug!("syntax tree for {query:?}:\n{trace}");
        }
        let query = Lowering::new(self.analyzer.as_ref(), &self.config, &state).lower(&tree)?;
        Ok(ParseOutput { query, trace })
    }

    fn syntax_tree(&self, query: &str, state: &ParserState) -> Result<SyntaxNode> {
        let tokens = tokenize(query)?;
        trace!("tokenized {} tokens from {query:?}", tokens.len());
        parse_syntax(
            &tokens,
            &state.default_field,
            state.default_operator,
            self.config.max_depth,
        )
    }
}

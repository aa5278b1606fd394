//! Boolean query implementation for combining multiple queries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lexical::query::{Query, format_float};

/// Occurrence requirements for boolean clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occur {
    /// The clause must match (equivalent to AND).
    Must,
    /// The clause should match (equivalent to OR).
    Should,
    /// The clause must not match (equivalent to NOT).
    MustNot,
}

impl Occur {
    /// Prefix used when rendering a clause with this occurrence.
    pub fn prefix(self) -> &'static str {
        match self {
            Occur::Must => "+",
            Occur::Should => "",
            Occur::MustNot => "-",
        }
    }
}

/// A clause in a boolean query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanClause {
    /// The query for this clause.
    pub query: Query,
    /// The occurrence requirement.
    pub occur: Occur,
}

impl BooleanClause {
    /// Create a new boolean clause.
    pub fn new(query: impl Into<Query>, occur: Occur) -> Self {
        BooleanClause {
            query: query.into(),
            occur,
        }
    }

    /// Create a MUST clause.
    pub fn must(query: impl Into<Query>) -> Self {
        BooleanClause::new(query, Occur::Must)
    }

    /// Create a SHOULD clause.
    pub fn should(query: impl Into<Query>) -> Self {
        BooleanClause::new(query, Occur::Should)
    }

    /// Create a MUST_NOT clause.
    pub fn must_not(query: impl Into<Query>) -> Self {
        BooleanClause::new(query, Occur::MustNot)
    }
}

impl fmt::Display for BooleanClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.occur.prefix())?;
        match &self.query {
            Query::Boolean(sub) => write!(f, "({sub})"),
            other => write!(f, "{other}"),
        }
    }
}

/// A boolean query that combines multiple queries with boolean logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanQuery {
    /// The clauses in this boolean query.
    clauses: Vec<BooleanClause>,
    /// The boost factor for this query.
    boost: f32,
}

impl BooleanQuery {
    /// Create a new empty boolean query.
    pub fn new() -> Self {
        BooleanQuery {
            clauses: Vec::new(),
            boost: 1.0,
        }
    }

    /// Create a boolean query from existing clauses.
    pub fn from_clauses(clauses: Vec<BooleanClause>) -> Self {
        BooleanQuery {
            clauses,
            boost: 1.0,
        }
    }

    /// Add a clause to this boolean query.
    pub fn add_clause(&mut self, clause: BooleanClause) {
        self.clauses.push(clause);
    }

    /// Add a MUST clause.
    pub fn add_must(&mut self, query: impl Into<Query>) {
        self.add_clause(BooleanClause::must(query));
    }

    /// Add a SHOULD clause.
    pub fn add_should(&mut self, query: impl Into<Query>) {
        self.add_clause(BooleanClause::should(query));
    }

    /// Add a MUST_NOT clause.
    pub fn add_must_not(&mut self, query: impl Into<Query>) {
        self.add_clause(BooleanClause::must_not(query));
    }

    /// Set the boost factor.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn boost(&self) -> f32 {
        self.boost
    }

    pub fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }

    /// Get the clauses.
    pub fn clauses(&self) -> &[BooleanClause] {
        &self.clauses
    }

    /// Consume the query and return its clauses.
    pub fn into_clauses(self) -> Vec<BooleanClause> {
        self.clauses
    }

    /// Check if this query is empty.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Whether every clause is optional, so the query is a plain disjunction.
    pub fn is_disjunction(&self) -> bool {
        self.clauses.iter().all(|c| c.occur == Occur::Should)
    }

    /// Total number of clauses in this query and every nested boolean query.
    pub fn clause_count(&self) -> usize {
        self.clauses.len()
            + self
                .clauses
                .iter()
                .map(|c| c.query.clause_count())
                .sum::<usize>()
    }
}

impl Default for BooleanQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BooleanQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let boosted = self.boost != 1.0;
        if boosted {
            f.write_str("(")?;
        }
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{clause}")?;
        }
        if boosted {
            write!(f, ")^{}", format_float(self.boost))?;
        }
        Ok(())
    }
}

/// Builder for creating boolean queries.
#[derive(Debug, Default)]
pub struct BooleanQueryBuilder {
    query: BooleanQuery,
}

impl BooleanQueryBuilder {
    /// Create a new boolean query builder.
    pub fn new() -> Self {
        BooleanQueryBuilder {
            query: BooleanQuery::new(),
        }
    }

    /// Add a MUST clause.
    pub fn must(mut self, query: impl Into<Query>) -> Self {
        self.query.add_must(query);
        self
    }

    /// Add a SHOULD clause.
    pub fn should(mut self, query: impl Into<Query>) -> Self {
        self.query.add_should(query);
        self
    }

    /// Add a MUST_NOT clause.
    pub fn must_not(mut self, query: impl Into<Query>) -> Self {
        self.query.add_must_not(query);
        self
    }

    /// Set the boost factor.
    pub fn boost(mut self, boost: f32) -> Self {
        self.query = self.query.with_boost(boost);
        self
    }

    /// Build the boolean query.
    pub fn build(self) -> BooleanQuery {
        self.query
    }
}

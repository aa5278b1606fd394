//! Lowering of a syntax tree into a [`Query`].
//!
//! Every syntax node lowers to a [`Unit`]: a query together with the
//! occurrence and boosts written around it. Nested `+`, `-`, `^` and
//! redundant parentheses therefore collapse into one unit, and the enclosing
//! group decides how that unit becomes a clause:
//!
//! - In most groups (`AND`, `NOT`, juxtaposition, the root) the unit's
//!   occurrence is the clause occurrence. Boosts written before the first
//!   `-` multiply into the query: `((a)^2)^3` is `a^6.0`. When the chain
//!   starts with a negation, only the innermost boost binds and outer
//!   boosts are dropped.
//! - In an explicit `OR` group a prohibited unit becomes a
//!   `Should` clause holding the negation group `(-X)`. With two or more
//!   boosts the innermost binds to `X`; the outermost always binds to the
//!   negation group.

use crate::analysis::Analyzer;
use crate::error::{AqpError, Result};
use crate::lexical::query::parser::syntax::{BooleanOperator, SyntaxNode};
use crate::lexical::query::parser::{DefaultOperator, ParserConfig, ParserState};
use crate::lexical::query::{
    BooleanClause, BooleanQuery, FuzzyQuery, MatchAllQuery, Occur, PhraseQuery, Query,
    TermQuery, TermRangeQuery, WildcardQuery,
};

/// A lowered operand and the modifiers that still have to be placed.
#[derive(Debug)]
struct Unit {
    /// None when analysis removed every token.
    query: Option<Query>,
    occur: Option<Occur>,
    /// Boost chain, innermost first.
    boosts: Vec<f32>,
    /// Number of boosts already in the chain when it was first negated.
    negated_at: Option<usize>,
    /// Junction of the group `query` was built from, if any.
    operator: Option<BooleanOperator>,
}

impl Unit {
    fn leaf(query: impl Into<Query>) -> Self {
        Unit {
            query: Some(query.into()),
            occur: None,
            boosts: Vec::new(),
            negated_at: None,
            operator: None,
        }
    }

    fn empty() -> Self {
        Unit {
            query: None,
            occur: None,
            boosts: Vec::new(),
            negated_at: None,
            operator: None,
        }
    }

    fn is_leaf(&self) -> bool {
        matches!(&self.query, Some(q) if !q.is_boolean())
    }

    /// Whether this unit's clauses can be merged into an enclosing implicit
    /// group joined by `operator`.
    fn can_splice(&self, operator: BooleanOperator) -> bool {
        if self.query.is_none() {
            return true;
        }
        let plain = self.boosts.is_empty();
        match operator {
            BooleanOperator::Implicit(DefaultOperator::And) => {
                self.occur != Some(Occur::MustNot)
                    && (self.is_leaf() || (plain && self.operator == Some(BooleanOperator::And)))
            }
            BooleanOperator::Implicit(DefaultOperator::Or) => {
                // a required clause must stay scoped to its own group
                let optional_only =
                    matches!(&self.query, Some(Query::Boolean(q)) if q.is_disjunction());
                self.occur.is_none()
                    && (self.is_leaf()
                        || (plain && self.operator == Some(BooleanOperator::Or) && optional_only))
            }
            _ => false,
        }
    }

    /// Place this unit as a clause of a group.
    fn into_clause(self, default_occur: Occur, disjunctive: bool) -> Option<BooleanClause> {
        let mut query = self.query?;

        match self.occur {
            Some(Occur::MustNot) if disjunctive => {
                let (inner, outer) = match self.boosts.as_slice() {
                    [] => (None, None),
                    [only] => (None, Some(*only)),
                    [first, .., last] => (Some(*first), Some(*last)),
                };
                if let Some(boost) = inner {
                    query.set_boost(query.boost() * boost);
                }
                let mut negation = BooleanQuery::from_clauses(vec![BooleanClause::must_not(query)]);
                if let Some(boost) = outer {
                    negation.set_boost(boost);
                }
                Some(BooleanClause::new(negation, default_occur))
            }
            occur => {
                let boost = match self.negated_at {
                    Some(0) => self.boosts.first().copied(),
                    Some(n) => Some(self.boosts[..n].iter().product()),
                    None if self.boosts.is_empty() => None,
                    None => Some(self.boosts.iter().product()),
                };
                if let Some(boost) = boost {
                    query.set_boost(query.boost() * boost);
                }
                Some(BooleanClause::new(query, occur.unwrap_or(default_occur)))
            }
        }
    }
}

/// Lowers syntax trees for one parse call.
pub(crate) struct Lowering<'a> {
    analyzer: &'a dyn Analyzer,
    config: &'a ParserConfig,
    state: &'a ParserState,
}

impl<'a> Lowering<'a> {
    pub(crate) fn new(
        analyzer: &'a dyn Analyzer,
        config: &'a ParserConfig,
        state: &'a ParserState,
    ) -> Self {
        Lowering {
            analyzer,
            config,
            state,
        }
    }

    /// Lower a whole tree and enforce the clause limit.
    pub(crate) fn lower(&self, tree: &SyntaxNode) -> Result<Query> {
        let unit = self.lower_node(tree, &self.state.default_field)?;
        let query = match unit.into_clause(Occur::Must, false) {
            None => Query::Boolean(BooleanQuery::new()),
            Some(clause) if clause.occur == Occur::MustNot => {
                Query::Boolean(BooleanQuery::from_clauses(vec![clause]))
            }
            Some(clause) => clause.query,
        };

        let count = query.clause_count();
        if count > self.state.max_clause_count {
            return Err(AqpError::TooManyClauses {
                max: self.state.max_clause_count,
                count,
            });
        }
        Ok(query)
    }

    fn lower_node(&self, node: &SyntaxNode, scope: &str) -> Result<Unit> {
        match node {
            SyntaxNode::Term { field, text } => {
                let field = field.as_deref().unwrap_or(scope);
                self.analyzed(field, text, None)
            }
            SyntaxNode::Phrase { field, text, slop } => {
                let field = field.as_deref().unwrap_or(scope);
                self.analyzed(field, text, Some(slop.unwrap_or(self.config.phrase_slop)))
            }
            SyntaxNode::Wildcard { field, pattern } => {
                let field = field.as_deref().unwrap_or(scope);
                if field == "*" && pattern == "*" {
                    return Ok(Unit::leaf(MatchAllQuery::new()));
                }
                Ok(Unit::leaf(WildcardQuery::new(field, self.expanded(pattern))))
            }
            SyntaxNode::FuzzyTerm {
                field,
                text,
                similarity,
            } => {
                let field = field.as_deref().unwrap_or(scope);
                let query = FuzzyQuery::new(field, self.expanded(text))
                    .min_similarity(similarity.unwrap_or(self.config.fuzzy_min_similarity))
                    .prefix_length(self.config.fuzzy_prefix_length);
                Ok(Unit::leaf(query))
            }
            SyntaxNode::Range {
                field,
                lower,
                upper,
                include_lower,
                include_upper,
            } => {
                let field = field.as_deref().unwrap_or(scope);
                Ok(Unit::leaf(TermRangeQuery::new(
                    field,
                    lower.as_deref().map(|s| self.expanded(s)),
                    upper.as_deref().map(|s| self.expanded(s)),
                    *include_lower,
                    *include_upper,
                )))
            }
            SyntaxNode::FieldScoped { field, child } => self.lower_node(child, field),
            SyntaxNode::Boosted { boost, child } => {
                let mut unit = self.lower_node(child, scope)?;
                unit.boosts.push(*boost);
                if !unit.boosts.iter().product::<f32>().is_finite() {
                    return Err(AqpError::syntax(format!("boost {boost} is out of range")));
                }
                Ok(unit)
            }
            SyntaxNode::Required(child) => {
                let mut unit = self.lower_node(child, scope)?;
                if unit.occur != Some(Occur::MustNot) {
                    unit.occur = Some(Occur::Must);
                }
                Ok(unit)
            }
            SyntaxNode::Prohibited(child) => {
                let mut unit = self.lower_node(child, scope)?;
                unit.occur = Some(Occur::MustNot);
                unit.negated_at.get_or_insert(unit.boosts.len());
                Ok(unit)
            }
            SyntaxNode::Boolean { operator, children } => {
                let units = children
                    .iter()
                    .map(|child| self.lower_node(child, scope))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::group(*operator, units))
            }
        }
    }

    /// Run term or phrase text through the analyzer.
    fn analyzed(&self, field: &str, text: &str, slop: Option<u32>) -> Result<Unit> {
        let mut tokens = self.analyzer.analyze(field, text)?;
        Ok(match tokens.len() {
            0 => Unit::empty(),
            1 => Unit::leaf(TermQuery::new(field, tokens.remove(0))),
            _ => Unit::leaf(PhraseQuery::new(field, tokens).with_slop(slop.unwrap_or(0))),
        })
    }

    /// Text of wildcard, fuzzy and range queries skips analysis.
    fn expanded(&self, text: &str) -> String {
        if self.config.lowercase_expanded_terms {
            text.to_lowercase()
        } else {
            text.to_string()
        }
    }

    fn group(operator: BooleanOperator, units: Vec<Unit>) -> Unit {
        let default_occur = match operator {
            BooleanOperator::And | BooleanOperator::Not => Occur::Must,
            BooleanOperator::Or => Occur::Should,
            BooleanOperator::Implicit(op) => op.occur(),
        };
        // Juxtaposed `-x` stays a plain prohibited clause, even under OR.
        let disjunctive = operator == BooleanOperator::Or;
        let splice = units.iter().all(|u| u.can_splice(operator));

        let mut clauses = Vec::with_capacity(units.len());
        for (i, mut unit) in units.into_iter().enumerate() {
            if operator == BooleanOperator::Not && i > 0 {
                unit.occur = Some(Occur::MustNot);
            }
            if splice
                && unit.operator.is_some()
                && let Some(Query::Boolean(query)) = unit.query
            {
                clauses.extend(query.into_clauses());
                continue;
            }
            clauses.extend(unit.into_clause(default_occur, disjunctive));
        }

        match clauses.len() {
            0 => Unit::empty(),
            1 if clauses[0].occur != Occur::MustNot => {
                let clause = clauses.remove(0);
                Unit::leaf(clause.query)
            }
            _ => Unit {
                query: Some(Query::Boolean(BooleanQuery::from_clauses(clauses))),
                occur: None,
                boosts: Vec::new(),
                negated_at: None,
                operator: Some(operator),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::analysis::{StandardAnalyzer, WhitespaceAnalyzer};
    use crate::lexical::query::parser::grammar::parse_syntax;
    use crate::lexical::query::parser::lexer::tokenize;

    fn lower_with(input: &str, config: &ParserConfig, analyzer: &dyn Analyzer) -> Result<Query> {
        let state = ParserState::new(config, "field");
        let tokens = tokenize(input)?;
        let tree = parse_syntax(&tokens, "field", state.default_operator, config.max_depth)?;
        Lowering::new(analyzer, config, &state).lower(&tree)
    }

    fn lower(input: &str) -> String {
        let config = ParserConfig::builder()
            .default_operator(DefaultOperator::And)
            .build();
        lower_with(input, &config, &WhitespaceAnalyzer::new())
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_modifier_chain_collapses() {
        assert_eq!(lower("this (+(that)^0.7)"), "+field:this +field:that^0.7");
        assert_eq!(
            lower("this (+(-(that thus))^0.7)"),
            "+field:this -((+field:that +field:thus)^0.7)"
        );
        assert_eq!(
            lower("this (+(-(+(-(that thus))^0.1))^0.3)"),
            "+field:this -((+field:that +field:thus)^0.1)"
        );
    }

    #[test]
    fn test_boosts_multiply_until_negated() {
        assert_eq!(lower("((a)^2)^3"), "field:a^6.0");
        assert_eq!(lower("b ((a)^0.5)^0.5"), "+field:b +field:a^0.25");
        assert_eq!(lower("-((a)^2)^3"), "-field:a^6.0");
        // boosts outside the negation are dropped
        assert_eq!(lower("(-(a)^2)^3"), "-field:a^2.0");
        assert_eq!(lower("(-a)^3"), "-field:a^3.0");
    }

    #[test]
    fn test_negation_in_disjunction() {
        assert_eq!(
            lower("(+(-(a b)))^0.8 OR -(x y)^0.2"),
            "((-(+field:a +field:b))^0.8) ((-(+field:x +field:y))^0.2)"
        );
        assert_eq!(
            lower("+((+(-(a b)))^0.8)^0.7 OR -(x y)^0.2"),
            "((-((+field:a +field:b)^0.8))^0.7) ((-(+field:x +field:y))^0.2)"
        );
        assert_eq!(lower("a OR -b"), "field:a (-field:b)");
    }

    #[test]
    fn test_flattening() {
        assert_eq!(
            lower("A AND B C AND D"),
            "+field:A +field:B +field:C +field:D"
        );
        assert_eq!(
            lower("A AND B C AND D OR E"),
            "+(+field:A +field:B) +((+field:C +field:D) field:E)"
        );
        // a prohibited group is never spliced
        assert_eq!(lower("A AND B -(C AND D)"), "+(+field:A +field:B) -(+field:C +field:D)");
    }

    #[test]
    fn test_flattening_implicit_or() {
        let config = ParserConfig::default();
        let analyzer = WhitespaceAnalyzer::new();
        let lower = |input: &str| lower_with(input, &config, &analyzer).unwrap().to_string();

        assert_eq!(lower("a OR b c"), "field:a field:b field:c");
        assert_eq!(lower("c (a OR -b)"), "field:c field:a (-field:b)");
        // a required operand keeps its group
        assert_eq!(lower("c (a OR +b)"), "field:c (field:a +field:b)");
        assert_eq!(lower("(a OR +b) c"), "(field:a +field:b) field:c");
    }

    #[test]
    fn test_dropped_clauses() {
        let analyzer = StandardAnalyzer::new().with_stop_words(["the"]);
        let config = ParserConfig::default();

        let query = lower_with("the dog", &config, &analyzer).unwrap();
        assert_eq!(query.to_string(), "field:dog");

        let query = lower_with("the", &config, &analyzer).unwrap();
        assert_eq!(query, Query::Boolean(BooleanQuery::new()));

        let query = lower_with("\"the quick fox\"~2", &config, &analyzer).unwrap();
        assert_eq!(query.to_string(), "field:\"quick fox\"~2");
    }

    #[test]
    fn test_expanded_terms_are_lowercased() {
        assert_eq!(lower("Te?T*"), "field:te?t*");
        assert_eq!(lower("[A TO Z}"), "field:[a TO z}");
        assert_eq!(lower("Fuzzy~0.7"), "field:fuzzy~0.7");

        let config = ParserConfig::builder()
            .lowercase_expanded_terms(false)
            .build();
        let query = lower_with("Te?T*", &config, &WhitespaceAnalyzer::new()).unwrap();
        assert_eq!(query.to_string(), "field:Te?T*");
    }

    #[test]
    fn test_match_all() {
        assert_eq!(lower("*:*"), "*:*");
        assert_eq!(lower("\\*"), "field:*");
        assert_eq!(lower("x:*"), "x:*");
    }

    #[test]
    fn test_analyzer_errors_propagate() {
        #[derive(Debug)]
        struct Failing;

        impl Analyzer for Failing {
            fn analyze(&self, _field: &str, text: &str) -> Result<Vec<String>> {
                Err(AqpError::analysis(format!("cannot analyze '{text}'")))
            }

            fn name(&self) -> &'static str {
                "failing"
            }
        }

        let config = ParserConfig::default();
        let analyzer: Arc<dyn Analyzer> = Arc::new(Failing);
        assert!(matches!(
            lower_with("a b", &config, analyzer.as_ref()),
            Err(AqpError::Analysis(_))
        ));
    }

    #[test]
    fn test_clause_limit() {
        let config = ParserConfig::builder().max_clause_count(2).build();
        let result = lower_with("one two three", &config, &WhitespaceAnalyzer::new());
        assert_eq!(result, Err(AqpError::TooManyClauses { max: 2, count: 3 }));

        assert!(lower_with("one two", &config, &WhitespaceAnalyzer::new()).is_ok());
    }
}

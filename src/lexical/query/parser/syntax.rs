//! Syntax tree produced by the grammar, before analysis and lowering.

use std::fmt::{self, Write};

use crate::lexical::query::format_float;
use crate::lexical::query::parser::DefaultOperator;

/// Junction of a [`SyntaxNode::Boolean`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOperator {
    And,
    Or,
    /// Binary `NOT`: the first operand is kept, the rest are excluded.
    Not,
    /// Juxtaposed operands joined by the configured default operator.
    Implicit(DefaultOperator),
}

impl fmt::Display for BooleanOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BooleanOperator::And => f.write_str("AND"),
            BooleanOperator::Or => f.write_str("OR"),
            BooleanOperator::Not => f.write_str("NOT"),
            BooleanOperator::Implicit(op) => write!(f, "IMPLICIT({op})"),
        }
    }
}

/// A node of the query syntax tree.
///
/// Leaves carry an optional field; a leaf without one belongs to the nearest
/// enclosing [`SyntaxNode::FieldScoped`] node.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxNode {
    Term {
        field: Option<String>,
        text: String,
    },
    Phrase {
        field: Option<String>,
        text: String,
        /// Proximity written after `~`
        slop: Option<u32>,
    },
    Wildcard {
        field: Option<String>,
        pattern: String,
    },
    FuzzyTerm {
        field: Option<String>,
        text: String,
        /// Similarity written after `~`; the configured default applies when absent.
        similarity: Option<f32>,
    },
    Range {
        field: Option<String>,
        lower: Option<String>,
        upper: Option<String>,
        include_lower: bool,
        include_upper: bool,
    },
    FieldScoped {
        field: String,
        child: Box<SyntaxNode>,
    },
    Boolean {
        operator: BooleanOperator,
        children: Vec<SyntaxNode>,
    },
    Boosted {
        boost: f32,
        child: Box<SyntaxNode>,
    },
    Prohibited(Box<SyntaxNode>),
    Required(Box<SyntaxNode>),
}

impl SyntaxNode {
    pub fn term<S: Into<String>>(text: S) -> Self {
        SyntaxNode::Term {
            field: None,
            text: text.into(),
        }
    }

    /// Whether this node is a term, phrase, wildcard, fuzzy term or range.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            SyntaxNode::Term { .. }
                | SyntaxNode::Phrase { .. }
                | SyntaxNode::Wildcard { .. }
                | SyntaxNode::FuzzyTerm { .. }
                | SyntaxNode::Range { .. }
        )
    }

    /// Attach `name` to a leaf. Returns false for non-leaf nodes.
    pub(crate) fn set_field(&mut self, name: &str) -> bool {
        match self {
            SyntaxNode::Term { field, .. }
            | SyntaxNode::Phrase { field, .. }
            | SyntaxNode::Wildcard { field, .. }
            | SyntaxNode::FuzzyTerm { field, .. }
            | SyntaxNode::Range { field, .. } => {
                *field = Some(name.to_string());
                true
            }
            _ => false,
        }
    }

    /// Render the tree as an indented, one node per line trace.
    pub fn trace(&self) -> String {
        let mut out = String::new();
        self.write_trace(&mut out, 0);
        out
    }

    fn write_trace(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let field = |f: &Option<String>| f.as_deref().map(|f| format!("{f}:")).unwrap_or_default();
        // Writing to a String cannot fail.
        let _ = match self {
            SyntaxNode::Term { field: f, text } => writeln!(out, "{indent}TERM {}{text}", field(f)),
            SyntaxNode::Phrase { field: f, text, slop } => match slop {
                Some(slop) => writeln!(out, "{indent}PHRASE {}\"{text}\"~{slop}", field(f)),
                None => writeln!(out, "{indent}PHRASE {}\"{text}\"", field(f)),
            },
            SyntaxNode::Wildcard { field: f, pattern } => {
                writeln!(out, "{indent}WILDCARD {}{pattern}", field(f))
            }
            SyntaxNode::FuzzyTerm {
                field: f,
                text,
                similarity,
            } => match similarity {
                Some(s) => writeln!(out, "{indent}FUZZY {}{text}~{}", field(f), format_float(*s)),
                None => writeln!(out, "{indent}FUZZY {}{text}~", field(f)),
            },
            SyntaxNode::Range {
                field: f,
                lower,
                upper,
                include_lower,
                include_upper,
            } => writeln!(
                out,
                "{indent}RANGE {}{}{} TO {}{}",
                field(f),
                if *include_lower { '[' } else { '{' },
                lower.as_deref().unwrap_or("*"),
                upper.as_deref().unwrap_or("*"),
                if *include_upper { ']' } else { '}' },
            ),
            SyntaxNode::FieldScoped { field, child } => {
                let _ = writeln!(out, "{indent}FIELD {field}");
                child.write_trace(out, depth + 1);
                Ok(())
            }
            SyntaxNode::Boolean { operator, children } => {
                let _ = writeln!(out, "{indent}BOOLEAN {operator}");
                for child in children {
                    child.write_trace(out, depth + 1);
                }
                Ok(())
            }
            SyntaxNode::Boosted { boost, child } => {
                let _ = writeln!(out, "{indent}BOOST {}", format_float(*boost));
                child.write_trace(out, depth + 1);
                Ok(())
            }
            SyntaxNode::Prohibited(child) => {
                let _ = writeln!(out, "{indent}PROHIBITED");
                child.write_trace(out, depth + 1);
                Ok(())
            }
            SyntaxNode::Required(child) => {
                let _ = writeln!(out, "{indent}REQUIRED");
                child.write_trace(out, depth + 1);
                Ok(())
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_field_only_on_leaves() {
        let mut leaf = SyntaxNode::term("dog");
        assert!(leaf.set_field("title"));
        assert_eq!(
            leaf,
            SyntaxNode::Term {
                field: Some("title".into()),
                text: "dog".into()
            }
        );

        let mut group = SyntaxNode::Required(Box::new(SyntaxNode::term("dog")));
        assert!(!group.set_field("title"));
        assert!(!group.is_leaf());
    }

    #[test]
    fn test_trace() {
        let tree = SyntaxNode::FieldScoped {
            field: "field".into(),
            child: Box::new(SyntaxNode::Boolean {
                operator: BooleanOperator::Implicit(DefaultOperator::And),
                children: vec![
                    SyntaxNode::term("this"),
                    SyntaxNode::Boosted {
                        boost: 0.5,
                        child: Box::new(SyntaxNode::Prohibited(Box::new(SyntaxNode::FuzzyTerm {
                            field: Some("x".into()),
                            text: "that".into(),
                            similarity: None,
                        }))),
                    },
                ],
            }),
        };

        let expected = "\
FIELD field
  BOOLEAN IMPLICIT(AND)
    TERM this
    BOOST 0.5
      PROHIBITED
        FUZZY x:that~
";
        assert_eq!(tree.trace(), expected);
    }
}

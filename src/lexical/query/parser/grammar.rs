//! Recursive descent parser from tokens to a syntax tree.
//!
//! # Grammar
//!
//! ```text
//! query     := sequence EOF
//! sequence  := or_expr+
//! or_expr   := and_expr (OR and_expr)*
//! and_expr  := not_expr (AND not_expr)*
//! not_expr  := unary (NOT unary)*
//! unary     := ('+' | '-' | NOT) unary | suffixed
//! suffixed  := primary ('^' num | '~' num?)*
//! primary   := FIELD scoped | scoped
//! scoped    := '(' sequence ')' | TERM | WILDCARD | PHRASE | range
//! range     := ('[' | '{') bound TO bound (']' | '}')
//! bound     := TERM | PHRASE | '*'
//! ```
//!
//! Juxtaposed operands in a sequence are joined by the default operator.

use crate::error::{AqpError, Result};
use crate::lexical::query::parser::DefaultOperator;
use crate::lexical::query::parser::lexer::{Token, TokenKind};
use crate::lexical::query::parser::syntax::{BooleanOperator, SyntaxNode};

/// Default maximum nesting of groups and prefix modifiers.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Parse a token stream into a syntax tree rooted at `default_field`.
pub fn parse_syntax(
    tokens: &[Token],
    default_field: &str,
    default_operator: DefaultOperator,
    max_depth: usize,
) -> Result<SyntaxNode> {
    SyntaxParser::new(tokens, default_operator, max_depth).parse(default_field)
}

/// Parser state over a borrowed token stream.
struct SyntaxParser<'a> {
    tokens: &'a [Token],
    position: usize,
    default_operator: DefaultOperator,
    max_depth: usize,
    depth: usize,
}

impl<'a> SyntaxParser<'a> {
    fn new(tokens: &'a [Token], default_operator: DefaultOperator, max_depth: usize) -> Self {
        Self {
            tokens,
            position: 0,
            default_operator,
            max_depth,
            depth: 0,
        }
    }

    fn parse(mut self, default_field: &str) -> Result<SyntaxNode> {
        if self.tokens.is_empty() {
            return Err(AqpError::syntax("empty query"));
        }

        let node = self.parse_sequence()?;
        if let Some(token) = self.peek_token() {
            return Err(AqpError::syntax(format!(
                "unbalanced {} at position {}",
                token.kind, token.offset
            )));
        }

        Ok(SyntaxNode::FieldScoped {
            field: default_field.to_string(),
            child: Box::new(node),
        })
    }

    fn peek_token(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    fn peek(&self) -> Option<&'a TokenKind> {
        self.peek_token().map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.position);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// Describe where the next token starts, for error messages.
    fn location(&self) -> String {
        match self.peek_token() {
            Some(token) => format!("at position {}", token.offset),
            None => "at end of input".to_string(),
        }
    }

    fn enter(&mut self, offset: usize) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(AqpError::syntax(format!(
                "query nesting exceeds the maximum depth of {} at position {offset}",
                self.max_depth
            )));
        }
        Ok(())
    }

    fn exit(&mut self) {
        self.depth -= 1;
    }

    /// Whether the next token can start an operand.
    fn at_operand(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                TokenKind::Term(_)
                    | TokenKind::Wildcard(_)
                    | TokenKind::Phrase(_)
                    | TokenKind::Field(_)
                    | TokenKind::LParen
                    | TokenKind::LBracket
                    | TokenKind::LBrace
                    | TokenKind::Plus
                    | TokenKind::Minus
                    | TokenKind::Not
            )
        )
    }

    /// Whether the next primary is a parenthesized group, scoped or not.
    fn starts_group(&self) -> bool {
        match self.peek() {
            Some(TokenKind::LParen) => true,
            Some(TokenKind::Field(_)) => matches!(
                self.tokens.get(self.position + 1).map(|t| &t.kind),
                Some(TokenKind::LParen)
            ),
            _ => false,
        }
    }

    /// Parse: sequence := or_expr+
    fn parse_sequence(&mut self) -> Result<SyntaxNode> {
        let mut elements = Vec::new();
        while !matches!(self.peek(), None | Some(TokenKind::RParen)) {
            elements.push(self.parse_or()?);
        }

        match elements.len() {
            0 => Err(AqpError::syntax(format!("empty group {}", self.location()))),
            1 => Ok(elements.remove(0)),
            _ => Ok(SyntaxNode::Boolean {
                operator: BooleanOperator::Implicit(self.default_operator),
                children: elements,
            }),
        }
    }

    /// Parse one binary level: operand (OP operand)*
    fn parse_binary(
        &mut self,
        kind: &TokenKind,
        operator: BooleanOperator,
        operand: fn(&mut Self) -> Result<SyntaxNode>,
    ) -> Result<SyntaxNode> {
        let mut children = vec![operand(self)?];

        while self.peek() == Some(kind) {
            let Some(op) = self.advance() else { break };
            if !self.at_operand() {
                return Err(AqpError::syntax(format!(
                    "{} at position {} has no right operand",
                    op.kind, op.offset
                )));
            }
            children.push(operand(self)?);
        }

        if children.len() == 1 {
            Ok(children.remove(0))
        } else {
            Ok(SyntaxNode::Boolean { operator, children })
        }
    }

    /// Parse: or_expr := and_expr (OR and_expr)*
    fn parse_or(&mut self) -> Result<SyntaxNode> {
        self.parse_binary(&TokenKind::Or, BooleanOperator::Or, Self::parse_and)
    }

    /// Parse: and_expr := not_expr (AND not_expr)*
    fn parse_and(&mut self) -> Result<SyntaxNode> {
        self.parse_binary(&TokenKind::And, BooleanOperator::And, Self::parse_not)
    }

    /// Parse: not_expr := unary (NOT unary)*
    fn parse_not(&mut self) -> Result<SyntaxNode> {
        self.parse_binary(&TokenKind::Not, BooleanOperator::Not, Self::parse_unary)
    }

    /// Parse: unary := ('+' | '-' | NOT) unary | suffixed
    fn parse_unary(&mut self) -> Result<SyntaxNode> {
        let Some(token) = self.peek_token() else {
            return self.parse_suffixed();
        };
        if !matches!(token.kind, TokenKind::Plus | TokenKind::Minus | TokenKind::Not) {
            return self.parse_suffixed();
        }
        self.advance();

        if !self.at_operand() {
            return Err(AqpError::syntax(format!(
                "{} at position {} has no operand",
                token.kind, token.offset
            )));
        }

        self.enter(token.offset)?;
        let child = Box::new(self.parse_unary()?);
        self.exit();

        Ok(match token.kind {
            TokenKind::Plus => SyntaxNode::Required(child),
            _ => SyntaxNode::Prohibited(child),
        })
    }

    /// Parse: suffixed := primary ('^' num | '~' num?)*
    fn parse_suffixed(&mut self) -> Result<SyntaxNode> {
        let grouped = self.starts_group();
        let mut node = self.parse_primary()?;
        let mut boost: Option<f32> = None;
        let mut fuzzy_seen = false;

        while let Some(token) = self.peek_token() {
            match token.kind {
                TokenKind::Caret(Some(value)) => {
                    let product = boost.unwrap_or(1.0) * value;
                    if !product.is_finite() {
                        return Err(AqpError::syntax(format!(
                            "boost at position {} is out of range",
                            token.offset
                        )));
                    }
                    boost = Some(product);
                }
                TokenKind::Caret(None) => {
                    return Err(AqpError::syntax(format!(
                        "'^' at position {} requires a boost value",
                        token.offset
                    )));
                }
                TokenKind::Tilde(value) => {
                    if fuzzy_seen {
                        return Err(AqpError::syntax(format!(
                            "repeated '~' at position {}",
                            token.offset
                        )));
                    }
                    fuzzy_seen = true;
                    if grouped {
                        return Err(AqpError::syntax(format!(
                            "'~' at position {} cannot apply to a group",
                            token.offset
                        )));
                    }
                    node = Self::apply_tilde(node, value, token.offset)?;
                }
                _ => break,
            }
            self.advance();
        }

        Ok(match boost {
            Some(boost) => SyntaxNode::Boosted {
                boost,
                child: Box::new(node),
            },
            None => node,
        })
    }

    /// Turn a term into a fuzzy term, or give a phrase its slop.
    fn apply_tilde(node: SyntaxNode, value: Option<f32>, offset: usize) -> Result<SyntaxNode> {
        match node {
            SyntaxNode::Term { field, text } => {
                if let Some(s) = value
                    && !(0.0..1.0).contains(&s)
                {
                    return Err(AqpError::syntax(format!(
                        "fuzzy similarity {s} at position {offset} must be at least 0 and below 1"
                    )));
                }
                Ok(SyntaxNode::FuzzyTerm {
                    field,
                    text,
                    similarity: value,
                })
            }
            SyntaxNode::Phrase { field, text, .. } => Ok(SyntaxNode::Phrase {
                field,
                text,
                slop: value.map(|v| v as u32),
            }),
            _ => Err(AqpError::syntax(format!(
                "'~' at position {offset} only applies to a term or a phrase"
            ))),
        }
    }

    /// Parse: primary := FIELD scoped | scoped
    fn parse_primary(&mut self) -> Result<SyntaxNode> {
        let Some(Token {
            kind: TokenKind::Field(name),
            offset,
        }) = self.peek_token()
        else {
            return self.parse_scoped();
        };
        self.advance();

        let scoped_operand = matches!(
            self.peek(),
            Some(
                TokenKind::Term(_)
                    | TokenKind::Wildcard(_)
                    | TokenKind::Phrase(_)
                    | TokenKind::LParen
                    | TokenKind::LBracket
                    | TokenKind::LBrace
            )
        );
        if !scoped_operand {
            return Err(AqpError::syntax(format!(
                "field '{name}:' at position {offset} must be followed by a term, phrase, range or group"
            )));
        }

        let mut child = self.parse_scoped()?;
        if name == "*"
            && let SyntaxNode::Wildcard { pattern, .. } = &child
            && pattern == "*"
        {
            return Ok(SyntaxNode::Wildcard {
                field: Some("*".to_string()),
                pattern: "*".to_string(),
            });
        }
        if child.set_field(name) {
            Ok(child)
        } else {
            Ok(SyntaxNode::FieldScoped {
                field: name.clone(),
                child: Box::new(child),
            })
        }
    }

    /// Parse: scoped := '(' sequence ')' | TERM | WILDCARD | PHRASE | range
    fn parse_scoped(&mut self) -> Result<SyntaxNode> {
        let Some(token) = self.advance() else {
            return Err(AqpError::syntax("unexpected end of input, expected an operand"));
        };

        match &token.kind {
            TokenKind::LParen => {
                self.enter(token.offset)?;
                let inner = self.parse_sequence()?;
                match self.advance() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => {}
                    _ => {
                        return Err(AqpError::syntax(format!(
                            "unbalanced '(' at position {}",
                            token.offset
                        )));
                    }
                }
                self.exit();
                Ok(inner)
            }
            TokenKind::Term(text) if text == "*" => Ok(SyntaxNode::Wildcard {
                field: None,
                pattern: "*".to_string(),
            }),
            TokenKind::Term(text) => Ok(SyntaxNode::term(text.clone())),
            TokenKind::Wildcard(pattern) => Ok(SyntaxNode::Wildcard {
                field: None,
                pattern: pattern.clone(),
            }),
            TokenKind::Phrase(text) => Ok(SyntaxNode::Phrase {
                field: None,
                text: text.clone(),
                slop: None,
            }),
            TokenKind::LBracket | TokenKind::LBrace => self.parse_range(token),
            TokenKind::And | TokenKind::Or | TokenKind::Not => Err(AqpError::syntax(format!(
                "{} at position {} has no left operand",
                token.kind, token.offset
            ))),
            TokenKind::Caret(_) | TokenKind::Tilde(_) => Err(AqpError::syntax(format!(
                "modifier {} at position {} has no operand",
                token.kind, token.offset
            ))),
            _ => Err(AqpError::syntax(format!(
                "unexpected {} at position {}",
                token.kind, token.offset
            ))),
        }
    }

    /// Parse: range := ('[' | '{') bound TO bound (']' | '}')
    fn parse_range(&mut self, open: &Token) -> Result<SyntaxNode> {
        let include_lower = open.kind == TokenKind::LBracket;
        let lower = self.parse_bound(open)?;

        match self.advance() {
            Some(Token {
                kind: TokenKind::To,
                ..
            }) => {}
            _ => {
                return Err(AqpError::syntax(format!(
                    "range at position {} is missing 'TO'",
                    open.offset
                )));
            }
        }

        let upper = self.parse_bound(open)?;
        let include_upper = match self.advance().map(|t| &t.kind) {
            Some(TokenKind::RBracket) => true,
            Some(TokenKind::RBrace) => false,
            _ => {
                return Err(AqpError::syntax(format!(
                    "range at position {} has too many bounds",
                    open.offset
                )));
            }
        };

        Ok(SyntaxNode::Range {
            field: None,
            lower,
            upper,
            include_lower,
            include_upper,
        })
    }

    /// Parse: bound := TERM | PHRASE | '*'
    ///
    /// `*` is an open bound.
    fn parse_bound(&mut self, open: &Token) -> Result<Option<String>> {
        match self.peek() {
            Some(TokenKind::Wildcard(p)) if p == "*" => {
                self.advance();
                Ok(None)
            }
            Some(TokenKind::Term(text) | TokenKind::Phrase(text) | TokenKind::Wildcard(text)) => {
                self.advance();
                Ok(Some(text.clone()))
            }
            _ => Err(AqpError::syntax(format!(
                "range at position {} is missing a bound",
                open.offset
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::query::parser::lexer::tokenize;

    fn parse(input: &str) -> Result<SyntaxNode> {
        let tokens = tokenize(input)?;
        parse_syntax(&tokens, "field", DefaultOperator::And, DEFAULT_MAX_DEPTH)
    }

    fn root(node: SyntaxNode) -> SyntaxNode {
        SyntaxNode::FieldScoped {
            field: "field".into(),
            child: Box::new(node),
        }
    }

    fn term(text: &str) -> SyntaxNode {
        SyntaxNode::term(text)
    }

    fn field_term(field: &str, text: &str) -> SyntaxNode {
        SyntaxNode::Term {
            field: Some(field.into()),
            text: text.into(),
        }
    }

    fn boolean(operator: BooleanOperator, children: Vec<SyntaxNode>) -> SyntaxNode {
        SyntaxNode::Boolean { operator, children }
    }

    #[test]
    fn test_single_term() {
        assert_eq!(parse("hello").unwrap(), root(term("hello")));
    }

    #[test]
    fn test_juxtaposition_uses_default_operator() {
        let tokens = tokenize("a b").unwrap();
        let tree = parse_syntax(&tokens, "f", DefaultOperator::Or, 8).unwrap();
        assert_eq!(
            tree,
            SyntaxNode::FieldScoped {
                field: "f".into(),
                child: Box::new(boolean(
                    BooleanOperator::Implicit(DefaultOperator::Or),
                    vec![term("a"), term("b")]
                )),
            }
        );
    }

    #[test]
    fn test_precedence() {
        // OR binds looser than AND, which binds looser than NOT
        assert_eq!(
            parse("a OR b AND c NOT d").unwrap(),
            root(boolean(
                BooleanOperator::Or,
                vec![
                    term("a"),
                    boolean(
                        BooleanOperator::And,
                        vec![term("b"), boolean(BooleanOperator::Not, vec![term("c"), term("d")])]
                    ),
                ]
            ))
        );
    }

    #[test]
    fn test_not_is_n_ary() {
        assert_eq!(
            parse("one NOT two NOT three").unwrap(),
            root(boolean(
                BooleanOperator::Not,
                vec![term("one"), term("two"), term("three")]
            ))
        );
    }

    #[test]
    fn test_prefix_modifiers() {
        assert_eq!(
            parse("+a -b NOT c").unwrap(),
            root(boolean(
                BooleanOperator::Implicit(DefaultOperator::And),
                vec![
                    SyntaxNode::Required(Box::new(term("a"))),
                    boolean(
                        BooleanOperator::Not,
                        vec![SyntaxNode::Prohibited(Box::new(term("b"))), term("c")]
                    ),
                ]
            ))
        );
        assert_eq!(
            parse("NOT a").unwrap(),
            root(SyntaxNode::Prohibited(Box::new(term("a"))))
        );
    }

    #[test]
    fn test_field_scope() {
        assert_eq!(
            parse("+title:(dog cat)").unwrap(),
            root(SyntaxNode::Required(Box::new(SyntaxNode::FieldScoped {
                field: "title".into(),
                child: Box::new(boolean(
                    BooleanOperator::Implicit(DefaultOperator::And),
                    vec![term("dog"), term("cat")]
                )),
            })))
        );
        assert_eq!(parse("x:one").unwrap(), root(field_term("x", "one")));
    }

    #[test]
    fn test_single_element_group_is_the_element() {
        assert_eq!(parse("((((a))))").unwrap(), root(term("a")));
    }

    #[test]
    fn test_boost_and_fuzzy() {
        assert_eq!(
            parse("a^2^0.5").unwrap(),
            root(SyntaxNode::Boosted {
                boost: 1.0,
                child: Box::new(term("a"))
            })
        );
        assert_eq!(
            parse("term~").unwrap(),
            root(SyntaxNode::FuzzyTerm {
                field: None,
                text: "term".into(),
                similarity: None
            })
        );
        assert_eq!(
            parse("x:term~0.2^3").unwrap(),
            root(SyntaxNode::Boosted {
                boost: 3.0,
                child: Box::new(SyntaxNode::FuzzyTerm {
                    field: Some("x".into()),
                    text: "term".into(),
                    similarity: Some(0.2)
                })
            })
        );
        assert_eq!(
            parse("\"a b\"~3").unwrap(),
            root(SyntaxNode::Phrase {
                field: None,
                text: "a b".into(),
                slop: Some(3)
            })
        );
    }

    #[test]
    fn test_boost_on_group_keeps_nesting() {
        assert_eq!(
            parse("((a)^0.8)^0.7").unwrap(),
            root(SyntaxNode::Boosted {
                boost: 0.7,
                child: Box::new(SyntaxNode::Boosted {
                    boost: 0.8,
                    child: Box::new(term("a"))
                })
            })
        );
    }

    #[test]
    fn test_ranges() {
        assert_eq!(
            parse("z:{\"one\" TO *]").unwrap(),
            root(SyntaxNode::Range {
                field: Some("z".into()),
                lower: Some("one".into()),
                upper: None,
                include_lower: false,
                include_upper: true,
            })
        );
    }

    #[test]
    fn test_match_all() {
        assert_eq!(
            parse("*:*").unwrap(),
            root(SyntaxNode::Wildcard {
                field: Some("*".into()),
                pattern: "*".into()
            })
        );
        assert_eq!(
            parse(r"\*").unwrap(),
            root(SyntaxNode::Wildcard {
                field: None,
                pattern: "*".into()
            })
        );
    }

    #[test]
    fn test_syntax_errors() {
        for input in [
            "",
            "()",
            "(a",
            "a)",
            "a +",
            "a -",
            "NOT",
            "a AND",
            "AND a",
            "a OR OR b",
            "title:",
            "title: +a",
            "^2",
            "a^",
            "[a b]",
            "[a TO]",
            "[TO b]",
            "(a)~",
            "a*~",
            "a~~",
            "a~1.5",
            "[a TO b]~",
            "]",
        ] {
            let result = parse(input);
            assert!(
                matches!(result, Err(AqpError::Syntax(_))),
                "expected a syntax error for {input:?}, got {result:?}"
            );
        }
    }

    #[test]
    fn test_depth_limit() {
        let tokens = tokenize("((((a))))").unwrap();
        assert!(parse_syntax(&tokens, "f", DefaultOperator::Or, 4).is_ok());
        assert!(matches!(
            parse_syntax(&tokens, "f", DefaultOperator::Or, 3),
            Err(AqpError::Syntax(_))
        ));

        let deep = format!("{}a", "+".repeat(100));
        let tokens = tokenize(&deep).unwrap();
        assert!(parse_syntax(&tokens, "f", DefaultOperator::Or, DEFAULT_MAX_DEPTH).is_err());
    }
}

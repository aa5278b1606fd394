//! Lexer for query string syntax.
//!
//! Tokenizes query strings into a stream of tokens. Whitespace separates
//! tokens and is never emitted. A backslash makes the next character literal
//! (`\uXXXX` decodes a code point); escapes are folded into the text of the
//! surrounding term or phrase and never surface as tokens of their own.

use std::fmt;

use crate::error::{AqpError, Result};

/// Token types for query string parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// An unquoted word with escapes resolved.
    Term(String),
    /// An unquoted word containing an unescaped `*` or `?`. Literal wildcard
    /// characters stay escaped in the pattern.
    Wildcard(String),
    /// A quoted string, kept as a single unit.
    Phrase(String),
    /// A field name followed by a colon (`title:`).
    Field(String),

    /// AND operator (`AND`, `&&`)
    And,
    /// OR operator (`OR`, `||`)
    Or,
    /// NOT operator (`NOT`, `!`)
    Not,
    /// Required prefix modifier
    Plus,
    /// Prohibited prefix modifier
    Minus,

    LParen,
    RParen,
    /// Inclusive range bound `[` / `]`
    LBracket,
    RBracket,
    /// Exclusive range bound `{` / `}`
    LBrace,
    RBrace,
    /// TO keyword, only inside range brackets
    To,

    /// Boost modifier with the value written right after it
    Caret(Option<f32>),
    /// Fuzzy/proximity modifier with the value written right after it
    Tilde(Option<f32>),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Term(t) => write!(f, "term '{t}'"),
            TokenKind::Wildcard(p) => write!(f, "wildcard '{p}'"),
            TokenKind::Phrase(p) => write!(f, "phrase \"{p}\""),
            TokenKind::Field(name) => write!(f, "field '{name}:'"),
            TokenKind::And => f.write_str("'AND'"),
            TokenKind::Or => f.write_str("'OR'"),
            TokenKind::Not => f.write_str("'NOT'"),
            TokenKind::Plus => f.write_str("'+'"),
            TokenKind::Minus => f.write_str("'-'"),
            TokenKind::LParen => f.write_str("'('"),
            TokenKind::RParen => f.write_str("')'"),
            TokenKind::LBracket => f.write_str("'['"),
            TokenKind::RBracket => f.write_str("']'"),
            TokenKind::LBrace => f.write_str("'{'"),
            TokenKind::RBrace => f.write_str("'}'"),
            TokenKind::To => f.write_str("'TO'"),
            TokenKind::Caret(_) => f.write_str("'^'"),
            TokenKind::Tilde(_) => f.write_str("'~'"),
        }
    }
}

/// A token and the character offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, offset: usize) -> Self {
        Token { kind, offset }
    }
}

/// Tokenize a query string.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

/// A word read from the input.
struct Word {
    /// Literal text with escapes resolved
    text: String,
    /// Wildcard pattern: like `text` but literal `*`, `?` and `\` stay escaped
    pattern: String,
    /// Whether any character was escaped
    escaped: bool,
    /// Whether an unescaped `*` or `?` occurred
    wildcard: bool,
}

/// Lexer for tokenizing query strings.
struct Lexer {
    input: Vec<char>,
    position: usize,
    /// Offset of the opening bracket while inside a range
    range_start: Option<usize>,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            range_start: None,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace();

        let Some(ch) = self.current_char() else {
            if let Some(start) = self.range_start {
                return Err(AqpError::lex(format!(
                    "unterminated range starting at position {start}"
                )));
            }
            return Ok(None);
        };

        let start = self.position;
        let kind = if self.range_start.is_some() {
            self.range_token(ch)?
        } else {
            self.query_token(ch)?
        };
        Ok(Some(Token::new(kind, start)))
    }

    /// Lex one token outside range brackets.
    fn query_token(&mut self, ch: char) -> Result<TokenKind> {
        let start = self.position;
        let single = match ch {
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            ']' => Some(TokenKind::RBracket),
            '}' => Some(TokenKind::RBrace),
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '!' => Some(TokenKind::Not),
            '[' | '{' => {
                self.range_start = Some(start);
                Some(if ch == '[' {
                    TokenKind::LBracket
                } else {
                    TokenKind::LBrace
                })
            }
            _ => None,
        };
        if let Some(kind) = single {
            self.position += 1;
            return Ok(kind);
        }

        match ch {
            '&' if self.peek() == Some('&') => {
                self.position += 2;
                Ok(TokenKind::And)
            }
            '|' if self.peek() == Some('|') => {
                self.position += 2;
                Ok(TokenKind::Or)
            }
            '"' => self.read_quoted().map(TokenKind::Phrase),
            '^' => {
                self.position += 1;
                Ok(TokenKind::Caret(self.read_number()?))
            }
            '~' => {
                self.position += 1;
                Ok(TokenKind::Tilde(self.read_number()?))
            }
            ':' => Err(AqpError::lex(format!(
                "unexpected ':' without a field name at position {start}"
            ))),
            _ => {
                let word = self.read_word(false)?;
                if self.current_char() == Some(':') {
                    self.position += 1;
                    return Ok(TokenKind::Field(word.text));
                }
                if !word.escaped {
                    match word.text.as_str() {
                        "AND" => return Ok(TokenKind::And),
                        "OR" => return Ok(TokenKind::Or),
                        "NOT" => return Ok(TokenKind::Not),
                        _ => {}
                    }
                }
                if word.wildcard {
                    Ok(TokenKind::Wildcard(word.pattern))
                } else {
                    Ok(TokenKind::Term(word.text))
                }
            }
        }
    }

    /// Lex one token inside range brackets.
    fn range_token(&mut self, ch: char) -> Result<TokenKind> {
        match ch {
            ']' | '}' => {
                self.position += 1;
                self.range_start = None;
                Ok(if ch == ']' {
                    TokenKind::RBracket
                } else {
                    TokenKind::RBrace
                })
            }
            '"' => self.read_quoted().map(TokenKind::Phrase),
            _ => {
                let word = self.read_word(true)?;
                if !word.escaped && word.text == "TO" {
                    Ok(TokenKind::To)
                } else if word.wildcard {
                    Ok(TokenKind::Wildcard(word.pattern))
                } else {
                    Ok(TokenKind::Term(word.text))
                }
            }
        }
    }

    fn is_word_end(ch: char, in_range: bool) -> bool {
        if ch.is_whitespace() || ch == '"' {
            return true;
        }
        if in_range {
            return matches!(ch, ']' | '}');
        }
        matches!(ch, '(' | ')' | '^' | '~' | ':' | '[' | ']' | '{' | '}')
    }

    fn read_word(&mut self, in_range: bool) -> Result<Word> {
        let mut word = Word {
            text: String::new(),
            pattern: String::new(),
            escaped: false,
            wildcard: false,
        };

        while let Some(ch) = self.current_char() {
            if Self::is_word_end(ch, in_range) {
                break;
            }
            self.position += 1;
            match ch {
                '\\' => {
                    let escaped = self.read_escape()?;
                    word.escaped = true;
                    word.text.push(escaped);
                    if matches!(escaped, '*' | '?' | '\\') {
                        word.pattern.push('\\');
                    }
                    word.pattern.push(escaped);
                }
                '*' | '?' => {
                    word.wildcard = true;
                    word.text.push(ch);
                    word.pattern.push(ch);
                }
                _ => {
                    word.text.push(ch);
                    word.pattern.push(ch);
                }
            }
        }

        Ok(word)
    }

    /// Resolve the escape sequence following a backslash that has already
    /// been consumed.
    fn read_escape(&mut self) -> Result<char> {
        let backslash = self.position - 1;
        let Some(ch) = self.current_char() else {
            return Err(AqpError::lex(format!(
                "trailing backslash at position {backslash}"
            )));
        };
        self.position += 1;
        if ch != 'u' {
            return Ok(ch);
        }

        let digits: String = self.input[self.position..]
            .iter()
            .take(4)
            .take_while(|c| c.is_ascii_hexdigit())
            .collect();
        if digits.len() != 4 {
            return Err(AqpError::lex(format!(
                "invalid unicode escape at position {backslash}"
            )));
        }
        self.position += 4;
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| {
                AqpError::lex(format!(
                    "invalid unicode escape '\\u{digits}' at position {backslash}"
                ))
            })
    }

    /// Read a quoted string. The current character is the opening quote.
    fn read_quoted(&mut self) -> Result<String> {
        let start = self.position;
        self.position += 1;
        let mut s = String::new();

        while let Some(ch) = self.current_char() {
            self.position += 1;
            match ch {
                '"' => return Ok(s),
                '\\' => s.push(self.read_escape()?),
                _ => s.push(ch),
            }
        }

        Err(AqpError::lex(format!(
            "unterminated quoted string starting at position {start}"
        )))
    }

    /// Read the number written right after `^` or `~`, if any.
    fn read_number(&mut self) -> Result<Option<f32>> {
        let start = self.position;
        let starts_number = match self.current_char() {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => self.peek().is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        };
        if !starts_number {
            return Ok(None);
        }

        while self
            .current_char()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
        {
            self.position += 1;
        }
        let text: String = self.input[start..self.position].iter().collect();
        if let Some(ch) = self.current_char()
            && !Self::is_word_end(ch, false)
        {
            return Err(AqpError::lex(format!(
                "unexpected '{ch}' after number '{text}' at position {}",
                self.position
            )));
        }
        match text.parse::<f32>() {
            Ok(value) if value.is_finite() => Ok(Some(value)),
            Ok(_) => Err(AqpError::lex(format!(
                "number '{text}' out of range at position {start}"
            ))),
            Err(_) => Err(AqpError::lex(format!(
                "invalid number '{text}' at position {start}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn term(s: &str) -> TokenKind {
        TokenKind::Term(s.to_string())
    }

    #[test]
    fn test_terms_and_operators() {
        assert_eq!(
            kinds("A AND B OR c NOT d and"),
            vec![
                term("A"),
                TokenKind::And,
                term("B"),
                TokenKind::Or,
                term("c"),
                TokenKind::Not,
                term("d"),
                term("and"),
            ]
        );
        assert_eq!(
            kinds("a && b || !c"),
            vec![
                term("a"),
                TokenKind::And,
                term("b"),
                TokenKind::Or,
                TokenKind::Not,
                term("c"),
            ]
        );
    }

    #[test]
    fn test_prefix_modifiers_only_at_token_start() {
        assert_eq!(
            kinds("+one -two kahnn-strauss"),
            vec![
                TokenKind::Plus,
                term("one"),
                TokenKind::Minus,
                term("two"),
                term("kahnn-strauss"),
            ]
        );
    }

    #[test]
    fn test_field_and_group() {
        assert_eq!(
            kinds("title:(dog cat)"),
            vec![
                TokenKind::Field("title".into()),
                TokenKind::LParen,
                term("dog"),
                term("cat"),
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn test_suffix_modifiers() {
        assert_eq!(
            kinds("term~ two^0.5 three~0.2 x^ .5"),
            vec![
                term("term"),
                TokenKind::Tilde(None),
                term("two"),
                TokenKind::Caret(Some(0.5)),
                term("three"),
                TokenKind::Tilde(Some(0.2)),
                term("x"),
                TokenKind::Caret(None),
                term(".5"),
            ]
        );
    }

    #[test]
    fn test_phrase_keeps_content_literal() {
        assert_eq!(
            kinds(r#"x:"someth* else~2" "a \"b c\" d""#),
            vec![
                TokenKind::Field("x".into()),
                TokenKind::Phrase("someth* else~2".into()),
                TokenKind::Phrase("a \"b c\" d".into()),
            ]
        );
    }

    #[test]
    fn test_escapes() {
        assert_eq!(kinds(r"\*"), vec![term("*")]);
        assert_eq!(kinds(r"a\:b \(c\)"), vec![term("a:b"), term("(c)")]);
        assert_eq!(kinds(r"\AND"), vec![term("AND")]);
        assert_eq!(kinds(r"café"), vec![term("café")]);
        assert_eq!(kinds(r"a\ b"), vec![term("a b")]);
    }

    #[test]
    fn test_wildcards() {
        assert_eq!(
            kinds(r"te?t* * lit\*eral*"),
            vec![
                TokenKind::Wildcard("te?t*".into()),
                TokenKind::Wildcard("*".into()),
                TokenKind::Wildcard(r"lit\*eral*".into()),
            ]
        );
    }

    #[test]
    fn test_range_mode() {
        assert_eq!(
            kinds(r#"z:{"one" TO *] [a TO b}"#),
            vec![
                TokenKind::Field("z".into()),
                TokenKind::LBrace,
                TokenKind::Phrase("one".into()),
                TokenKind::To,
                TokenKind::Wildcard("*".into()),
                TokenKind::RBracket,
                TokenKind::LBracket,
                term("a"),
                TokenKind::To,
                term("b"),
                TokenKind::RBrace,
            ]
        );
    }

    #[test]
    fn test_offsets() {
        let tokens = tokenize("  a  (b)").unwrap();
        let offsets: Vec<usize> = tokens.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![2, 5, 6, 7]);
    }

    #[test]
    fn test_whitespace_only() {
        assert!(tokenize("   \t\n").unwrap().is_empty());
    }

    #[test]
    fn test_lex_errors() {
        assert!(matches!(tokenize("\"hello"), Err(AqpError::Lex(_))));
        assert!(matches!(tokenize("hello\\"), Err(AqpError::Lex(_))));
        assert!(matches!(tokenize(r"\u12"), Err(AqpError::Lex(_))));
        assert!(matches!(tokenize(r"\ud800"), Err(AqpError::Lex(_))));
        assert!(matches!(tokenize("[one TO five"), Err(AqpError::Lex(_))));
        assert!(matches!(tokenize(":x"), Err(AqpError::Lex(_))));
        assert!(matches!(tokenize("x^1.2.3"), Err(AqpError::Lex(_))));
    }

    #[test]
    fn test_numbers_must_be_finite_and_complete() {
        let huge = format!("a^1{}", "0".repeat(40));
        assert!(matches!(tokenize(&huge), Err(AqpError::Lex(_))));
        assert!(matches!(tokenize("a^1e5"), Err(AqpError::Lex(_))));
        assert!(matches!(tokenize("a~0.5b"), Err(AqpError::Lex(_))));

        assert_eq!(
            kinds("(a)^2) b^3 c~0.5\"x\""),
            vec![
                TokenKind::LParen,
                term("a"),
                TokenKind::RParen,
                TokenKind::Caret(Some(2.0)),
                TokenKind::RParen,
                term("b"),
                TokenKind::Caret(Some(3.0)),
                term("c"),
                TokenKind::Tilde(Some(0.5)),
                TokenKind::Phrase("x".into()),
            ]
        );
    }
}

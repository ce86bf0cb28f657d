//! `XPath` 1.0 tokenizer.
//!
//! Names are read as raw `QName`s and classified afterwards, because their
//! role depends on the neighbouring tokens: a name before `(` is a
//! function or node type, a name before `::` is an axis, and after an
//! operand `*`, `and`, `or`, `div` and `mod` are operators.

use std::fmt;

use super::types::XPathError;
use crate::parser::{is_name_char, is_name_start_char};

const NODE_TYPES: [&str; 4] = ["comment", "text", "processing-instruction", "node"];
const OPERATOR_NAMES: [&str; 4] = ["and", "or", "div", "mod"];

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Dot,
    DotDot,
    At,
    Comma,
    ColonColon,
    Slash,
    DoubleSlash,
    Pipe,
    Plus,
    Minus,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    /// An operator: `*`, `and`, `or`, `div` or `mod`.
    Operator(&'static str),
    Number(f64),
    Literal(String),
    /// A name test: `QName`, `*` or `prefix:*`.
    Name(String),
    Variable(String),
    Function(String),
    NodeType(String),
    Axis(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LeftParen => f.write_str("("),
            Self::RightParen => f.write_str(")"),
            Self::LeftBracket => f.write_str("["),
            Self::RightBracket => f.write_str("]"),
            Self::Dot => f.write_str("."),
            Self::DotDot => f.write_str(".."),
            Self::At => f.write_str("@"),
            Self::Comma => f.write_str(","),
            Self::ColonColon => f.write_str("::"),
            Self::Slash => f.write_str("/"),
            Self::DoubleSlash => f.write_str("//"),
            Self::Pipe => f.write_str("|"),
            Self::Plus => f.write_str("+"),
            Self::Minus => f.write_str("-"),
            Self::Equal => f.write_str("="),
            Self::NotEqual => f.write_str("!="),
            Self::Less => f.write_str("<"),
            Self::LessEqual => f.write_str("<="),
            Self::Greater => f.write_str(">"),
            Self::GreaterEqual => f.write_str(">="),
            Self::Operator(op) => f.write_str(op),
            Self::Number(n) => write!(f, "{n}"),
            Self::Literal(s) => write!(f, "\"{s}\""),
            Self::Variable(s) => write!(f, "${s}"),
            Self::Name(s) | Self::Function(s) | Self::NodeType(s) | Self::Axis(s) => {
                f.write_str(s)
            }
        }
    }
}

/// A token and the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Splits the whole expression into classified tokens.
    ///
    /// # Errors
    ///
    /// Returns [`XPathError::Syntax`] for unterminated literals and
    /// characters that cannot start a token.
    pub fn tokenize(mut self) -> Result<Vec<Spanned>, XPathError> {
        let mut tokens: Vec<Spanned> = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(c) = self.peek() else {
                break;
            };
            let offset = self.pos;
            let after_operand = tokens.last().is_some_and(|t| ends_operand(&t.token));
            let mut token = self.next_token(c, after_operand)?;
            if after_operand {
                if let Token::Name(name) = &token {
                    if let Some(op) = OPERATOR_NAMES.iter().find(|op| **op == name.as_str()) {
                        token = Token::Operator(*op);
                    }
                }
            }
            tokens.push(Spanned { token, offset });
        }
        classify_names(&mut tokens);
        Ok(tokens)
    }

    fn next_token(&mut self, c: char, after_operand: bool) -> Result<Token, XPathError> {
        let start = self.pos;
        let single = |lexer: &mut Self, t: Token| -> Result<Token, XPathError> {
            lexer.bump();
            Ok(t)
        };
        match c {
            '(' => single(self, Token::LeftParen),
            ')' => single(self, Token::RightParen),
            '[' => single(self, Token::LeftBracket),
            ']' => single(self, Token::RightBracket),
            '@' => single(self, Token::At),
            ',' => single(self, Token::Comma),
            '|' => single(self, Token::Pipe),
            '+' => single(self, Token::Plus),
            '-' => single(self, Token::Minus),
            '=' => single(self, Token::Equal),
            '*' if after_operand => single(self, Token::Operator("*")),
            '*' => single(self, Token::Name("*".to_string())),
            '/' => {
                self.bump();
                Ok(if self.eat('/') {
                    Token::DoubleSlash
                } else {
                    Token::Slash
                })
            }
            '.' => {
                self.bump();
                if self.eat('.') {
                    Ok(Token::DotDot)
                } else if self.peek().is_some_and(|d| d.is_ascii_digit()) {
                    self.number(start)
                } else {
                    Ok(Token::Dot)
                }
            }
            ':' => {
                self.bump();
                if self.eat(':') {
                    Ok(Token::ColonColon)
                } else {
                    Err(XPathError::syntax(start, "expected '::'"))
                }
            }
            '!' => {
                self.bump();
                if self.eat('=') {
                    Ok(Token::NotEqual)
                } else {
                    Err(XPathError::syntax(start, "expected '=' after '!'"))
                }
            }
            '<' => {
                self.bump();
                Ok(if self.eat('=') {
                    Token::LessEqual
                } else {
                    Token::Less
                })
            }
            '>' => {
                self.bump();
                Ok(if self.eat('=') {
                    Token::GreaterEqual
                } else {
                    Token::Greater
                })
            }
            '"' | '\'' => {
                self.bump();
                let body = self.pos;
                let end = self.input[body..]
                    .find(c)
                    .ok_or_else(|| XPathError::syntax(start, "unterminated string literal"))?;
                self.pos = body + end + c.len_utf8();
                Ok(Token::Literal(self.input[body..body + end].to_string()))
            }
            '$' => {
                self.bump();
                match self.qname() {
                    Some(name) => Ok(Token::Variable(name)),
                    None => Err(XPathError::syntax(start, "expected a name after '$'")),
                }
            }
            '0'..='9' => self.number(start),
            _ => match self.qname() {
                Some(name) => Ok(Token::Name(name)),
                None => Err(XPathError::syntax(start, format!("unexpected character '{c}'"))),
            },
        }
    }

    fn number(&mut self, start: usize) -> Result<Token, XPathError> {
        while self.peek().is_some_and(|d| d.is_ascii_digit() || d == '.') {
            self.bump();
        }
        let text = &self.input[start..self.pos];
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| XPathError::syntax(start, format!("invalid number '{text}'")))
    }

    /// Reads `NCName`, `NCName:NCName` or `NCName:*`.
    fn qname(&mut self) -> Option<String> {
        let start = self.pos;
        self.ncname()?;
        let rest = &self.input[self.pos..];
        if rest.starts_with(':') && !rest.starts_with("::") {
            let save = self.pos;
            self.bump();
            if self.eat('*') || self.ncname().is_some() {
                return Some(self.input[start..self.pos].to_string());
            }
            self.pos = save;
        }
        Some(self.input[start..self.pos].to_string())
    }

    fn ncname(&mut self) -> Option<()> {
        let first = self.peek().filter(|&c| c != ':' && is_name_start_char(c))?;
        self.pos += first.len_utf8();
        while let Some(c) = self.peek().filter(|&c| c != ':' && is_name_char(c)) {
            self.pos += c.len_utf8();
        }
        Some(())
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| matches!(c, ' ' | '\t' | '\r' | '\n')) {
            self.bump();
        }
    }
}

/// True if a following `*` or keyword must be read as an operator.
fn ends_operand(token: &Token) -> bool {
    matches!(
        token,
        Token::RightParen
            | Token::RightBracket
            | Token::Dot
            | Token::DotDot
            | Token::Number(_)
            | Token::Literal(_)
            | Token::Name(_)
            | Token::Variable(_)
    )
}

/// Names directly before `(` or `::` are functions, node types or axes.
fn classify_names(tokens: &mut [Spanned]) {
    for i in 0..tokens.len() {
        let Token::Name(name) = &tokens[i].token else {
            continue;
        };
        let replacement = match tokens.get(i + 1).map(|t| &t.token) {
            Some(Token::LeftParen) if NODE_TYPES.contains(&name.as_str()) => {
                Token::NodeType(name.clone())
            }
            Some(Token::LeftParen) => Token::Function(name.clone()),
            Some(Token::ColonColon) => Token::Axis(name.clone()),
            _ => continue,
        };
        tokens[i].token = replacement;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokens(input: &str) -> Vec<Token> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    fn name(s: &str) -> Token {
        Token::Name(s.to_string())
    }

    #[test]
    fn test_path_with_predicate() {
        assert_eq!(
            tokens("/cpacs/wing[@uID='w1']"),
            vec![
                Token::Slash,
                name("cpacs"),
                Token::Slash,
                name("wing"),
                Token::LeftBracket,
                Token::At,
                name("uID"),
                Token::Equal,
                Token::Literal("w1".into()),
                Token::RightBracket,
            ]
        );
    }

    #[test]
    fn test_star_is_name_or_operator() {
        assert_eq!(
            tokens("* * 2"),
            vec![name("*"), Token::Operator("*"), Token::Number(2.0)]
        );
        assert_eq!(tokens("c:*"), vec![name("c:*")]);
    }

    #[test]
    fn test_keywords_after_operand() {
        assert_eq!(
            tokens("a and b div 2"),
            vec![
                name("a"),
                Token::Operator("and"),
                name("b"),
                Token::Operator("div"),
                Token::Number(2.0)
            ]
        );
        assert_eq!(tokens("and"), vec![name("and")]);
        assert_eq!(
            tokens("a or *"),
            vec![name("a"), Token::Operator("or"), name("*")]
        );
    }

    #[test]
    fn test_function_node_type_and_axis() {
        assert_eq!(
            tokens("count(child::text())"),
            vec![
                Token::Function("count".into()),
                Token::LeftParen,
                Token::Axis("child".into()),
                Token::ColonColon,
                Token::NodeType("text".into()),
                Token::LeftParen,
                Token::RightParen,
                Token::RightParen,
            ]
        );
    }

    #[test]
    fn test_numbers_and_dots() {
        assert_eq!(
            tokens(".5 .. . 3.25"),
            vec![
                Token::Number(0.5),
                Token::DotDot,
                Token::Dot,
                Token::Number(3.25)
            ]
        );
    }

    #[test]
    fn test_offsets_are_recorded() {
        let spans = Lexer::new("a  |  b").tokenize().unwrap();
        let offsets: Vec<usize> = spans.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0, 3, 6]);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            Lexer::new("'open").tokenize(),
            Err(XPathError::Syntax { position: 0, .. })
        ));
        assert!(matches!(
            Lexer::new("a ! b").tokenize(),
            Err(XPathError::Syntax { position: 2, .. })
        ));
        assert!(Lexer::new("#").tokenize().is_err());
        assert!(Lexer::new("$").tokenize().is_err());
    }
}

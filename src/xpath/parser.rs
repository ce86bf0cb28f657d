//! Recursive descent parser for `XPath` 1.0.
//!
//! Precedence, loosest first: `or`, `and`, equality, relational,
//! additive, multiplicative, unary minus, union, then path and filter
//! expressions.

use super::ast::{Axis, BinaryOp, Expr, NodeTest, Step};
use super::lexer::{Lexer, Spanned, Token};
use super::types::XPathError;

/// Parses an expression into its syntax tree.
///
/// # Errors
///
/// Returns [`XPathError::Syntax`] with the byte offset of the offending
/// token.
///
/// ```
/// use tixi::xpath::parse;
///
/// assert!(parse("//wing[@uID='w1']/sections/section[2]").is_ok());
/// assert!(parse("//wing[").is_err());
/// ```
pub fn parse(input: &str) -> Result<Expr, XPathError> {
    let tokens = Lexer::new(input).tokenize()?;
    if tokens.is_empty() {
        return Err(XPathError::syntax(0, "empty expression"));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
    };
    let expr = parser.or_expr()?;
    if let Some(t) = parser.tokens.get(parser.pos) {
        return Err(XPathError::syntax(
            t.offset,
            format!("unexpected '{}' after expression", t.token),
        ));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    /// Offset reported for errors at the end of input.
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), XPathError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{token}'")))
        }
    }

    fn error(&self, message: &str) -> XPathError {
        match self.tokens.get(self.pos) {
            Some(t) => XPathError::syntax(t.offset, format!("{message}, found '{}'", t.token)),
            None => XPathError::syntax(self.end, format!("{message}, found end of expression")),
        }
    }

    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn or_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.and_expr()?;
        while self.eat(&Token::Operator("or")) {
            let right = self.and_expr()?;
            left = Self::binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.equality_expr()?;
        while self.eat(&Token::Operator("and")) {
            let right = self.equality_expr()?;
            left = Self::binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn equality_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.relational_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Equal) => BinaryOp::Eq,
                Some(Token::NotEqual) => BinaryOp::Neq,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.relational_expr()?;
            left = Self::binary(op, left, right);
        }
    }

    fn relational_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.additive_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Less) => BinaryOp::Lt,
                Some(Token::LessEqual) => BinaryOp::Lte,
                Some(Token::Greater) => BinaryOp::Gt,
                Some(Token::GreaterEqual) => BinaryOp::Gte,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.additive_expr()?;
            left = Self::binary(op, left, right);
        }
    }

    fn additive_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.multiplicative_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.multiplicative_expr()?;
            left = Self::binary(op, left, right);
        }
    }

    fn multiplicative_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.unary_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Operator("*")) => BinaryOp::Mul,
                Some(Token::Operator("div")) => BinaryOp::Div,
                Some(Token::Operator("mod")) => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary_expr()?;
            left = Self::binary(op, left, right);
        }
    }

    fn unary_expr(&mut self) -> Result<Expr, XPathError> {
        if self.eat(&Token::Minus) {
            Ok(Expr::Negate(Box::new(self.unary_expr()?)))
        } else {
            self.union_expr()
        }
    }

    fn union_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.path_expr()?;
        while self.eat(&Token::Pipe) {
            let right = self.path_expr()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn path_expr(&mut self) -> Result<Expr, XPathError> {
        match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                let mut steps = Vec::new();
                if self.at_step_start() {
                    self.relative_path(&mut steps)?;
                }
                Ok(Expr::RootPath(steps))
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                let mut steps = vec![Step::descendant_or_self()];
                self.relative_path(&mut steps)?;
                Ok(Expr::RootPath(steps))
            }
            _ if self.at_step_start() => {
                let mut steps = Vec::new();
                self.relative_path(&mut steps)?;
                Ok(Expr::Path(steps))
            }
            Some(
                Token::Variable(_)
                | Token::Literal(_)
                | Token::Number(_)
                | Token::LeftParen
                | Token::Function(_),
            ) => self.filter_expr(),
            _ => Err(self.error("expected an expression")),
        }
    }

    fn filter_expr(&mut self) -> Result<Expr, XPathError> {
        let primary = self.primary_expr()?;
        let predicates = self.predicates()?;
        let base = if predicates.is_empty() {
            primary
        } else {
            Expr::Filter {
                base: Box::new(primary),
                predicates,
            }
        };
        let mut steps = Vec::new();
        if self.eat(&Token::DoubleSlash) {
            steps.push(Step::descendant_or_self());
        } else if !self.eat(&Token::Slash) {
            return Ok(base);
        }
        self.relative_path(&mut steps)?;
        Ok(Expr::PathFrom {
            base: Box::new(base),
            steps,
        })
    }

    fn primary_expr(&mut self) -> Result<Expr, XPathError> {
        let token = self.peek().cloned();
        match token {
            Some(Token::Variable(name)) => {
                self.pos += 1;
                Ok(Expr::Variable(name))
            }
            Some(Token::Literal(s)) => {
                self.pos += 1;
                Ok(Expr::String(s))
            }
            Some(Token::Number(n)) => {
                self.pos += 1;
                Ok(Expr::Number(n))
            }
            Some(Token::LeftParen) => {
                self.pos += 1;
                let inner = self.or_expr()?;
                self.expect(&Token::RightParen)?;
                Ok(inner)
            }
            Some(Token::Function(name)) => {
                self.pos += 1;
                self.expect(&Token::LeftParen)?;
                let mut args = Vec::new();
                if !self.eat(&Token::RightParen) {
                    loop {
                        args.push(self.or_expr()?);
                        if self.eat(&Token::RightParen) {
                            break;
                        }
                        self.expect(&Token::Comma)?;
                    }
                }
                Ok(Expr::FunctionCall { name, args })
            }
            _ => Err(self.error("expected a primary expression")),
        }
    }

    fn at_step_start(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::Dot
                    | Token::DotDot
                    | Token::At
                    | Token::Name(_)
                    | Token::NodeType(_)
                    | Token::Axis(_)
            )
        )
    }

    fn relative_path(&mut self, steps: &mut Vec<Step>) -> Result<(), XPathError> {
        steps.push(self.step()?);
        loop {
            if self.eat(&Token::DoubleSlash) {
                steps.push(Step::descendant_or_self());
            } else if !self.eat(&Token::Slash) {
                return Ok(());
            }
            steps.push(self.step()?);
        }
    }

    fn step(&mut self) -> Result<Step, XPathError> {
        if self.eat(&Token::Dot) {
            return Ok(Step::new(Axis::SelfAxis, NodeTest::Node));
        }
        if self.eat(&Token::DotDot) {
            return Ok(Step::new(Axis::Parent, NodeTest::Node));
        }
        let axis = if self.eat(&Token::At) {
            Axis::Attribute
        } else if let Some(Token::Axis(name)) = self.peek() {
            let axis = Axis::from_name(name)
                .ok_or_else(|| self.error(&format!("unknown axis '{name}'")))?;
            self.pos += 2;
            axis
        } else {
            Axis::Child
        };
        let test = self.node_test()?;
        let predicates = self.predicates()?;
        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn node_test(&mut self) -> Result<NodeTest, XPathError> {
        let token = self.peek().cloned();
        match token {
            Some(Token::Name(name)) => {
                self.pos += 1;
                Ok(if name == "*" {
                    NodeTest::Any
                } else if let Some(prefix) = name.strip_suffix(":*") {
                    NodeTest::AnyInNamespace(prefix.to_string())
                } else {
                    NodeTest::from_qname(&name)
                })
            }
            Some(Token::NodeType(kind)) => {
                self.pos += 1;
                self.expect(&Token::LeftParen)?;
                let test = match kind.as_str() {
                    "node" => NodeTest::Node,
                    "text" => NodeTest::Text,
                    "comment" => NodeTest::Comment,
                    _ => {
                        if let Some(Token::Literal(target)) = self.peek().cloned() {
                            self.pos += 1;
                            NodeTest::ProcessingInstruction(Some(target))
                        } else {
                            NodeTest::ProcessingInstruction(None)
                        }
                    }
                };
                self.expect(&Token::RightParen)?;
                Ok(test)
            }
            _ => Err(self.error("expected a node test")),
        }
    }

    fn predicates(&mut self) -> Result<Vec<Expr>, XPathError> {
        let mut predicates = Vec::new();
        while self.eat(&Token::LeftBracket) {
            predicates.push(self.or_expr()?);
            self.expect(&Token::RightBracket)?;
        }
        Ok(predicates)
    }

    #[cfg(test)]
    fn remaining(&self) -> usize {
        self.tokens.len() - self.pos
    }
}

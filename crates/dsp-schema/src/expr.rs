//! The small expression language embedded in `if`, `props`, `default`, and
//! `array_size` clauses (spec §4.2, §4.4, §9).
//!
//! The source schema treats these as opaque text fragments rewritten at
//! code-generation time. Rather than embed a host-language interpreter, this
//! crate parses them once, at registry-build time, into an [`Expr`] tree and
//! evaluates that tree directly against a field [`Scope`] — no string
//! rewriting, no eval.

use std::fmt;

/// A parsed clause expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Int(i64),
    Str(String),
    /// A snake_cased reference to another field in the enclosing record, or
    /// to the `i` array-index variable.
    Ident(String),
    Index(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Eq(Box<Expr>, Box<Expr>),
    Ne(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

/// A runtime value produced by evaluating an [`Expr`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Bool(bool),
    Float(f64),
    Str(String),
    /// An already-decoded array-typed field, so that `props (id[i])` can
    /// index into a sibling array by the enclosing loop's `i`.
    Array(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Array(items) => write!(f, "{items:?}"),
        }
    }
}

/// A failure either parsing or evaluating a clause expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprError(pub String);

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read-only binding environment an [`Expr`] is evaluated against: the
/// enclosing record's already-decoded fields, plus `i` when evaluating
/// inside an array element.
pub trait Scope {
    fn field(&self, snake_name: &str) -> Option<Value>;
    fn index(&self) -> Option<i64>;
}

/// Parses clause text into an [`Expr`] tree. Identifiers are left exactly as
/// written; callers normalize casing with [`crate::ident::to_snake_case`]
/// before constructing a [`Scope`], not here, so that `parse` stays a pure
/// syntactic step.
pub fn parse(text: &str) -> Result<Expr, ExprError> {
    let tokens = lex(text)?;
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(ExprError(format!(
            "unexpected trailing token at position {} in {text:?}",
            parser.pos
        )));
    }
    Ok(expr)
}

/// Evaluates `expr` against `scope`.
pub fn eval(expr: &Expr, scope: &dyn Scope) -> Result<Value, ExprError> {
    match expr {
        Expr::Null => Ok(Value::Null),
        Expr::Int(n) => Ok(Value::Int(*n)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Ident(name) => {
            if name == "i" {
                if let Some(i) = scope.index() {
                    return Ok(Value::Int(i));
                }
            }
            scope
                .field(name)
                .ok_or_else(|| ExprError(format!("unbound identifier {name:?}")))
        }
        Expr::Index(base, idx) => {
            let base_val = eval(base, scope)?;
            let idx_val = eval(idx, scope)?;
            match (base_val, idx_val) {
                (Value::Array(items), Value::Int(i)) => items
                    .get(i as usize)
                    .cloned()
                    .ok_or_else(|| ExprError(format!("index {i} out of range"))),
                (Value::Str(s), Value::Int(i)) => {
                    let ch = s
                        .chars()
                        .nth(i as usize)
                        .ok_or_else(|| ExprError(format!("index {i} out of range for {s:?}")))?;
                    Ok(Value::Str(ch.to_string()))
                }
                (other, _) => Err(ExprError(format!("cannot index into {other}"))),
            }
        }
        Expr::Not(inner) => {
            let v = eval(inner, scope)?;
            Ok(Value::Bool(!truthy(&v)))
        }
        Expr::Eq(a, b) => Ok(Value::Bool(values_equal(&eval(a, scope)?, &eval(b, scope)?))),
        Expr::Ne(a, b) => Ok(Value::Bool(!values_equal(&eval(a, scope)?, &eval(b, scope)?))),
        Expr::And(a, b) => {
            let lhs = eval(a, scope)?;
            if !truthy(&lhs) {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(truthy(&eval(b, scope)?)))
        }
        Expr::Or(a, b) => {
            let lhs = eval(a, scope)?;
            if truthy(&lhs) {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(truthy(&eval(b, scope)?)))
        }
    }
}

/// Host-style truthiness for a clause condition: `false`/`0`/`0.0`/empty
/// string or array/`null` are falsy, everything else is truthy. Used both by
/// `&&`/`!`/`||` evaluation here and by [`crate::codec`] to decide whether an
/// `if_clause` guard is satisfied, since the schema's `if` guards are not
/// restricted to literally boolean-valued expressions.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Int(n) => *n != 0,
        Value::Float(x) => *x != 0.0,
        Value::Str(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => (x - y).abs() < 1e-6,
        (Value::Str(x), Value::Str(y)) => x == y,
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Str(String),
    Null,
    Not,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
    LParen,
    RParen,
    LBracket,
    RBracket,
}

fn lex(text: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::NotEq);
                    i += 2;
                } else {
                    tokens.push(Token::Not);
                    i += 1;
                }
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::EqEq);
                    i += 2;
                } else {
                    return Err(ExprError(format!("unexpected '=' in {text:?}")));
                }
            }
            '&' if chars.get(i + 1) == Some(&'&') => {
                tokens.push(Token::AndAnd);
                i += 2;
            }
            '|' if chars.get(i + 1) == Some(&'|') => {
                tokens.push(Token::OrOr);
                i += 2;
            }
            '"' => {
                let mut j = i + 1;
                let mut s = String::new();
                loop {
                    match chars.get(j) {
                        Some('"') => break,
                        Some(ch) => {
                            s.push(*ch);
                            j += 1;
                        }
                        None => return Err(ExprError(format!("unterminated string in {text:?}"))),
                    }
                }
                tokens.push(Token::Str(s));
                i = j + 1;
            }
            _ if c.is_ascii_digit() || (c == '-' && chars.get(i + 1).is_some_and(char::is_ascii_digit)) => {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<i64>()
                    .map_err(|_| ExprError(format!("invalid integer literal {text:?}")))?;
                tokens.push(Token::Int(n));
            }
            _ if c.is_alphabetic() || c == '_' => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(if word == "null" {
                    Token::Null
                } else {
                    Token::Ident(word)
                });
            }
            other => return Err(ExprError(format!("unexpected character {other:?} in {text:?}"))),
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(&Token::OrOr) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_equality()?;
        while self.peek() == Some(&Token::AndAnd) {
            self.advance();
            let rhs = self.parse_equality()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, ExprError> {
        let lhs = self.parse_unary()?;
        match self.peek() {
            Some(Token::EqEq) => {
                self.advance();
                let rhs = self.parse_unary()?;
                Ok(Expr::Eq(Box::new(lhs), Box::new(rhs)))
            }
            Some(Token::NotEq) => {
                self.advance();
                let rhs = self.parse_unary()?;
                Ok(Expr::Ne(Box::new(lhs), Box::new(rhs)))
            }
            _ => Ok(lhs),
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        if self.peek() == Some(&Token::Not) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_primary()?;
        while self.peek() == Some(&Token::LBracket) {
            self.advance();
            let idx = self.parse_or()?;
            match self.advance() {
                Some(Token::RBracket) => {}
                _ => return Err(ExprError("expected closing ']'".to_string())),
            }
            expr = Expr::Index(Box::new(expr), Box::new(idx));
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        match self.advance() {
            Some(Token::Null) => Ok(Expr::Null),
            Some(Token::Int(n)) => Ok(Expr::Int(*n)),
            Some(Token::Str(s)) => Ok(Expr::Str(s.clone())),
            Some(Token::Ident(name)) => Ok(Expr::Ident(name.clone())),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(ExprError("expected closing ')'".to_string())),
                }
            }
            other => Err(ExprError(format!("unexpected token {other:?}"))),
        }
    }
}

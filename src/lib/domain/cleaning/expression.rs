//! Row-wise expressions for computed columns.
//!
//! Columns are referenced by bare identifier (`price`) or backtick-quoted name
//! (`` `unit price` ``). Supported operators, loosest first: `or`/`|`,
//! `and`/`&`, `not`/`~`, comparisons, `+ -`, `* / // %`, unary `-`, `**`.

use crate::domain::models::{Table, TableError, TableResult, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(Value),
    Ident(String),
    Op(Op),
    Not,
    LParen,
    RParen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl Op {
    fn symbol(self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "/",
            Op::FloorDiv => "//",
            Op::Mod => "%",
            Op::Pow => "**",
            Op::Eq => "==",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::And => "and",
            Op::Or => "or",
        }
    }

    fn is_comparison(self) -> bool {
        matches!(self, Op::Eq | Op::Ne | Op::Lt | Op::Le | Op::Gt | Op::Ge)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Column(String),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    Binary(Op, Box<Expr>, Box<Expr>),
}

fn expr_err(msg: impl Into<String>) -> TableError {
    TableError::Expression(msg.into())
}

fn tokenize(src: &str) -> TableResult<Vec<Token>> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        match ch {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Op(Op::Add));
                i += 1;
            }
            '-' => {
                tokens.push(Token::Op(Op::Sub));
                i += 1;
            }
            '%' => {
                tokens.push(Token::Op(Op::Mod));
                i += 1;
            }
            '&' => {
                tokens.push(Token::Op(Op::And));
                i += 1;
            }
            '|' => {
                tokens.push(Token::Op(Op::Or));
                i += 1;
            }
            '~' => {
                tokens.push(Token::Not);
                i += 1;
            }
            '*' | '/' | '=' | '!' | '<' | '>' => {
                let next = chars.get(i + 1).copied();
                let (op, width) = match (ch, next) {
                    ('*', Some('*')) => (Op::Pow, 2),
                    ('*', _) => (Op::Mul, 1),
                    ('/', Some('/')) => (Op::FloorDiv, 2),
                    ('/', _) => (Op::Div, 1),
                    ('=', Some('=')) => (Op::Eq, 2),
                    ('!', Some('=')) => (Op::Ne, 2),
                    ('<', Some('=')) => (Op::Le, 2),
                    ('<', _) => (Op::Lt, 1),
                    ('>', Some('=')) => (Op::Ge, 2),
                    ('>', _) => (Op::Gt, 1),
                    _ => return Err(expr_err(format!("unexpected '{}' at {}", ch, i))),
                };
                tokens.push(Token::Op(op));
                i += width;
            }
            '\'' | '"' => {
                let quote = ch;
                let mut s = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(expr_err("unterminated string literal")),
                        Some('\\') => {
                            if let Some(&escaped) = chars.get(i + 1) {
                                s.push(escaped);
                            }
                            i += 2;
                        }
                        Some(&c) if c == quote => {
                            i += 1;
                            break;
                        }
                        Some(&c) => {
                            s.push(c);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Literal(Value::Text(s)));
            }
            '`' => {
                let start = i + 1;
                let end = chars[start..]
                    .iter()
                    .position(|c| *c == '`')
                    .map(|p| start + p)
                    .ok_or_else(|| expr_err("unterminated backtick column name"))?;
                tokens.push(Token::Ident(chars[start..end].iter().collect()));
                i = end + 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                let mut is_float = false;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                if i < chars.len() && chars[i] == '.' {
                    is_float = true;
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        is_float = true;
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value = if is_float {
                    text.parse::<f64>().map(Value::Float).ok()
                } else {
                    text.parse::<i64>().map(Value::Int).ok()
                };
                let value =
                    value.ok_or_else(|| expr_err(format!("invalid number '{}'", text)))?;
                tokens.push(Token::Literal(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "and" => Token::Op(Op::And),
                    "or" => Token::Op(Op::Or),
                    "not" => Token::Not,
                    "True" => Token::Literal(Value::Bool(true)),
                    "False" => Token::Literal(Value::Bool(false)),
                    _ => Token::Ident(word),
                });
            }
            other => return Err(expr_err(format!("unexpected '{}' at {}", other, i))),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_op(&self) -> Option<Op> {
        match self.peek() {
            Some(Token::Op(op)) => Some(*op),
            _ => None,
        }
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn binary_level<F>(&mut self, ops: &[Op], mut next: F) -> TableResult<Expr>
    where
        F: FnMut(&mut Self) -> TableResult<Expr>,
    {
        let mut lhs = next(self)?;
        while let Some(op) = self.peek_op().filter(|op| ops.contains(op)) {
            self.pos += 1;
            let rhs = next(self)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn or(&mut self) -> TableResult<Expr> {
        self.binary_level(&[Op::Or], Self::and)
    }

    fn and(&mut self) -> TableResult<Expr> {
        self.binary_level(&[Op::And], Self::not)
    }

    fn not(&mut self) -> TableResult<Expr> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            return Ok(Expr::Not(Box::new(self.not()?)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> TableResult<Expr> {
        let lhs = self.additive()?;
        match self.peek_op() {
            Some(op) if op.is_comparison() => {
                self.pos += 1;
                let rhs = self.additive()?;
                if self.peek_op().is_some_and(Op::is_comparison) {
                    return Err(expr_err("chained comparisons are not supported"));
                }
                Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)))
            }
            _ => Ok(lhs),
        }
    }

    fn additive(&mut self) -> TableResult<Expr> {
        self.binary_level(&[Op::Add, Op::Sub], Self::multiplicative)
    }

    fn multiplicative(&mut self) -> TableResult<Expr> {
        self.binary_level(&[Op::Mul, Op::Div, Op::FloorDiv, Op::Mod], Self::unary)
    }

    fn unary(&mut self) -> TableResult<Expr> {
        match self.peek_op() {
            Some(Op::Sub) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(Op::Add) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> TableResult<Expr> {
        let base = self.atom()?;
        if self.peek_op() == Some(Op::Pow) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(Expr::Binary(Op::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn atom(&mut self) -> TableResult<Expr> {
        match self.advance() {
            Some(Token::Literal(v)) => Ok(Expr::Literal(v)),
            Some(Token::Ident(name)) => Ok(Expr::Column(name)),
            Some(Token::LParen) => {
                let inner = self.or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(expr_err("expected ')'")),
                }
            }
            Some(other) => Err(expr_err(format!("unexpected token {:?}", other))),
            None => Err(expr_err("unexpected end of expression")),
        }
    }
}

/// A parsed expression, evaluated once per row of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Expr,
}

impl Expression {
    pub fn parse(source: &str) -> TableResult<Self> {
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err(expr_err("empty expression"));
        }
        let mut parser = Parser { tokens, pos: 0 };
        let root = parser.or()?;
        if let Some(token) = parser.peek() {
            return Err(expr_err(format!(
                "unexpected token {:?} in '{}'",
                token, source
            )));
        }
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn columns(&self) -> Vec<&str> {
        fn walk<'a>(expr: &'a Expr, out: &mut Vec<&'a str>) {
            match expr {
                Expr::Literal(_) => {}
                Expr::Column(name) => {
                    if !out.contains(&name.as_str()) {
                        out.push(name);
                    }
                }
                Expr::Neg(inner) | Expr::Not(inner) => walk(inner, out),
                Expr::Binary(_, lhs, rhs) => {
                    walk(lhs, out);
                    walk(rhs, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut out);
        out
    }

    pub fn evaluate(&self, table: &Table) -> TableResult<Vec<Value>> {
        let mut lookup: HashMap<&str, &[Value]> = HashMap::new();
        for name in self.columns() {
            lookup.insert(name, table.column(name)?.values());
        }
        (0..table.height())
            .map(|row| eval(&self.root, &lookup, row))
            .collect()
    }
}

fn eval(expr: &Expr, lookup: &HashMap<&str, &[Value]>, row: usize) -> TableResult<Value> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Column(name) => lookup
            .get(name.as_str())
            .map(|values| values[row].clone())
            .ok_or_else(|| TableError::ColumnNotFound(name.clone())),
        Expr::Neg(inner) => match eval(inner, lookup, row)? {
            v if v.is_null() => Ok(Value::Null),
            Value::Int(i) => i
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| expr_err("integer overflow")),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(expr_err(format!("bad operand type for unary -: {}", other.type_name()))),
        },
        Expr::Not(inner) => match eval(inner, lookup, row)? {
            v if v.is_null() => Ok(Value::Null),
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => Err(expr_err(format!("bad operand type for not: {}", other.type_name()))),
        },
        Expr::Binary(op, lhs, rhs) => {
            let a = eval(lhs, lookup, row)?;
            let b = eval(rhs, lookup, row)?;
            match op {
                Op::And | Op::Or => logical(*op, &a, &b),
                op if op.is_comparison() => Ok(Value::Bool(compare(*op, &a, &b)?)),
                op => arithmetic(*op, &a, &b),
            }
        }
    }
}

fn as_bool(v: &Value, op: Op) -> TableResult<bool> {
    match v {
        v if v.is_null() => Ok(false),
        Value::Bool(b) => Ok(*b),
        other => Err(expr_err(format!(
            "'{}' requires booleans, got {}",
            op.symbol(),
            other.type_name()
        ))),
    }
}

fn logical(op: Op, a: &Value, b: &Value) -> TableResult<Value> {
    let (a, b) = (as_bool(a, op)?, as_bool(b, op)?);
    Ok(Value::Bool(if op == Op::And { a && b } else { a || b }))
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn compare(op: Op, a: &Value, b: &Value) -> TableResult<bool> {
    if a.is_null() || b.is_null() {
        return Ok(op == Op::Ne);
    }
    let ordering = match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Text(x), Value::Text(y)) => Some(x.cmp(y)),
        (Value::DateTime(x), Value::DateTime(y)) => Some(x.cmp(y)),
        _ => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    };
    match (ordering, op) {
        (Some(ord), Op::Eq) => Ok(ord == Ordering::Equal),
        (Some(ord), Op::Ne) => Ok(ord != Ordering::Equal),
        (Some(ord), Op::Lt) => Ok(ord == Ordering::Less),
        (Some(ord), Op::Le) => Ok(ord != Ordering::Greater),
        (Some(ord), Op::Gt) => Ok(ord == Ordering::Greater),
        (Some(ord), _) => Ok(ord != Ordering::Less),
        (None, Op::Eq) => Ok(false),
        (None, Op::Ne) => Ok(true),
        (None, op) => Err(expr_err(format!(
            "'{}' not supported between {} and {}",
            op.symbol(),
            a.type_name(),
            b.type_name()
        ))),
    }
}

/// `None` when the quotient does not fit (`i64::MIN // -1`).
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
        Some(q - 1)
    } else {
        Some(q)
    }
}

fn floor_mod(a: i64, b: i64) -> i64 {
    // i64::MIN % -1 is 0
    let r = a.wrapping_rem(b);
    if r != 0 && ((r < 0) != (b < 0)) {
        r + b
    } else {
        r
    }
}

fn arithmetic(op: Op, a: &Value, b: &Value) -> TableResult<Value> {
    if a.is_null() || b.is_null() {
        return Ok(Value::Null);
    }
    let overflow = || expr_err(format!("integer overflow in '{}'", op.symbol()));
    match (op, a, b) {
        (Op::Add, Value::Text(x), Value::Text(y)) => Ok(Value::Text(format!("{}{}", x, y))),
        (_, Value::Int(x), Value::Int(y)) => {
            let (x, y) = (*x, *y);
            match op {
                Op::Add => x.checked_add(y).map(Value::Int).ok_or_else(overflow),
                Op::Sub => x.checked_sub(y).map(Value::Int).ok_or_else(overflow),
                Op::Mul => x.checked_mul(y).map(Value::Int).ok_or_else(overflow),
                Op::Div if y == 0 => Ok(Value::Null),
                Op::Div => Ok(Value::Float(x as f64 / y as f64)),
                Op::FloorDiv | Op::Mod if y == 0 => Ok(Value::Null),
                Op::FloorDiv => floor_div(x, y).map(Value::Int).ok_or_else(overflow),
                Op::Mod => Ok(Value::Int(floor_mod(x, y))),
                Op::Pow if y >= 0 => u32::try_from(y)
                    .ok()
                    .and_then(|e| x.checked_pow(e))
                    .map(Value::Int)
                    .ok_or_else(overflow),
                Op::Pow => Ok(Value::Float((x as f64).powf(y as f64))),
                _ => unreachable!("non-arithmetic operator routed to arithmetic"),
            }
        }
        _ => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => Ok(match op {
                Op::Add => Value::Float(x + y),
                Op::Sub => Value::Float(x - y),
                Op::Mul => Value::Float(x * y),
                Op::Div | Op::FloorDiv | Op::Mod if y == 0.0 => Value::Null,
                Op::Div => Value::Float(x / y),
                Op::FloorDiv => Value::Float((x / y).floor()),
                Op::Mod => Value::Float(x - y * (x / y).floor()),
                Op::Pow => Value::Float(x.powf(y)),
                _ => unreachable!("non-arithmetic operator routed to arithmetic"),
            }),
            _ => Err(expr_err(format!(
                "unsupported operand types for {}: {} and {}",
                op.symbol(),
                a.type_name(),
                b.type_name()
            ))),
        },
    }
}

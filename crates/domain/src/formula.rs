//! Formula evaluation for computed character stats
//!
//! Supports the small arithmetic language used by the rule catalog, e.g.
//! `"([level] + [attribute.strength] + [skill.fortitude]) * 6"`.
//!
//! - Literals are non-negative integers
//! - Variables are names wrapped in a single bracket pair: `[attribute.strength]`
//! - Binary `+`, `-`, `*`, `/` with the usual precedence
//! - Parentheses for grouping
//!
//! Parsing is hand-rolled (no regex or parser-combinator dependency in the domain
//! layer). A [`Formula`] is parsed once and can then be evaluated against any
//! [`Namespace`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error when parsing or evaluating a formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// The formula string is empty
    #[error("Empty formula")]
    Empty,
    /// Malformed input at the given byte offset
    #[error("Syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },
    /// A bracketed reference names a variable absent from the namespace.
    /// This is a catalog authoring defect and is never coerced to zero.
    #[error("Unknown variable: [{0}]")]
    UnknownVariable(String),
    /// Right-hand side of a division evaluated to zero
    #[error("Division by zero")]
    DivisionByZero,
}

impl FormulaError {
    pub fn unknown_variable(name: impl Into<String>) -> Self {
        Self::UnknownVariable(name.into())
    }

    fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }
}

/// Flat mapping of dotted variable names to numbers, rebuilt per computation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    values: HashMap<String, f64>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a variable.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Namespace {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        let mut namespace = Self::new();
        for (name, value) in iter {
            namespace.insert(name, value);
        }
        namespace
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn apply(self, lhs: f64, rhs: f64) -> Result<f64, FormulaError> {
        match self {
            BinaryOp::Add => Ok(lhs + rhs),
            BinaryOp::Sub => Ok(lhs - rhs),
            BinaryOp::Mul => Ok(lhs * rhs),
            BinaryOp::Div if rhs == 0.0 => Err(FormulaError::DivisionByZero),
            BinaryOp::Div => Ok(lhs / rhs),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Variable(String),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    fn evaluate(&self, namespace: &Namespace) -> Result<f64, FormulaError> {
        match self {
            Expr::Number(value) => Ok(*value),
            Expr::Variable(name) => namespace
                .get(name)
                .ok_or_else(|| FormulaError::unknown_variable(name.as_str())),
            Expr::Binary { op, lhs, rhs } => {
                let lhs = lhs.evaluate(namespace)?;
                let rhs = rhs.evaluate(namespace)?;
                op.apply(lhs, rhs)
            }
        }
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(name) => out.push(name),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Variable(String),
    Op(BinaryOp),
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '0'..='9' => {
                let mut value = f64::from(c as u8 - b'0');
                while let Some(&(_, next)) = chars.peek() {
                    let Some(digit) = next.to_digit(10) else {
                        break;
                    };
                    value = value * 10.0 + f64::from(digit);
                    chars.next();
                }
                Token::Number(value)
            }
            '[' => {
                let mut name = String::new();
                let mut closed = false;
                for (_, next) in chars.by_ref() {
                    match next {
                        ']' => {
                            closed = true;
                            break;
                        }
                        '[' => {
                            return Err(FormulaError::syntax(pos, "nested '[' in reference"));
                        }
                        other => name.push(other),
                    }
                }
                if !closed {
                    return Err(FormulaError::syntax(pos, "unterminated variable reference"));
                }
                let name = name.trim();
                if name.is_empty() {
                    return Err(FormulaError::syntax(pos, "empty variable reference"));
                }
                Token::Variable(name.to_string())
            }
            '+' => Token::Op(BinaryOp::Add),
            '-' => Token::Op(BinaryOp::Sub),
            '*' => Token::Op(BinaryOp::Mul),
            '/' => Token::Op(BinaryOp::Div),
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => {
                return Err(FormulaError::syntax(
                    pos,
                    format!("unexpected character '{}'", other),
                ))
            }
        };
        tokens.push((pos, token));
    }

    Ok(tokens)
}

/// Recursive-descent parser over the token stream.
///
/// ```text
/// expr   := term (('+' | '-') term)*
/// term   := factor (('*' | '/') factor)*
/// factor := NUMBER | VARIABLE | '(' expr ')'
/// ```
struct Parser {
    tokens: Vec<(usize, Token)>,
    cursor: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|(_, token)| token)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.cursor)
            .map(|(pos, _)| *pos)
            .unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).map(|(_, token)| token.clone());
        self.cursor += 1;
        token
    }

    fn expr(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        while let Some(Token::Op(op @ (BinaryOp::Add | BinaryOp::Sub))) = self.peek() {
            let op = *op;
            self.advance();
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.factor()?;
        while let Some(Token::Op(op @ (BinaryOp::Mul | BinaryOp::Div))) = self.peek() {
            let op = *op;
            self.advance();
            let rhs = self.factor()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn factor(&mut self) -> Result<Expr, FormulaError> {
        let position = self.position();
        match self.advance() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::Variable(name)) => Ok(Expr::Variable(name)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(FormulaError::syntax(position, "unbalanced '('")),
                }
            }
            Some(Token::RParen) => Err(FormulaError::syntax(position, "unexpected ')'")),
            Some(Token::Op(_)) => Err(FormulaError::syntax(position, "expected operand")),
            None => Err(FormulaError::syntax(position, "unexpected end of formula")),
        }
    }
}

/// A parsed formula, ready to evaluate against a [`Namespace`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parse a formula string like `"[base] + [attribute.strength]"`.
    pub fn parse(input: &str) -> Result<Self, FormulaError> {
        if input.trim().is_empty() {
            return Err(FormulaError::Empty);
        }

        let tokens = tokenize(input)?;
        let mut parser = Parser {
            tokens,
            cursor: 0,
            end: input.len(),
        };
        let expr = parser.expr()?;
        if parser.cursor < parser.tokens.len() {
            return Err(FormulaError::syntax(
                parser.position(),
                "unexpected trailing input",
            ));
        }

        Ok(Self {
            source: input.to_string(),
            expr,
        })
    }

    /// Evaluate against a namespace. Fractional results are returned as-is;
    /// rounding is the caller's concern.
    pub fn evaluate(&self, namespace: &Namespace) -> Result<f64, FormulaError> {
        self.expr.evaluate(namespace)
    }

    /// Variable names referenced by this formula, in source order.
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.expr.collect_variables(&mut names);
        names
    }

    /// Whether the formula refers to the given variable (e.g. `base`).
    pub fn references(&self, name: &str) -> bool {
        self.variables().contains(&name)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Formula {
    type Error = FormulaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Formula> for String {
    fn from(value: Formula) -> Self {
        value.source
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse and evaluate in one step.
pub fn evaluate(formula: &str, namespace: &Namespace) -> Result<f64, FormulaError> {
    Formula::parse(formula)?.evaluate(namespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(pairs: &[(&str, f64)]) -> Namespace {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_operator_precedence() {
        let result = evaluate("[a]+[b]*2", &ns(&[("a", 3.0), ("b", 4.0)])).unwrap();
        assert_eq!(result, 11.0);
    }

    #[test]
    fn test_parentheses_group() {
        let namespace = ns(&[
            ("level", 3.0),
            ("attribute.strength", 4.0),
            ("skill.fortitude", 2.0),
        ]);
        let result = evaluate(
            "([level] + [attribute.strength] + [skill.fortitude]) * 6",
            &namespace,
        )
        .unwrap();
        assert_eq!(result, 54.0);
    }

    #[test]
    fn test_left_associative_subtraction_and_division() {
        assert_eq!(evaluate("10 - 4 - 3", &Namespace::new()).unwrap(), 3.0);
        assert_eq!(evaluate("24 / 4 / 2", &Namespace::new()).unwrap(), 3.0);
    }

    #[test]
    fn test_fractional_division_is_not_rounded() {
        assert_eq!(evaluate("7 / 2", &Namespace::new()).unwrap(), 3.5);
    }

    #[test]
    fn test_multi_digit_literals_and_whitespace() {
        assert_eq!(evaluate("  120 +\t3 ", &Namespace::new()).unwrap(), 123.0);
    }

    #[test]
    fn test_unknown_variable_is_fatal() {
        let err = evaluate("[base] + 10", &Namespace::new()).unwrap_err();
        assert_eq!(err, FormulaError::UnknownVariable("base".to_string()));
    }

    #[test]
    fn test_division_by_zero() {
        let err = evaluate("[a] / 0", &ns(&[("a", 1.0)])).unwrap_err();
        assert_eq!(err, FormulaError::DivisionByZero);
    }

    #[test]
    fn test_empty_formula() {
        assert_eq!(Formula::parse("   ").unwrap_err(), FormulaError::Empty);
    }

    #[test]
    fn test_syntax_errors_report_position() {
        let err = Formula::parse("3 + ").unwrap_err();
        assert!(matches!(err, FormulaError::Syntax { position: 4, .. }));

        let err = Formula::parse("3 $ 4").unwrap_err();
        assert!(matches!(err, FormulaError::Syntax { position: 2, .. }));

        assert!(matches!(
            Formula::parse("([level] + 1").unwrap_err(),
            FormulaError::Syntax { .. }
        ));
        assert!(matches!(
            Formula::parse("[level").unwrap_err(),
            FormulaError::Syntax { position: 0, .. }
        ));
        assert!(matches!(
            Formula::parse("1 2").unwrap_err(),
            FormulaError::Syntax { .. }
        ));
        assert!(matches!(
            Formula::parse("-1").unwrap_err(),
            FormulaError::Syntax { .. }
        ));
    }

    #[test]
    fn test_variables_in_source_order() {
        let formula = Formula::parse("[base] + [attribute.strength] + [skill.fortitude]").unwrap();
        assert_eq!(
            formula.variables(),
            vec!["base", "attribute.strength", "skill.fortitude"]
        );
        assert!(formula.references("base"));
        assert!(!Formula::parse("[level] + 2").unwrap().references("base"));
    }

    #[test]
    fn test_parsed_formula_reused_across_namespaces() {
        let formula = Formula::parse("[level] * 2").unwrap();
        assert_eq!(formula.evaluate(&ns(&[("level", 1.0)])).unwrap(), 2.0);
        assert_eq!(formula.evaluate(&ns(&[("level", 5.0)])).unwrap(), 10.0);
    }

    #[test]
    fn test_serde_as_source_string() {
        let formula = Formula::parse("[base] + 2").unwrap();
        let json = serde_json::to_string(&formula).unwrap();
        assert_eq!(json, "\"[base] + 2\"");

        let back: Formula = serde_json::from_str(&json).unwrap();
        assert_eq!(back, formula);

        assert!(serde_json::from_str::<Formula>("\"[base] +\"").is_err());
    }
}

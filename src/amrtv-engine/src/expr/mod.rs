// Copyright 2026 The AMR-TV Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Arithmetic expressions used to compute link weights.
//!
//! The language is deliberately tiny: numeric literals, `+ - * /`, unary
//! signs and parentheses.  Weight expressions may additionally reference the
//! two endpoints of a candidate edge with `!column!` (the earlier-dated
//! sample) and `@column@` (the later-dated sample); those references are
//! substituted before parsing.

mod lexer;
mod parser;
#[cfg(test)]
mod tests;

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::common::{Error, ErrorCode, ErrorKind, Result};

pub use self::parser::parse;

/// A parse or evaluation failure, with the byte span it applies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExprError {
    pub start: usize,
    pub end: usize,
    pub code: ErrorCode,
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.start, self.end, self.code)
    }
}

impl ExprError {
    fn into_error(self, source: &str) -> Error {
        Error::new(
            ErrorKind::Expression,
            self.code,
            Some(format!("{self} in {source:?}")),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Positive,
    Negative,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Const(f64),
    Op1(UnaryOp, Box<Expr>),
    Op2(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn eval(&self) -> Result<f64> {
        match self {
            Expr::Const(n) => Ok(*n),
            Expr::Op1(op, operand) => {
                let v = operand.eval()?;
                Ok(match op {
                    UnaryOp::Positive => v,
                    UnaryOp::Negative => -v,
                })
            }
            Expr::Op2(op, l, r) => {
                let l = l.eval()?;
                let r = r.eval()?;
                match op {
                    BinaryOp::Add => Ok(l + r),
                    BinaryOp::Sub => Ok(l - r),
                    BinaryOp::Mul => Ok(l * r),
                    BinaryOp::Div => {
                        if r == 0.0 {
                            Err(Error::new(
                                ErrorKind::Expression,
                                ErrorCode::DivisionByZero,
                                Some(format!("{l} / 0")),
                            ))
                        } else {
                            Ok(l / r)
                        }
                    }
                }
            }
        }
    }
}

/// Evaluate an arithmetic expression.
pub fn eval_expr(input: &str) -> Result<f64> {
    let ast = parse(input).map_err(|e| e.into_error(input))?;
    ast.eval()
}

/// Read access to the named fields of a sample.
pub trait Fields {
    fn field(&self, column: &str) -> Option<&str>;
}

impl Fields for std::collections::HashMap<String, String> {
    fn field(&self, column: &str) -> Option<&str> {
        self.get(column).map(String::as_str)
    }
}

lazy_static! {
    static ref REFERENCE_RE: Regex = Regex::new(r"!([^!@]+)!|@([^!@]+)@").unwrap();
}

/// Substitute endpoint references in `exp` and evaluate the result.
///
/// `!col!` reads `col` from `earlier`, `@col@` from `later`.  Every
/// referenced value must be present and numeric.
pub fn evaluate_weight(exp: &str, earlier: &dyn Fields, later: &dyn Fields) -> Result<f64> {
    let mut substituted = String::with_capacity(exp.len());
    let mut last = 0;
    for caps in REFERENCE_RE.captures_iter(exp) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let (column, sample) = match (caps.get(1), caps.get(2)) {
            (Some(col), _) => (col.as_str(), earlier),
            (None, Some(col)) => (col.as_str(), later),
            (None, None) => continue,
        };
        let value = sample
            .field(column)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite());
        let Some(value) = value else {
            return Err(Error::new(
                ErrorKind::Expression,
                ErrorCode::NonNumericReference,
                Some(format!(
                    "{} refers to {:?}",
                    whole.as_str(),
                    sample.field(column)
                )),
            ));
        };
        substituted.push_str(&exp[last..whole.start()]);
        substituted.push_str(&format!("({value})"));
        last = whole.end();
    }
    substituted.push_str(&exp[last..]);

    eval_expr(&substituted)
}

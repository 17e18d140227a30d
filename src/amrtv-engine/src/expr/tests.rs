// Copyright 2026 The AMR-TV Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::HashMap;

use float_cmp::approx_eq;

use super::lexer::{Lexer, Token};
use super::*;

fn lex(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input)
        .map(|r| r.map(|(_, tok, _)| tok))
        .collect::<std::result::Result<Vec<_>, _>>()
        .unwrap()
}

fn err_code(input: &str) -> ErrorCode {
    let err = eval_expr(input).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Expression);
    err.code
}

fn sample(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_lexer() {
    assert_eq!(
        lex("2 + 3.5*(x)"),
        vec![
            Token::Num("2"),
            Token::Plus,
            Token::Num("3.5"),
            Token::Mul,
            Token::LParen,
            Token::Ident("x"),
            Token::RParen,
        ]
    );
    assert_eq!(lex("1e3 <= 2"), vec![Token::Num("1e3"), Token::Lte, Token::Num("2")]);
    assert_eq!(lex("a != b"), vec![Token::Ident("a"), Token::Neq, Token::Ident("b")]);

    let err = Lexer::new("1 $ 2")
        .collect::<std::result::Result<Vec<_>, _>>()
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidToken);
    assert_eq!((err.start, err.end), (2, 3));
}

#[test]
fn test_precedence() {
    assert!(approx_eq!(f64, eval_expr("2 + 3 * -4").unwrap(), -10.0));
    assert!(approx_eq!(f64, eval_expr("(2 + 3) * 4").unwrap(), 20.0));
    assert!(approx_eq!(f64, eval_expr("10 - 4 - 3").unwrap(), 3.0));
    assert!(approx_eq!(f64, eval_expr("12 / 4 / 3").unwrap(), 1.0));
    assert!(approx_eq!(f64, eval_expr("7 / 2").unwrap(), 3.5));
    assert!(approx_eq!(f64, eval_expr("--3").unwrap(), 3.0));
    assert!(approx_eq!(f64, eval_expr("+.5").unwrap(), 0.5));
    assert!(approx_eq!(f64, eval_expr(" 1.5e1 ").unwrap(), 15.0));
}

#[test]
fn test_parse_tree() {
    assert_eq!(
        parse("1 - -2").unwrap(),
        Expr::Op2(
            BinaryOp::Sub,
            Box::new(Expr::Const(1.0)),
            Box::new(Expr::Op1(UnaryOp::Negative, Box::new(Expr::Const(2.0)))),
        )
    );
}

#[test]
fn test_rejected_syntax() {
    assert_eq!(err_code("x + 1"), ErrorCode::UnsupportedSyntax);
    assert_eq!(err_code("abs(3)"), ErrorCode::UnsupportedSyntax);
    assert_eq!(err_code("1 < 2"), ErrorCode::UnsupportedSyntax);
    assert_eq!(err_code("1 2"), ErrorCode::ExtraToken);
    assert_eq!(err_code("(1 + 2"), ErrorCode::UnrecognizedEof);
    assert_eq!(err_code("1 +"), ErrorCode::UnrecognizedEof);
    assert_eq!(err_code("* 2"), ErrorCode::UnrecognizedToken);
    assert_eq!(err_code("."), ErrorCode::ExpectedNumber);
    assert_eq!(err_code("   "), ErrorCode::EmptyExpression);
    assert_eq!(err_code("1 # 2"), ErrorCode::InvalidToken);
}

#[test]
fn test_division_by_zero() {
    assert_eq!(err_code("1 / 0"), ErrorCode::DivisionByZero);
    assert_eq!(err_code("1 / (2 - 2)"), ErrorCode::DivisionByZero);
}

#[test]
fn test_evaluate_weight() {
    let earlier = sample(&[("snps", "3"), ("name", "A")]);
    let later = sample(&[("snps", "10"), ("name", "B")]);

    let w = evaluate_weight("@snps@ - !snps!", &earlier, &later).unwrap();
    assert!(approx_eq!(f64, w, 7.0));

    let w = evaluate_weight("!snps! - @snps@", &earlier, &later).unwrap();
    assert!(approx_eq!(f64, w, -7.0));

    let w = evaluate_weight("42", &earlier, &later).unwrap();
    assert!(approx_eq!(f64, w, 42.0));

    let negative = sample(&[("snps", "-2")]);
    let w = evaluate_weight("1 - !snps!", &negative, &later).unwrap();
    assert!(approx_eq!(f64, w, 3.0));
}

#[test]
fn test_evaluate_weight_bad_reference() {
    let earlier = sample(&[("snps", "3"), ("name", "A")]);
    let later = sample(&[("snps", "10")]);

    let err = evaluate_weight("!name! + 1", &earlier, &later).unwrap_err();
    assert_eq!(err.code, ErrorCode::NonNumericReference);

    let err = evaluate_weight("@name@ + 1", &earlier, &later).unwrap_err();
    assert_eq!(err.code, ErrorCode::NonNumericReference);
}

#[test]
fn test_deep_nesting_is_rejected() {
    let n = 200_000;
    let parens = format!("{}1{}", "(".repeat(n), ")".repeat(n));
    assert_eq!(err_code(&parens), ErrorCode::ExpressionTooDeep);
    assert_eq!(err_code(&format!("{}1", "-".repeat(n))), ErrorCode::ExpressionTooDeep);
    assert_eq!(err_code(&format!("1{}", "+1".repeat(n))), ErrorCode::ExpressionTooDeep);
    assert_eq!(err_code(&format!("1{}", "*1".repeat(n))), ErrorCode::ExpressionTooDeep);
}

#[test]
fn test_moderate_nesting_evaluates() {
    let parens = format!("{}2{}", "(".repeat(100), ")".repeat(100));
    assert!(approx_eq!(f64, eval_expr(&parens).unwrap(), 2.0));
    assert!(approx_eq!(f64, eval_expr(&format!("{}3", "-".repeat(100))).unwrap(), 3.0));
    let sum = format!("1{}", "+1".repeat(200));
    assert!(approx_eq!(f64, eval_expr(&sum).unwrap(), 201.0));
    // nesting inside parentheses does not accumulate across siblings
    let siblings = vec!["(((1)))"; 100].join("+");
    assert!(approx_eq!(f64, eval_expr(&siblings).unwrap(), 100.0));
}

// Copyright 2026 The AMR-TV Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Hand-written recursive descent parser for weight expressions.

use super::lexer::{Lexer, Spanned, Token};
use super::{BinaryOp, Expr, ExprError, UnaryOp};
use crate::common::ErrorCode;

/// TokenKind discriminant for peek comparisons without payload matching
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TokenKind {
    Plus,
    Minus,
    Mul,
    Div,
    LParen,
    RParen,
    Comma,
    Comparison,
    Ident,
    Num,
}

impl<'a> From<&Token<'a>> for TokenKind {
    fn from(token: &Token<'a>) -> Self {
        match token {
            Token::Plus => TokenKind::Plus,
            Token::Minus => TokenKind::Minus,
            Token::Mul => TokenKind::Mul,
            Token::Div => TokenKind::Div,
            Token::LParen => TokenKind::LParen,
            Token::RParen => TokenKind::RParen,
            Token::Comma => TokenKind::Comma,
            Token::Lt | Token::Lte | Token::Gt | Token::Gte | Token::Eq | Token::Neq => {
                TokenKind::Comparison
            }
            Token::Ident(_) => TokenKind::Ident,
            Token::Num(_) => TokenKind::Num,
        }
    }
}

/// Nesting limit for parentheses, unary signs and operator chains.
const MAX_DEPTH: usize = 256;

struct Parser<'input> {
    tokens: Vec<Spanned<Token<'input>>>,
    pos: usize,
    depth: usize,
}

impl<'input> Parser<'input> {
    fn new(lexer: Lexer<'input>) -> Result<Self, ExprError> {
        let tokens = lexer.collect::<Result<Vec<_>, _>>()?;
        Ok(Parser {
            tokens,
            pos: 0,
            depth: 0,
        })
    }

    fn peek(&self) -> Option<&Spanned<Token<'input>>> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|(_, tok, _)| TokenKind::from(tok))
    }

    fn advance(&mut self) -> Option<Spanned<Token<'input>>> {
        let tok = self.tokens.get(self.pos).copied();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eof_position(&self) -> usize {
        self.tokens.last().map_or(0, |(_, _, end)| *end)
    }

    fn unexpected(&self, code: ErrorCode) -> ExprError {
        match self.peek() {
            Some((start, _, end)) => ExprError {
                start: *start,
                end: *end,
                code,
            },
            None => {
                let pos = self.eof_position();
                ExprError {
                    start: pos,
                    end: pos + 1,
                    code: ErrorCode::UnrecognizedEof,
                }
            }
        }
    }

    /// Enter one more level of nesting.
    fn descend(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth <= MAX_DEPTH {
            return Ok(());
        }
        let (start, end) = match self.peek() {
            Some((start, _, end)) => (*start, *end),
            None => (self.eof_position(), self.eof_position() + 1),
        };
        Err(ExprError {
            start,
            end,
            code: ErrorCode::ExpressionTooDeep,
        })
    }

    fn parse_expression(&mut self) -> Result<Expr, ExprError> {
        if self.tokens.is_empty() {
            return Err(ExprError {
                start: 0,
                end: 0,
                code: ErrorCode::EmptyExpression,
            });
        }

        let expr = self.parse_additive()?;

        match self.peek_kind() {
            None => Ok(expr),
            Some(TokenKind::Comparison) => Err(self.unexpected(ErrorCode::UnsupportedSyntax)),
            Some(_) => Err(self.unexpected(ErrorCode::ExtraToken)),
        }
    }

    /// Parse additive operators (+, -)
    fn parse_additive(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_multiplicative()?;
        let outer = self.depth;

        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            // each operator nests the tree built so far one level deeper
            self.descend()?;
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Op2(op, Box::new(left), Box::new(right));
        }

        self.depth = outer;
        Ok(left)
    }

    /// Parse multiplicative operators (*, /)
    fn parse_multiplicative(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_unary()?;
        let outer = self.depth;

        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Mul) => BinaryOp::Mul,
                Some(TokenKind::Div) => BinaryOp::Div,
                _ => break,
            };
            self.descend()?;
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Op2(op, Box::new(left), Box::new(right));
        }

        self.depth = outer;
        Ok(left)
    }

    /// Parse unary operators (+, -)
    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        let op = match self.peek_kind() {
            Some(TokenKind::Plus) => UnaryOp::Positive,
            Some(TokenKind::Minus) => UnaryOp::Negative,
            _ => return self.parse_atom(),
        };
        self.descend()?;
        self.advance();
        let operand = self.parse_unary()?;
        self.depth -= 1;
        Ok(Expr::Op1(op, Box::new(operand)))
    }

    /// Parse numbers and parenthesized expressions
    fn parse_atom(&mut self) -> Result<Expr, ExprError> {
        match self.peek_kind() {
            Some(TokenKind::Num) => {
                let Some((start, Token::Num(text), end)) = self.advance() else {
                    unreachable!()
                };
                match text.parse::<f64>() {
                    Ok(n) => Ok(Expr::Const(n)),
                    Err(_) => Err(ExprError {
                        start,
                        end,
                        code: ErrorCode::ExpectedNumber,
                    }),
                }
            }
            Some(TokenKind::LParen) => {
                self.descend()?;
                self.advance();
                let expr = self.parse_additive()?;
                self.depth -= 1;
                if self.peek_kind() == Some(TokenKind::RParen) {
                    self.advance();
                    Ok(expr)
                } else {
                    Err(self.unexpected(ErrorCode::UnrecognizedToken))
                }
            }
            // variables, function calls and comparisons are not part of the
            // weight language
            Some(TokenKind::Ident) | Some(TokenKind::Comparison) => {
                Err(self.unexpected(ErrorCode::UnsupportedSyntax))
            }
            Some(TokenKind::Comma)
            | Some(TokenKind::RParen)
            | Some(TokenKind::Mul)
            | Some(TokenKind::Div)
            | Some(TokenKind::Plus)
            | Some(TokenKind::Minus) => Err(self.unexpected(ErrorCode::UnrecognizedToken)),
            None => Err(self.unexpected(ErrorCode::UnrecognizedEof)),
        }
    }
}

/// Parse an expression into its AST.
pub fn parse(input: &str) -> Result<Expr, ExprError> {
    let mut parser = Parser::new(Lexer::new(input))?;
    parser.parse_expression()
}

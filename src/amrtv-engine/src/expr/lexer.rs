// Copyright 2026 The AMR-TV Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::str::CharIndices;

use lazy_static::lazy_static;
use regex::Regex;
use unicode_xid::UnicodeXID;

use self::Token::*;
use super::ExprError;
use crate::common::ErrorCode::{self, *};

/// Tokens of the weight-expression language.
///
/// Identifiers, commas and comparison operators are lexed only so the parser
/// can reject them with a precise error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token<'input> {
    Plus,
    Minus,
    Mul,
    Div,
    LParen,
    RParen,
    Comma,
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Neq,
    Ident(&'input str),
    Num(&'input str),
}

pub type Spanned<T> = (usize, T, usize);

fn error<T>(code: ErrorCode, start: usize, end: usize) -> Result<T, ExprError> {
    Err(ExprError { start, end, code })
}

pub struct Lexer<'input> {
    text: &'input str,
    chars: CharIndices<'input>,
    lookahead: Option<(usize, char)>,
}

impl<'input> Lexer<'input> {
    pub fn new(input: &'input str) -> Self {
        let mut t = Lexer {
            text: input,
            chars: input.char_indices(),
            lookahead: None,
        };
        t.bump();
        t
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        self.lookahead = self.chars.next();
        self.lookahead
    }

    fn take_while<F>(&mut self, mut keep_going: F) -> usize
    where
        F: FnMut(char) -> bool,
    {
        loop {
            match self.lookahead {
                None => return self.text.len(),
                Some((idx1, c)) => {
                    if !keep_going(c) {
                        return idx1;
                    }
                    self.bump();
                }
            }
        }
    }

    fn identifier(&mut self, idx0: usize) -> Spanned<Token<'input>> {
        let end = self.take_while(is_identifier_continue);
        (idx0, Ident(&self.text[idx0..end]), end)
    }

    fn number(&mut self, idx0: usize) -> Spanned<Token<'input>> {
        lazy_static! {
            static ref NUMBER_RE: Regex =
                Regex::new(r"^\d*(\.\d*)?([eE][-+]?(\d*(\.\d*)?)?)?").unwrap();
        }

        let len = NUMBER_RE
            .find(&self.text[idx0..])
            .map_or(1, |m| m.end().max(1));
        let end = idx0 + len;
        while matches!(self.lookahead, Some((i, _)) if i < end) {
            self.bump();
        }
        (idx0, Num(&self.text[idx0..end]), end)
    }

    #[allow(clippy::unnecessary_wraps)]
    fn consume(
        &mut self,
        i: usize,
        tok: Token<'input>,
        len: usize,
    ) -> Option<Result<Spanned<Token<'input>>, ExprError>> {
        self.bump();
        Some(Ok((i, tok, i + len)))
    }
}

impl<'input> Iterator for Lexer<'input> {
    type Item = Result<Spanned<Token<'input>>, ExprError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            return match self.lookahead {
                Some((i, '+')) => self.consume(i, Plus, 1),
                Some((i, '-')) => self.consume(i, Minus, 1),
                Some((i, '*')) => self.consume(i, Mul, 1),
                Some((i, '/')) => self.consume(i, Div, 1),
                Some((i, '(')) => self.consume(i, LParen, 1),
                Some((i, ')')) => self.consume(i, RParen, 1),
                Some((i, ',')) => self.consume(i, Comma, 1),
                Some((i, '<')) => {
                    match self.bump() {
                        Some((_, '=')) => self.consume(i, Lte, 2),
                        Some((_, '>')) => self.consume(i, Neq, 2),
                        // already bumped, don't consume
                        _ => Some(Ok((i, Lt, i + 1))),
                    }
                }
                Some((i, '>')) => match self.bump() {
                    Some((_, '=')) => self.consume(i, Gte, 2),
                    _ => Some(Ok((i, Gt, i + 1))),
                },
                Some((i, '=')) => match self.bump() {
                    Some((_, '=')) => self.consume(i, Eq, 2),
                    _ => Some(Ok((i, Eq, i + 1))),
                },
                Some((i, '!')) => match self.bump() {
                    Some((_, '=')) => self.consume(i, Neq, 2),
                    _ => Some(error(UnrecognizedToken, i, i + 1)),
                },
                Some((i, c)) if is_identifier_start(c) => Some(Ok(self.identifier(i))),
                Some((i, c)) if is_number_start(c) => Some(Ok(self.number(i))),
                Some((_, c)) if c.is_whitespace() => {
                    self.bump();
                    continue;
                }
                Some((i, _)) => {
                    self.bump(); // eat whatever is killing us
                    let end = match self.lookahead {
                        Some((end, _)) => end,
                        None => self.text.len(),
                    };
                    Some(error(InvalidToken, i, end))
                }
                None => None,
            };
        }
    }
}

fn is_number_start(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

fn is_identifier_start(c: char) -> bool {
    UnicodeXID::is_xid_start(c) || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    UnicodeXID::is_xid_continue(c)
}

// Copyright 2026 The AMR-TV Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::result;

use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Generic,
    Io,
    Json,
    MissingHeader,
    MissingColumn,
    BadDelimiter,
    UnknownColumn,
    BadDateFormat,
    BadDateRange,
    UnparseableDate,
    InvalidToken,
    UnrecognizedToken,
    UnrecognizedEof,
    ExtraToken,
    ExpectedNumber,
    UnsupportedSyntax,
    NonNumericReference,
    DivisionByZero,
    EmptyExpression,
    ExpressionTooDeep,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            Generic => "generic",
            Io => "io",
            Json => "json",
            MissingHeader => "missing_header",
            MissingColumn => "missing_column",
            BadDelimiter => "bad_delimiter",
            UnknownColumn => "unknown_column",
            BadDateFormat => "bad_date_format",
            BadDateRange => "bad_date_range",
            UnparseableDate => "unparseable_date",
            InvalidToken => "invalid_token",
            UnrecognizedToken => "unrecognized_token",
            UnrecognizedEof => "unrecognized_eof",
            ExtraToken => "extra_token",
            ExpectedNumber => "expected_number",
            UnsupportedSyntax => "unsupported_syntax",
            NonNumericReference => "non_numeric_reference",
            DivisionByZero => "division_by_zero",
            EmptyExpression => "empty_expression",
            ExpressionTooDeep => "expression_too_deep",
        };

        write!(f, "{name}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed header or a missing required column.
    InputFormat,
    DateParse,
    Expression,
    /// Contradictory or unusable configuration; fatal to the call.
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ErrorKind::InputFormat => "input_format",
            ErrorKind::DateParse => "date_parse",
            ErrorKind::Expression => "expression",
            ErrorKind::Config => "config",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}:{code}{}", .details.as_ref().map(|d| format!(" -- {d}")).unwrap_or_default())]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub details: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, code: ErrorCode, details: Option<String>) -> Self {
        Error {
            kind,
            code,
            details,
        }
    }

    pub fn get_details(&self) -> Option<String> {
        self.details.clone()
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::InputFormat, ErrorCode::Io, Some(err.to_string()))
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::new(ErrorKind::InputFormat, ErrorCode::Io, Some(err.to_string()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorKind::Config, ErrorCode::Json, Some(err.to_string()))
    }
}

pub type Result<T> = result::Result<T, Error>;

#[macro_export]
macro_rules! config_err(
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Config, ErrorCode::$code, Some($str)))
    }}
);

#[macro_export]
macro_rules! input_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::InputFormat, ErrorCode::$code, Some($str)))
    }};
    ($code:tt) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::InputFormat, ErrorCode::$code, None))
    }};
}

/// Why a row was dropped or adjusted during one engine call.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    DuplicateSample,
    MissingSampleId,
    MissingDate,
    DateParse,
    MissingTrack,
    WeightExpression,
    BadTransmissionEvent,
}

/// A recovered, row-level failure.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnostic {
    /// 1-based data row (the header is row 0); `None` for derived entities.
    pub row: Option<usize>,
    pub sample_id: Option<String>,
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Per-call collection of diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Report {
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        row: Option<usize>,
        sample_id: Option<&str>,
        kind: DiagnosticKind,
        message: String,
    ) {
        tracing::warn!(?row, sample_id, ?kind, "{message}");
        self.diagnostics.push(Diagnostic {
            row,
            sample_id: sample_id.map(str::to_owned),
            kind,
            message,
        });
    }

    pub fn extend(&mut self, other: Report) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }
}

//! Error types for pg-ast

use serde::{Deserialize, Serialize};
use thiserror::Error;
#[cfg(feature = "bindings")]
use ts_rs::TS;

/// The result type for pg-ast operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by builders, traversal callbacks and the parser boundary
#[derive(Debug, Error)]
pub enum Error {
    /// `to_sql` was called without a bound or explicit parser
    #[error("No parser bound: pass one to to_sql_with() or bind it with with_parser()")]
    NoParser,

    /// A join was requested on a SELECT without any FROM item
    #[error("Cannot join: the FROM clause is empty")]
    EmptyFrom,

    /// The operation is not expressible by this builder
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// The statement kind of a bare attribute record could not be determined
    #[error("Cannot determine the statement kind of the node to deparse")]
    UnknownStatement,

    /// Raised from caller-supplied rewrite functions
    #[error("Rewrite error: {0}")]
    Rewrite(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Deparse(#[from] DeparseError),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

impl Error {
    /// Create an unsupported operation error
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Error::Unsupported(operation.into())
    }

    /// Create a rewrite error
    pub fn rewrite(message: impl Into<String>) -> Self {
        Error::Rewrite(message.into())
    }
}

/// Coarse classification the native parser attaches to its errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "bindings", derive(TS))]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "bindings", ts(export))]
pub enum ParseErrorKind {
    Syntax,
    Semantic,
    Unknown,
}

/// A parse failure reported by the external parser
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[cfg_attr(feature = "bindings", derive(TS))]
#[error("Parse error at position {cursor_pos}: {message}")]
#[cfg_attr(feature = "bindings", ts(export))]
pub struct ParseError {
    pub message: String,
    /// 1-based byte offset into the SQL text, 0 when unknown
    pub cursor_pos: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(message: impl Into<String>, cursor_pos: usize, kind: ParseErrorKind) -> Self {
        ParseError {
            message: message.into(),
            cursor_pos,
            kind,
        }
    }

    /// Create a syntax error
    pub fn syntax(message: impl Into<String>, cursor_pos: usize) -> Self {
        Self::new(message, cursor_pos, ParseErrorKind::Syntax)
    }
}

/// A deparse failure. Deparse errors are structural, so they carry no position.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[cfg_attr(feature = "bindings", derive(TS))]
#[error("Deparse error: {message}")]
#[cfg_attr(feature = "bindings", ts(export))]
pub struct DeparseError {
    pub message: String,
}

impl DeparseError {
    pub fn new(message: impl Into<String>) -> Self {
        DeparseError {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "bindings", derive(TS))]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "bindings", ts(export))]
pub enum ScanErrorKind {
    Syntax,
    Unknown,
}

/// A tokenization failure reported by the external scanner
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[cfg_attr(feature = "bindings", derive(TS))]
#[error("Scan error at position {cursor_pos}: {message}")]
#[cfg_attr(feature = "bindings", ts(export))]
pub struct ScanError {
    pub message: String,
    pub cursor_pos: usize,
    pub kind: ScanErrorKind,
}

impl ScanError {
    pub fn new(message: impl Into<String>, cursor_pos: usize, kind: ScanErrorKind) -> Self {
        ScanError {
            message: message.into(),
            cursor_pos,
            kind,
        }
    }
}

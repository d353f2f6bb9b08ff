//! Boundary to the external PostgreSQL parser/deparser.
//!
//! The grammar itself lives outside this crate (a vendored libpg_query behind
//! a foreign-function boundary). This module only fixes the contract: a
//! [`Parser`] turns SQL into a parse result tree and back, and tokenizes SQL.
//! Handles are shared as `Arc<dyn Parser>`; builders keep a clone so they can
//! deparse themselves, but the handle's lifecycle belongs to the caller.

use serde::{Deserialize, Serialize};
#[cfg(feature = "bindings")]
use ts_rs::TS;

use crate::error::{DeparseError, ParseError, ScanError};
use crate::value::Value;

/// Format version stamped onto parse result shells built by this crate
/// (PostgreSQL 17.4).
pub const PG_VERSION_NUM: i64 = 170004;

/// A parser/deparser/scanner handle.
///
/// Implementations exchange trees in libpg_query's JSON encoding, decoded into
/// [`Value`]. `parse` returns the full parse result root
/// (`{"version": .., "stmts": [..]}`); `deparse` accepts the same shape.
pub trait Parser: Send + Sync {
    fn parse(&self, sql: &str) -> Result<Value, ParseError>;

    fn deparse(&self, tree: &Value) -> Result<String, DeparseError>;

    /// Deparse a single non-statement node (an expression or clause).
    fn deparse_node(&self, _node: &Value) -> Result<String, DeparseError> {
        Err(DeparseError::new(
            "fragment deparse is not supported by this parser",
        ))
    }

    fn scan(&self, sql: &str) -> Result<Vec<ScanToken>, ScanError>;
}

/// Keyword classification of a scanned token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "bindings", derive(TS))]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "bindings", ts(export))]
pub enum KeywordKind {
    None,
    Unreserved,
    ColName,
    TypeFuncName,
    Reserved,
}

impl KeywordKind {
    /// Map the scanner's integer classification. Unknown codes are treated as
    /// non-keywords.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => KeywordKind::Unreserved,
            2 => KeywordKind::ColName,
            3 => KeywordKind::TypeFuncName,
            4 => KeywordKind::Reserved,
            _ => KeywordKind::None,
        }
    }
}

/// A single token produced by [`Parser::scan`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "bindings", derive(TS))]
#[cfg_attr(feature = "bindings", ts(export))]
pub struct ScanToken {
    /// Token kind name as reported by the scanner (e.g. `SELECT`, `IDENT`)
    pub kind: String,
    /// The original text of the token
    pub text: String,
    /// Byte offset of the first byte
    pub start: usize,
    /// Byte offset one past the last byte
    pub end: usize,
    pub keyword: KeywordKind,
}

impl ScanToken {
    /// Build a token from scanner output, slicing its text out of `sql`.
    pub fn new(sql: &str, kind: impl Into<String>, start: usize, end: usize, keyword: i32) -> Self {
        ScanToken {
            kind: kind.into(),
            text: sql.get(start..end).unwrap_or_default().to_string(),
            start,
            end,
            keyword: KeywordKind::from_code(keyword),
        }
    }
}

/// Build a parse result root around the given statement nodes.
pub fn parse_result<I: IntoIterator<Item = Value>>(stmts: I) -> Value {
    let raw = stmts
        .into_iter()
        .map(|stmt| Value::object([("stmt", stmt)]));
    Value::object([
        ("version", Value::from(PG_VERSION_NUM)),
        ("stmts", Value::list(raw)),
    ])
}

/// Returns `true` if `value` has the parse result shape (an ordered `stmts` list).
pub fn is_parse_result(value: &Value) -> bool {
    matches!(value.get("stmts"), Some(Value::List(_)))
}

/// The statement nodes of a parse result, in source order.
pub fn statements(root: &Value) -> Vec<&Value> {
    root.get("stmts")
        .map(Value::items)
        .unwrap_or(&[])
        .iter()
        .filter_map(|raw| raw.get("stmt"))
        .collect()
}

//! pg-ast - query, rewrite and build PostgreSQL parse trees
//!
//! This library works on the JSON parse trees produced by libpg_query (the
//! PostgreSQL grammar packaged as a library). The grammar itself is external:
//! callers hand in a [`Parser`] implementation and this crate supplies
//! everything around it.
//!
//! # Architecture
//!
//! 1. **Tree** - [`Value`], a persistent JSON value; tagged nodes are
//!    one-field objects (`{"SelectStmt": {..}}`)
//! 2. **Factories** - [`nodes`] and [`expr`] build node shapes the parser
//!    would emit
//! 3. **Traversal** - [`traversal`] finds, counts and rewrites nodes by kind
//!    with optional [`predicates`]
//! 4. **Builders** - [`builder`] wraps statements in immutable fluent builders
//!    that deparse through the bound parser
//!
//! # Examples
//!
//! ```
//! use pg_ast::{wrap, Builder, Value};
//! use serde_json::json;
//!
//! let tree = Value::from(json!({"SelectStmt": {
//!     "targetList": [{"ResTarget": {"val": {"ColumnRef": {"fields": [{"String": {"sval": "id"}}]}}}}],
//!     "fromClause": [{"RangeVar": {"relname": "users", "inh": true, "relpersistence": "p"}}],
//!     "op": "SETOP_NONE"
//! }}));
//!
//! let query = wrap(tree, None);
//! let renamed = query.transform_all("RangeVar", |table| {
//!     Ok(table.patch([("relname", Value::from("accounts"))]))
//! })?;
//!
//! assert!(renamed.as_select().is_some());
//! assert_eq!(
//!     renamed.find("RangeVar").and_then(|t| t.node().get("relname").cloned()),
//!     Some(Value::from("accounts"))
//! );
//! # Ok::<(), pg_ast::Error>(())
//! ```

use std::sync::Arc;

pub mod builder;
pub mod error;
pub mod expr;
pub mod nodes;
pub mod parser;
pub mod predicates;
pub mod traversal;
pub mod value;

pub use builder::{
    alter_table, create, create_index, create_table, delete_from, detect_statement_kind, insert,
    select, update, AlterTableBuilder, AnyBuilder, Builder, CreateIndexBuilder,
    CreateTableBuilder, DeleteBuilder, InsertBuilder, Query, SelectBuilder, StatementKind,
    UpdateBuilder,
};
pub use error::{
    DeparseError, Error, ParseError, ParseErrorKind, Result, ScanError, ScanErrorKind,
};
pub use nodes::{ExprArg, IntoNode, IntoRelation, IntoTableRef, Null};
pub use parser::{KeywordKind, Parser, ScanToken, PG_VERSION_NUM};
pub use traversal::{FindContext, Match, PathSegment, Visitor};
pub use value::{Fields, Value};

/// Wrap a tree in the most specific builder.
///
/// - A parse result root becomes a generic [`Query`].
/// - A tagged node is dispatched on its tag (see [`create`]).
/// - A bare attribute record is classified by its fields (see
///   [`detect_statement_kind`]); unrecognized records stay generic.
pub fn wrap(value: Value, parser: Option<Arc<dyn Parser>>) -> AnyBuilder {
    if parser::is_parse_result(&value) {
        return AnyBuilder::Query(Query::new(value, None, parser));
    }
    if let Some((kind, attrs)) = value.as_tagged() {
        return create(kind, attrs.clone(), parser);
    }
    match detect_statement_kind(&value) {
        Some(kind) => create(kind.name(), value, parser),
        None => AnyBuilder::Query(Query::new(value, None, parser)),
    }
}

/// Parse SQL and wrap the parse result, bound to `parser`.
///
/// # Arguments
/// * `parser` - The parser handle; the returned builder keeps a clone
/// * `sql` - One or more SQL statements
pub fn parse(parser: Arc<dyn Parser>, sql: &str) -> Result<AnyBuilder> {
    let tree = parser.parse(sql)?;
    tracing::debug!(
        statements = parser::statements(&tree).len(),
        "parsed SQL"
    );
    Ok(wrap(tree, Some(parser)))
}

/// Parse a single statement and wrap it in its specialized builder.
///
/// Fails with [`Error::Unsupported`] unless the input holds exactly one
/// statement.
pub fn parse_one(parser: Arc<dyn Parser>, sql: &str) -> Result<AnyBuilder> {
    let tree = parser.parse(sql)?;
    let statements = parser::statements(&tree);
    if statements.len() != 1 {
        return Err(Error::unsupported(format!(
            "expected 1 statement, found {}",
            statements.len()
        )));
    }
    let statement = statements[0].clone();
    Ok(wrap(statement, Some(parser)))
}

/// Tokenize SQL with `parser`.
pub fn scan(parser: &dyn Parser, sql: &str) -> Result<Vec<ScanToken>> {
    Ok(parser.scan(sql)?)
}

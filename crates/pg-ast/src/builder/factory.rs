//! Builder resolution by node kind.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
#[cfg(feature = "bindings")]
use ts_rs::TS;

use super::{
    AlterTableBuilder, Builder, CreateIndexBuilder, CreateTableBuilder, DeleteBuilder,
    InsertBuilder, Query, SelectBuilder, UpdateBuilder,
};
use crate::nodes::IntoNode;
use crate::parser::Parser;
use crate::value::Value;

/// The statement kinds with a specialized builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "bindings", derive(TS))]
#[cfg_attr(feature = "bindings", ts(export))]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    CreateTable,
    AlterTable,
    CreateIndex,
}

impl StatementKind {
    /// The node kind name in the parse tree
    pub fn name(self) -> &'static str {
        match self {
            StatementKind::Select => "SelectStmt",
            StatementKind::Insert => "InsertStmt",
            StatementKind::Update => "UpdateStmt",
            StatementKind::Delete => "DeleteStmt",
            StatementKind::CreateTable => "CreateStmt",
            StatementKind::AlterTable => "AlterTableStmt",
            StatementKind::CreateIndex => "IndexStmt",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "SelectStmt" => Some(StatementKind::Select),
            "InsertStmt" => Some(StatementKind::Insert),
            "UpdateStmt" => Some(StatementKind::Update),
            "DeleteStmt" => Some(StatementKind::Delete),
            "CreateStmt" => Some(StatementKind::CreateTable),
            "AlterTableStmt" => Some(StatementKind::AlterTable),
            "IndexStmt" => Some(StatementKind::CreateIndex),
            _ => None,
        }
    }
}

/// Guess the statement kind of an untagged attribute record from its fields.
///
/// DDL fields are unambiguous and checked first. Target-relation statements
/// come before SELECT: an UPDATE record carries a `targetList` too, and only a
/// SELECT lacks `relation`.
pub fn detect_statement_kind(attrs: &Value) -> Option<StatementKind> {
    let fields = attrs.as_object()?;
    let has = |key: &str| fields.contains_key(key);
    if has("tableElts") {
        return Some(StatementKind::CreateTable);
    }
    if has("cmds") && has("objtype") {
        return Some(StatementKind::AlterTable);
    }
    // a partial index has relation + whereClause, like a DELETE
    if has("idxname") || has("indexParams") {
        return Some(StatementKind::CreateIndex);
    }
    if has("relation") {
        if has("cols") || has("selectStmt") || has("onConflictClause") {
            return Some(StatementKind::Insert);
        }
        if has("targetList") {
            return Some(StatementKind::Update);
        }
        if has("usingClause") || has("whereClause") {
            return Some(StatementKind::Delete);
        }
    }
    if !has("relation")
        && (has("targetList") || has("fromClause") || has("op") || has("valuesLists"))
    {
        return Some(StatementKind::Select);
    }
    None
}

/// A builder of any kind, as returned by searches.
#[derive(Debug, Clone)]
pub enum AnyBuilder {
    Query(Query),
    Select(SelectBuilder),
    Insert(InsertBuilder),
    Update(UpdateBuilder),
    Delete(DeleteBuilder),
    CreateTable(CreateTableBuilder),
    AlterTable(AlterTableBuilder),
    CreateIndex(CreateIndexBuilder),
}

/// Wrap `attrs` in the builder for `kind`. Kinds without a specialized
/// builder get a generic [`Query`] that still remembers the kind.
pub fn create(kind: &str, attrs: Value, parser: Option<Arc<dyn Parser>>) -> AnyBuilder {
    dispatch(Query::new(attrs, Some(kind.to_string()), parser))
}

fn dispatch(query: Query) -> AnyBuilder {
    let kind = query.kind.as_deref().and_then(StatementKind::from_name);
    match kind {
        Some(StatementKind::Select) => AnyBuilder::Select(SelectBuilder::from_query(query)),
        Some(StatementKind::Insert) => AnyBuilder::Insert(InsertBuilder::from_query(query)),
        Some(StatementKind::Update) => AnyBuilder::Update(UpdateBuilder::from_query(query)),
        Some(StatementKind::Delete) => AnyBuilder::Delete(DeleteBuilder::from_query(query)),
        Some(StatementKind::CreateTable) => {
            AnyBuilder::CreateTable(CreateTableBuilder::from_query(query))
        }
        Some(StatementKind::AlterTable) => {
            AnyBuilder::AlterTable(AlterTableBuilder::from_query(query))
        }
        Some(StatementKind::CreateIndex) => {
            AnyBuilder::CreateIndex(CreateIndexBuilder::from_query(query))
        }
        None => AnyBuilder::Query(query),
    }
}

macro_rules! accessors {
    ($($variant:ident => $ty:ident, $as_fn:ident, $into_fn:ident;)*) => {
        impl AnyBuilder {
            $(
                pub fn $as_fn(&self) -> Option<&$ty> {
                    match self {
                        AnyBuilder::$variant(builder) => Some(builder),
                        _ => None,
                    }
                }

                pub fn $into_fn(self) -> Option<$ty> {
                    match self {
                        AnyBuilder::$variant(builder) => Some(builder),
                        _ => None,
                    }
                }
            )*
        }
    };
}

accessors! {
    Query => Query, as_query, into_query;
    Select => SelectBuilder, as_select, into_select;
    Insert => InsertBuilder, as_insert, into_insert;
    Update => UpdateBuilder, as_update, into_update;
    Delete => DeleteBuilder, as_delete, into_delete;
    CreateTable => CreateTableBuilder, as_create_table, into_create_table;
    AlterTable => AlterTableBuilder, as_alter_table, into_alter_table;
    CreateIndex => CreateIndexBuilder, as_create_index, into_create_index;
}

impl Builder for AnyBuilder {
    fn query(&self) -> &Query {
        match self {
            AnyBuilder::Query(query) => query,
            AnyBuilder::Select(builder) => builder.query(),
            AnyBuilder::Insert(builder) => builder.query(),
            AnyBuilder::Update(builder) => builder.query(),
            AnyBuilder::Delete(builder) => builder.query(),
            AnyBuilder::CreateTable(builder) => builder.query(),
            AnyBuilder::AlterTable(builder) => builder.query(),
            AnyBuilder::CreateIndex(builder) => builder.query(),
        }
    }

    fn from_query(query: Query) -> Self {
        dispatch(query)
    }
}

impl IntoNode for AnyBuilder {
    fn into_node(self) -> Value {
        self.query().into_node()
    }
}

impl IntoNode for &AnyBuilder {
    fn into_node(self) -> Value {
        self.query().into_node()
    }
}

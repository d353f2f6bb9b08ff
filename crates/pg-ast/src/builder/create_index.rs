//! CREATE INDEX builder.

use super::{impl_builder, Query};
use crate::nodes::{index_elem, relation, relation_in};
use crate::value::Value;

const KIND: &str = "IndexStmt";

/// Access method used when none is given
pub const DEFAULT_ACCESS_METHOD: &str = "btree";

/// Fluent builder for CREATE INDEX statements.
#[derive(Debug, Clone)]
pub struct CreateIndexBuilder {
    query: Query,
}

impl_builder!(CreateIndexBuilder);

/// Start a CREATE INDEX named `name`.
///
/// # Examples
///
/// ```
/// use pg_ast::builder::create_index;
/// use pg_ast::expr::is_null;
///
/// // CREATE UNIQUE INDEX CONCURRENTLY users_email_idx ON users (email) WHERE deleted_at IS NULL
/// let stmt = create_index("users_email_idx")
///     .on("users")
///     .columns(["email"])
///     .unique()
///     .concurrently()
///     .where_(is_null("deleted_at"));
/// assert_eq!(stmt.access_method(), Some("btree"));
/// ```
pub fn create_index(name: &str) -> CreateIndexBuilder {
    CreateIndexBuilder {
        query: Query::of_kind(
            KIND,
            Value::object([
                ("idxname", Value::from(name)),
                ("accessMethod", Value::from(DEFAULT_ACCESS_METHOD)),
            ]),
        ),
    }
}

impl CreateIndexBuilder {
    fn map(&self, f: impl FnOnce(&Query) -> Query) -> Self {
        CreateIndexBuilder {
            query: f(&self.query),
        }
    }

    fn flag(&self, field: &str) -> Self {
        self.map(|q| q.set(field, Value::from(true)))
    }

    /// Index `table` (`"schema.table"` is split).
    pub fn on(&self, table: &str) -> Self {
        self.map(|q| q.set("relation", relation(table)))
    }

    pub fn on_schema(&self, table: &str, schema: &str) -> Self {
        self.map(|q| q.set("relation", relation_in(schema, table)))
    }

    /// Append indexed columns, with default ordering and null placement.
    pub fn columns<I, S>(&self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let elems = columns.into_iter().map(|c| index_elem(c.as_ref()));
        self.map(|q| q.append("indexParams", elems))
    }

    pub fn columns_with(&self, f: impl FnOnce(Vec<Value>) -> Vec<Value>) -> Self {
        self.map(|q| q.map_list("indexParams", f))
    }

    /// Append covering columns (`INCLUDE (...)`), stored but not indexed.
    pub fn include<I, S>(&self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let elems = columns.into_iter().map(|c| index_elem(c.as_ref()));
        self.map(|q| q.append("indexIncludingParams", elems))
    }

    pub fn using(&self, method: &str) -> Self {
        self.map(|q| q.set("accessMethod", Value::from(method)))
    }

    pub fn unique(&self) -> Self {
        self.flag("unique")
    }

    pub fn concurrently(&self) -> Self {
        self.flag("concurrent")
    }

    pub fn if_not_exists(&self) -> Self {
        self.flag("if_not_exists")
    }

    /// AND a partial-index predicate into WHERE.
    pub fn where_(&self, condition: impl Into<Option<Value>>) -> Self {
        match condition.into() {
            Some(condition) => self.map(|q| q.and_where("whereClause", condition)),
            None => self.clone(),
        }
    }

    pub fn where_with(&self, f: impl FnOnce(Option<Value>) -> Option<Value>) -> Self {
        self.map(|q| q.map_opt("whereClause", f))
    }

    pub fn access_method(&self) -> Option<&str> {
        self.query.node.get("accessMethod").and_then(Value::as_str)
    }
}

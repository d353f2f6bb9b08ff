//! DELETE builder.

use super::{impl_builder, Query};
use crate::nodes::{target, ExprArg, IntoRelation, IntoTableRef};
use crate::value::Value;

const KIND: &str = "DeleteStmt";

/// Fluent builder for DELETE statements.
#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    query: Query,
}

impl_builder!(DeleteBuilder);

/// Start a DELETE from `table`.
pub fn delete_from(table: impl IntoRelation) -> DeleteBuilder {
    DeleteBuilder {
        query: Query::of_kind(KIND, Value::object([("relation", table.into_relation())])),
    }
}

impl DeleteBuilder {
    fn map(&self, f: impl FnOnce(&Query) -> Query) -> Self {
        DeleteBuilder {
            query: f(&self.query),
        }
    }

    pub fn where_(&self, condition: impl Into<Option<Value>>) -> Self {
        match condition.into() {
            Some(condition) => self.map(|q| q.and_where("whereClause", condition)),
            None => self.clone(),
        }
    }

    pub fn where_with(&self, f: impl FnOnce(Option<Value>) -> Option<Value>) -> Self {
        self.map(|q| q.map_opt("whereClause", f))
    }

    /// Append a `USING` item.
    pub fn using(&self, item: impl IntoTableRef) -> Self {
        self.map(|q| q.append("usingClause", [item.into_table_ref()]))
    }

    pub fn using_with(&self, f: impl FnOnce(Vec<Value>) -> Vec<Value>) -> Self {
        self.map(|q| q.map_list("usingClause", f))
    }

    pub fn returning<I, A>(&self, columns: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<ExprArg>,
    {
        self.map(|q| q.append("returningList", columns.into_iter().map(target)))
    }

    pub fn returning_with(&self, f: impl FnOnce(Vec<Value>) -> Vec<Value>) -> Self {
        self.map(|q| q.map_list("returningList", f))
    }
}

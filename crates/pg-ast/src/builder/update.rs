//! UPDATE builder.

use super::{impl_builder, Query};
use crate::nodes::{coerce_right, target, ExprArg, IntoRelation, IntoTableRef};
use crate::value::Value;

const KIND: &str = "UpdateStmt";

/// Fluent builder for UPDATE statements.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    query: Query,
}

impl_builder!(UpdateBuilder);

/// Start an UPDATE of `table`.
///
/// # Examples
///
/// ```
/// use pg_ast::builder::update;
/// use pg_ast::expr::eq;
///
/// // UPDATE users SET name = 'Bob', active = true WHERE id = 1
/// let stmt = update("users")
///     .set([("name", "Bob")])
///     .set([("active", true)])
///     .where_(eq("id", 1));
/// assert_eq!(stmt.assigned_columns(), vec!["name", "active"]);
/// ```
pub fn update(table: impl IntoRelation) -> UpdateBuilder {
    UpdateBuilder {
        query: Query::of_kind(KIND, Value::object([("relation", table.into_relation())])),
    }
}

fn assignment_name(item: &Value) -> Option<&str> {
    item.attrs()?.get("name")?.as_str()
}

impl UpdateBuilder {
    fn map(&self, f: impl FnOnce(&Query) -> Query) -> Self {
        UpdateBuilder {
            query: f(&self.query),
        }
    }

    /// Merge `column = value` assignments. An assignment to a column already
    /// in the SET list replaces it in place; new columns are appended. Values
    /// are right-hand operands, so strings are literals.
    pub fn set<I, K, A>(&self, assignments: I) -> Self
    where
        I: IntoIterator<Item = (K, A)>,
        K: AsRef<str>,
        A: Into<ExprArg>,
    {
        let mut items = self.query.items("targetList");
        for (name, value) in assignments {
            let name = name.as_ref();
            let assignment = Value::tagged(
                "ResTarget",
                Value::object([("name", Value::from(name)), ("val", coerce_right(value))]),
            );
            match items.iter().position(|item| assignment_name(item) == Some(name)) {
                Some(index) => items[index] = assignment,
                None => items.push(assignment),
            }
        }
        self.map(|q| q.set_list("targetList", items))
    }

    /// Replace the SET list.
    pub fn set_with(&self, f: impl FnOnce(Vec<Value>) -> Vec<Value>) -> Self {
        self.map(|q| q.map_list("targetList", f))
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

    /// Append an `UPDATE ... FROM` item.
    pub fn from(&self, item: impl IntoTableRef) -> Self {
        self.map(|q| q.append("fromClause", [item.into_table_ref()]))
    }

    pub fn from_with(&self, f: impl FnOnce(Vec<Value>) -> Vec<Value>) -> Self {
        self.map(|q| q.map_list("fromClause", f))
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

    /// Column names in the SET list, in order.
    pub fn assigned_columns(&self) -> Vec<&str> {
        self.query
            .node
            .get("targetList")
            .map(Value::items)
            .unwrap_or(&[])
            .iter()
            .filter_map(assignment_name)
            .collect()
    }
}

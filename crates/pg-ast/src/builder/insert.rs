//! INSERT builder.

use super::{impl_builder, Query};
use crate::nodes::{
    coerce_right, index_elem, list_node, target, ExprArg, IntoNode, IntoRelation,
};
use crate::value::Value;

const KIND: &str = "InsertStmt";

/// Fluent builder for INSERT statements.
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    query: Query,
}

impl_builder!(InsertBuilder);

/// Start an INSERT into `table` (a name, `"schema.table"`, or a `RangeVar`).
///
/// # Examples
///
/// ```
/// use pg_ast::builder::{insert, Builder, OnConflict};
/// use pg_ast::nodes::ExprArg;
///
/// // INSERT INTO users (id, name) VALUES (1, 'Bob') ON CONFLICT (id) DO NOTHING
/// let stmt = insert("users")
///     .columns(["id", "name"])
///     .values([ExprArg::from(1), ExprArg::from("Bob")])
///     .on_conflict(OnConflict::new().columns(["id"]).do_nothing());
/// assert!(stmt.has("IndexElem"));
/// ```
pub fn insert(table: impl IntoRelation) -> InsertBuilder {
    InsertBuilder {
        query: Query::of_kind(
            KIND,
            Value::object([
                ("relation", table.into_relation()),
                ("override", Value::from("OVERRIDING_NOT_SET")),
            ]),
        ),
    }
}

fn values_row<I, A>(row: I) -> Value
where
    I: IntoIterator<Item = A>,
    A: Into<ExprArg>,
{
    list_node(row.into_iter().map(coerce_right))
}

fn named_target(name: &str, value: Option<Value>) -> Value {
    let mut attrs = vec![("name", Value::from(name))];
    if let Some(value) = value {
        attrs.push(("val", value));
    }
    Value::tagged("ResTarget", Value::object(attrs))
}

#[derive(Debug, Clone, PartialEq)]
enum ConflictAction {
    Nothing,
    Update(Vec<(String, Value)>),
}

/// `ON CONFLICT` clause for [`InsertBuilder::on_conflict`].
///
/// Defaults to `DO NOTHING` without an inference target.
#[derive(Debug, Clone, PartialEq)]
pub struct OnConflict {
    columns: Vec<String>,
    action: ConflictAction,
}

impl Default for OnConflict {
    fn default() -> Self {
        OnConflict {
            columns: Vec::new(),
            action: ConflictAction::Nothing,
        }
    }
}

impl OnConflict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conflict inference target (`ON CONFLICT (a, b)`).
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns
            .extend(columns.into_iter().map(|c| c.as_ref().to_string()));
        self
    }

    pub fn do_nothing(mut self) -> Self {
        self.action = ConflictAction::Nothing;
        self
    }

    /// `DO UPDATE SET column = value, ...`. Values are coerced as right-hand
    /// operands, so strings are literals; use `col("excluded.x")` for columns.
    pub fn do_update<I, K, A>(mut self, assignments: I) -> Self
    where
        I: IntoIterator<Item = (K, A)>,
        K: AsRef<str>,
        A: Into<ExprArg>,
    {
        let assignments = assignments
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), coerce_right(v)))
            .collect();
        self.action = ConflictAction::Update(assignments);
        self
    }

    /// The clause record, untagged as `InsertStmt` stores it.
    fn to_attrs(&self) -> Value {
        let mut attrs = Vec::with_capacity(3);
        match &self.action {
            ConflictAction::Nothing => attrs.push(("action", Value::from("ONCONFLICT_NOTHING"))),
            ConflictAction::Update(_) => attrs.push(("action", Value::from("ONCONFLICT_UPDATE"))),
        }
        if !self.columns.is_empty() {
            let elems = self.columns.iter().map(|c| index_elem(c));
            attrs.push((
                "infer",
                Value::object([("indexElems", Value::list(elems))]),
            ));
        }
        if let ConflictAction::Update(assignments) = &self.action {
            let targets = assignments
                .iter()
                .map(|(name, value)| named_target(name, Some(value.clone())));
            attrs.push(("targetList", Value::list(targets)));
        }
        Value::object(attrs)
    }
}

impl InsertBuilder {
    fn map(&self, f: impl FnOnce(&Query) -> Query) -> Self {
        InsertBuilder {
            query: f(&self.query),
        }
    }

    /// Append to the column list.
    pub fn columns<I, S>(&self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cols = columns
            .into_iter()
            .map(|name| named_target(name.as_ref(), None));
        self.map(|q| q.append("cols", cols))
    }

    pub fn columns_with(&self, f: impl FnOnce(Vec<Value>) -> Vec<Value>) -> Self {
        self.map(|q| q.map_list("cols", f))
    }

    /// Set the `VALUES` row source to exactly `row`. Strings are literals.
    ///
    /// The row source is an embedded `SelectStmt` holding `valuesLists`, which
    /// is how the grammar represents `INSERT ... VALUES`. Any earlier row
    /// source, rows or `from_select`, is replaced.
    pub fn values<I, A>(&self, row: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<ExprArg>,
    {
        self.with_rows(vec![values_row(row)])
    }

    /// Append one more row to the `VALUES` source (multi-row INSERT). A
    /// `from_select` source is replaced.
    pub fn add_values<I, A>(&self, row: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<ExprArg>,
    {
        let mut rows = self.rows().to_vec();
        rows.push(values_row(row));
        self.with_rows(rows)
    }

    /// Rows of the `VALUES` source; empty for `from_select` or no source.
    pub fn rows(&self) -> &[Value] {
        self.query
            .node
            .get("selectStmt")
            .and_then(Value::attrs)
            .and_then(|attrs| attrs.get("valuesLists"))
            .map(Value::items)
            .unwrap_or(&[])
    }

    fn with_rows(&self, rows: Vec<Value>) -> Self {
        let source = Value::tagged(
            "SelectStmt",
            Value::object([
                ("valuesLists", Value::from(rows)),
                ("limitOption", Value::from("LIMIT_OPTION_DEFAULT")),
                ("op", Value::from("SETOP_NONE")),
            ]),
        );
        self.map(|q| q.set("selectStmt", source))
    }

    /// Use a query as the row source (`INSERT ... SELECT`).
    pub fn from_select(&self, query: impl IntoNode) -> Self {
        let node = query.into_node();
        let source = if node.as_tagged().is_some() {
            node
        } else {
            Value::tagged("SelectStmt", node)
        };
        self.map(|q| q.set("selectStmt", source))
    }

    pub fn on_conflict(&self, clause: OnConflict) -> Self {
        self.map(|q| q.set("onConflictClause", clause.to_attrs()))
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

    /// Names in the column list.
    pub fn column_names(&self) -> Vec<&str> {
        self.query
            .node
            .get("cols")
            .map(Value::items)
            .unwrap_or(&[])
            .iter()
            .filter_map(|item| item.attrs()?.get("name")?.as_str())
            .collect()
    }
}

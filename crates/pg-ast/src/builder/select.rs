//! SELECT builder.

use serde::{Deserialize, Serialize};
#[cfg(feature = "bindings")]
use ts_rs::TS;

use super::{impl_builder, Query};
use crate::error::{Error, Result};
use crate::nodes::{
    coerce, coerce_right, sort_by, target, ExprArg, IntoNode, IntoTableRef, NullsOrder,
    SortDirection,
};
use crate::value::Value;

const KIND: &str = "SelectStmt";

/// Join flavor for [`SelectBuilder::join`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "bindings", derive(TS))]
#[cfg_attr(feature = "bindings", ts(export))]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinType::Inner => "JOIN_INNER",
            JoinType::Left => "JOIN_LEFT",
            JoinType::Right => "JOIN_RIGHT",
            JoinType::Full => "JOIN_FULL",
        }
    }
}

/// Fluent builder for SELECT statements.
///
/// Created by [`select`], or returned from searches for `SelectStmt` nodes.
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    query: Query,
}

impl_builder!(SelectBuilder);

fn skeleton() -> Vec<(&'static str, Value)> {
    vec![
        ("limitOption", Value::from("LIMIT_OPTION_DEFAULT")),
        ("op", Value::from("SETOP_NONE")),
    ]
}

/// Start a SELECT over `columns`. Strings are column names (`"users.id"`,
/// `"*"`); nodes are used as target expressions.
///
/// # Examples
///
/// ```
/// use pg_ast::builder::{select, Builder};
/// use pg_ast::nodes::{alias, func};
///
/// // SELECT id, count(*) AS total FROM users GROUP BY id
/// let query = select(["id"])
///     .columns([alias(func("count", ["*"]), "total")])
///     .from("users")
///     .group_by(["id"]);
/// assert_eq!(query.target_list().len(), 2);
/// ```
pub fn select<I, A>(columns: I) -> SelectBuilder
where
    I: IntoIterator<Item = A>,
    A: Into<ExprArg>,
{
    let targets: Vec<Value> = columns.into_iter().map(target).collect();
    let mut attrs = Vec::with_capacity(3);
    if !targets.is_empty() {
        attrs.push(("targetList", Value::from(targets)));
    }
    attrs.extend(skeleton());
    SelectBuilder {
        query: Query::of_kind(KIND, Value::object(attrs)),
    }
}

/// Unwrap a SELECT operand to its attribute record.
fn select_attrs(node: Value) -> Value {
    match node.as_tagged() {
        Some((KIND, attrs)) => attrs.clone(),
        _ => node,
    }
}

impl SelectBuilder {
    fn map(&self, f: impl FnOnce(&Query) -> Query) -> Self {
        SelectBuilder {
            query: f(&self.query),
        }
    }

    // -- Target list ----------------------------------------------------------

    /// Append output columns.
    pub fn columns<I, A>(&self, columns: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<ExprArg>,
    {
        self.map(|q| q.append("targetList", columns.into_iter().map(target)))
    }

    pub fn columns_with(&self, f: impl FnOnce(Vec<Value>) -> Vec<Value>) -> Self {
        self.map(|q| q.map_list("targetList", f))
    }

    /// Same as [`columns`](Self::columns): the target list doubles as the
    /// output list.
    pub fn returning<I, A>(&self, columns: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<ExprArg>,
    {
        self.columns(columns)
    }

    pub fn distinct(&self) -> Self {
        self.map(|q| q.set("distinctClause", Value::list([Value::empty_object()])))
    }

    /// `DISTINCT ON (expressions)`
    pub fn distinct_on<I, A>(&self, expressions: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<ExprArg>,
    {
        let items: Vec<Value> = expressions.into_iter().map(coerce).collect();
        self.map(|q| q.set_list("distinctClause", items))
    }

    // -- FROM and joins -------------------------------------------------------

    /// Append a FROM item. Names become table references.
    pub fn from(&self, item: impl IntoTableRef) -> Self {
        self.map(|q| q.append("fromClause", [item.into_table_ref()]))
    }

    pub fn from_with(&self, f: impl FnOnce(Vec<Value>) -> Vec<Value>) -> Self {
        self.map(|q| q.map_list("fromClause", f))
    }

    /// Join `item` onto the last FROM item, which becomes the left arm.
    ///
    /// Returns [`Error::EmptyFrom`] when there is nothing to join onto.
    pub fn join(
        &self,
        join_type: JoinType,
        item: impl IntoTableRef,
        on: impl Into<Option<Value>>,
    ) -> Result<Self> {
        let mut from = self.query.items("fromClause");
        let left = from.pop().ok_or(Error::EmptyFrom)?;
        let mut attrs = vec![
            ("jointype", Value::from(join_type.as_str())),
            ("larg", left),
            ("rarg", item.into_table_ref()),
        ];
        if let Some(on) = on.into() {
            attrs.push(("quals", on));
        }
        from.push(Value::tagged("JoinExpr", Value::object(attrs)));
        Ok(self.map(|q| q.set_list("fromClause", from)))
    }

    pub fn inner_join(&self, item: impl IntoTableRef, on: impl Into<Option<Value>>) -> Result<Self> {
        self.join(JoinType::Inner, item, on)
    }

    pub fn left_join(&self, item: impl IntoTableRef, on: impl Into<Option<Value>>) -> Result<Self> {
        self.join(JoinType::Left, item, on)
    }

    pub fn right_join(&self, item: impl IntoTableRef, on: impl Into<Option<Value>>) -> Result<Self> {
        self.join(JoinType::Right, item, on)
    }

    pub fn full_join(&self, item: impl IntoTableRef, on: impl Into<Option<Value>>) -> Result<Self> {
        self.join(JoinType::Full, item, on)
    }

    // -- Filters --------------------------------------------------------------

    /// AND a condition into WHERE. `None` leaves the clause as is.
    pub fn where_(&self, condition: impl Into<Option<Value>>) -> Self {
        match condition.into() {
            Some(condition) => self.map(|q| q.and_where("whereClause", condition)),
            None => self.clone(),
        }
    }

    pub fn where_with(&self, f: impl FnOnce(Option<Value>) -> Option<Value>) -> Self {
        self.map(|q| q.map_opt("whereClause", f))
    }

    /// AND a condition into HAVING. `None` leaves the clause as is.
    pub fn having(&self, condition: impl Into<Option<Value>>) -> Self {
        match condition.into() {
            Some(condition) => self.map(|q| q.and_where("havingClause", condition)),
            None => self.clone(),
        }
    }

    pub fn having_with(&self, f: impl FnOnce(Option<Value>) -> Option<Value>) -> Self {
        self.map(|q| q.map_opt("havingClause", f))
    }

    // -- Grouping and ordering ------------------------------------------------

    pub fn group_by<I, A>(&self, expressions: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<ExprArg>,
    {
        self.map(|q| q.append("groupClause", expressions.into_iter().map(coerce)))
    }

    pub fn group_by_with(&self, f: impl FnOnce(Vec<Value>) -> Vec<Value>) -> Self {
        self.map(|q| q.map_list("groupClause", f))
    }

    /// Append ORDER BY items. Plain expressions get the default direction;
    /// `SortBy` nodes (see [`sort_by`]) are kept as built.
    pub fn order_by<I, A>(&self, items: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<ExprArg>,
    {
        let items = items.into_iter().map(|item| {
            let node = coerce(item);
            if node.kind() == Some("SortBy") {
                node
            } else {
                sort_by(node, SortDirection::Default, NullsOrder::Default)
            }
        });
        self.map(|q| q.append("sortClause", items))
    }

    pub fn order_by_with(&self, f: impl FnOnce(Vec<Value>) -> Vec<Value>) -> Self {
        self.map(|q| q.map_list("sortClause", f))
    }

    // -- LIMIT / OFFSET -------------------------------------------------------

    pub fn limit(&self, count: impl Into<ExprArg>) -> Self {
        self.limit_with(|_| Some(coerce_right(count)))
    }

    pub fn limit_with(&self, f: impl FnOnce(Option<Value>) -> Option<Value>) -> Self {
        let query = self.query.map_opt("limitCount", f);
        let option = if query.node.get("limitCount").is_some() {
            "LIMIT_OPTION_COUNT"
        } else {
            "LIMIT_OPTION_DEFAULT"
        };
        SelectBuilder {
            query: query.set("limitOption", Value::from(option)),
        }
    }

    pub fn offset(&self, count: impl Into<ExprArg>) -> Self {
        self.offset_with(|_| Some(coerce_right(count)))
    }

    pub fn offset_with(&self, f: impl FnOnce(Option<Value>) -> Option<Value>) -> Self {
        self.map(|q| q.map_opt("limitOffset", f))
    }

    // -- CTEs -----------------------------------------------------------------

    /// Add a common table expression. A SELECT body without a set operation
    /// gets `op: SETOP_NONE`.
    pub fn with(&self, name: &str, query: impl IntoNode) -> Self {
        self.add_cte(name, query.into_node(), false)
    }

    /// Add a CTE and mark the WITH clause recursive.
    pub fn with_recursive(&self, name: &str, query: impl IntoNode) -> Self {
        self.add_cte(name, query.into_node(), true)
    }

    fn add_cte(&self, name: &str, body: Value, recursive: bool) -> Self {
        let body = match body.as_tagged() {
            Some((KIND, attrs)) if attrs.get("op").is_none() => {
                Value::tagged(KIND, attrs.with("op", Value::from("SETOP_NONE")))
            }
            _ => body,
        };
        let cte = Value::tagged(
            "CommonTableExpr",
            Value::object([
                ("ctename", Value::from(name)),
                ("ctequery", body),
                ("ctematerialized", Value::from("CTEMaterializeDefault")),
            ]),
        );
        let with_clause = self.query.node.get("withClause").cloned().unwrap_or_default();
        let mut ctes = with_clause.get("ctes").map(Value::items).unwrap_or(&[]).to_vec();
        ctes.push(cte);
        let mut with_clause = with_clause.with("ctes", Value::from(ctes));
        if recursive {
            with_clause = with_clause.with("recursive", Value::from(true));
        }
        self.map(|q| q.set("withClause", with_clause))
    }

    // -- Set operations -------------------------------------------------------

    fn set_operation(&self, op: &str, all: bool, other: impl IntoNode) -> Self {
        let mut attrs = vec![("op", Value::from(op))];
        if all {
            attrs.push(("all", Value::from(true)));
        }
        attrs.push(("larg", self.query.node.clone()));
        attrs.push(("rarg", select_attrs(other.into_node())));
        attrs.push(("limitOption", Value::from("LIMIT_OPTION_DEFAULT")));
        SelectBuilder {
            query: self.query.with_node(Value::object(attrs)),
        }
    }

    /// `self UNION other`, as a new statement over both operands.
    pub fn union(&self, other: impl IntoNode) -> Self {
        self.set_operation("SETOP_UNION", false, other)
    }

    pub fn union_all(&self, other: impl IntoNode) -> Self {
        self.set_operation("SETOP_UNION", true, other)
    }

    pub fn except(&self, other: impl IntoNode) -> Self {
        self.set_operation("SETOP_EXCEPT", false, other)
    }

    pub fn intersect(&self, other: impl IntoNode) -> Self {
        self.set_operation("SETOP_INTERSECT", false, other)
    }

    // -- Locking --------------------------------------------------------------

    fn lock(&self, strength: &str) -> Self {
        let clause = Value::tagged(
            "LockingClause",
            Value::object([
                ("strength", Value::from(strength)),
                ("waitPolicy", Value::from("LockWaitBlock")),
            ]),
        );
        self.map(|q| q.append("lockingClause", [clause]))
    }

    pub fn for_update(&self) -> Self {
        self.lock("LCS_FORUPDATE")
    }

    pub fn for_share(&self) -> Self {
        self.lock("LCS_FORSHARE")
    }

    // -- Getters --------------------------------------------------------------

    pub fn target_list(&self) -> &[Value] {
        self.query.node.get("targetList").map(Value::items).unwrap_or(&[])
    }

    pub fn from_clause(&self) -> &[Value] {
        self.query.node.get("fromClause").map(Value::items).unwrap_or(&[])
    }

    pub fn where_clause(&self) -> Option<&Value> {
        self.query.node.get("whereClause")
    }

    /// Output column names of the target list, where they can be read off
    /// without deparsing (an alias, or the last part of a column reference).
    pub fn column_names(&self) -> Vec<String> {
        self.target_list()
            .iter()
            .filter_map(|item| {
                let attrs = item.attrs()?;
                if let Some(name) = attrs.get("name").and_then(Value::as_str) {
                    return Some(name.to_string());
                }
                let column = attrs.get("val")?.as_tagged()?;
                match column {
                    ("ColumnRef", fields) => crate::nodes::column_names(fields)
                        .last()
                        .map(|name| name.to_string()),
                    _ => None,
                }
            })
            .collect()
    }
}

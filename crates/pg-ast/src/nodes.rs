//! Node factories and argument coercion.
//!
//! Factories build the canonical libpg_query shapes for common SQL fragments
//! (column references, constants, table references, function calls, ...).
//! They are pure and total: they never inspect or validate SQL semantics.
//!
//! [`ExprArg`] is the uniform input type of the expression helpers and
//! builders. Plain Rust values are mapped to nodes by position:
//!
//! - [`coerce`] (left operand): a string is a column reference, split on `.`
//! - [`coerce_right`] (right operand): a string is a string literal
//!
//! Numbers and booleans are always literals, [`Null`] / `None` is SQL `NULL`,
//! and an already-built [`Value`] passes through untouched.
//!
//! # Examples
//!
//! ```
//! use pg_ast::nodes::{coerce, coerce_right};
//!
//! let column = coerce("users.name");
//! assert_eq!(column.kind(), Some("ColumnRef"));
//!
//! let literal = coerce_right("Bob");
//! assert_eq!(literal.kind(), Some("A_Const"));
//! ```

use serde::{Deserialize, Serialize};
#[cfg(feature = "bindings")]
use ts_rs::TS;

use crate::value::Value;

/// Marker for SQL `NULL` in argument position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Null;

/// Closed union of everything the expression helpers accept.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprArg {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    Node(Value),
}

impl From<&str> for ExprArg {
    fn from(value: &str) -> Self {
        ExprArg::Str(value.to_string())
    }
}

impl From<&String> for ExprArg {
    fn from(value: &String) -> Self {
        ExprArg::Str(value.clone())
    }
}

impl From<String> for ExprArg {
    fn from(value: String) -> Self {
        ExprArg::Str(value)
    }
}

impl From<i32> for ExprArg {
    fn from(value: i32) -> Self {
        ExprArg::Int(value.into())
    }
}

impl From<i64> for ExprArg {
    fn from(value: i64) -> Self {
        ExprArg::Int(value)
    }
}

impl From<u32> for ExprArg {
    fn from(value: u32) -> Self {
        ExprArg::Int(value.into())
    }
}

impl From<f64> for ExprArg {
    fn from(value: f64) -> Self {
        ExprArg::Float(value)
    }
}

impl From<bool> for ExprArg {
    fn from(value: bool) -> Self {
        ExprArg::Bool(value)
    }
}

impl From<Null> for ExprArg {
    fn from(_: Null) -> Self {
        ExprArg::Null
    }
}

impl From<Value> for ExprArg {
    fn from(value: Value) -> Self {
        ExprArg::Node(value)
    }
}

impl From<&Value> for ExprArg {
    fn from(value: &Value) -> Self {
        ExprArg::Node(value.clone())
    }
}

impl<T: Into<ExprArg>> From<Option<T>> for ExprArg {
    fn from(value: Option<T>) -> Self {
        value.map_or(ExprArg::Null, Into::into)
    }
}

/// Conversion into a tagged node, used wherever an already-built subtree is
/// expected (subqueries, CTE bodies, INSERT ... SELECT).
pub trait IntoNode {
    fn into_node(self) -> Value;
}

impl IntoNode for Value {
    fn into_node(self) -> Value {
        self
    }
}

impl IntoNode for &Value {
    fn into_node(self) -> Value {
        self.clone()
    }
}

/// Conversion into a `RangeVar` attribute record (untagged), the shape of
/// statement target relations.
///
/// Names are split on the first `.` into schema and relation. A tagged
/// `RangeVar` node is unwrapped; any other value is taken as the record.
pub trait IntoRelation {
    fn into_relation(self) -> Value;
}

impl IntoRelation for &str {
    fn into_relation(self) -> Value {
        relation(self)
    }
}

impl IntoRelation for String {
    fn into_relation(self) -> Value {
        relation(&self)
    }
}

impl IntoRelation for &String {
    fn into_relation(self) -> Value {
        relation(self)
    }
}

impl IntoRelation for Value {
    fn into_relation(self) -> Value {
        match self.as_tagged() {
            Some(("RangeVar", attrs)) => attrs.clone(),
            _ => self,
        }
    }
}

/// Conversion into a FROM/USING item: names become `RangeVar` nodes, nodes
/// (joins, subselects, function scans) pass through.
pub trait IntoTableRef {
    fn into_table_ref(self) -> Value;
}

impl IntoTableRef for &str {
    fn into_table_ref(self) -> Value {
        table(self)
    }
}

impl IntoTableRef for String {
    fn into_table_ref(self) -> Value {
        table(&self)
    }
}

impl IntoTableRef for &String {
    fn into_table_ref(self) -> Value {
        table(self)
    }
}

impl IntoTableRef for Value {
    fn into_table_ref(self) -> Value {
        self
    }
}

impl IntoTableRef for &Value {
    fn into_table_ref(self) -> Value {
        self.clone()
    }
}

/// Coerce a left-hand operand: strings become column references.
pub fn coerce(arg: impl Into<ExprArg>) -> Value {
    match arg.into() {
        ExprArg::Str(name) => col(&name),
        other => literal(other),
    }
}

/// Coerce a right-hand operand: strings become string literals.
pub fn coerce_right(arg: impl Into<ExprArg>) -> Value {
    literal(arg.into())
}

fn literal(arg: ExprArg) -> Value {
    let attrs = match arg {
        ExprArg::Node(node) => return node,
        ExprArg::Str(s) => constant("sval", Value::from(s)),
        ExprArg::Int(i) => constant("ival", Value::from(i)),
        ExprArg::Float(f) if !f.is_finite() => return special_float(f),
        ExprArg::Float(f) => constant("fval", Value::from(float_text(f))),
        ExprArg::Bool(b) => constant("boolval", Value::from(b)),
        ExprArg::Null => Value::object([("isnull", Value::from(true))]),
    };
    Value::tagged("A_Const", attrs)
}

fn constant(field: &str, inner: Value) -> Value {
    Value::object([(field, Value::object([(field, inner)]))])
}

/// Shortest decimal text that reads back as the same `f64`, so no precision is
/// lost on the way to the parser. Finite values only.
fn float_text(value: f64) -> String {
    let text = value.to_string();
    if text.contains(['.', 'e', 'E']) {
        text
    } else {
        format!("{text}.0")
    }
}

/// NaN and the infinities have no numeric-constant syntax; they are written
/// the way PostgreSQL spells them, as `'NaN'::float8`.
fn special_float(value: f64) -> Value {
    let text = if value.is_nan() {
        "NaN"
    } else if value.is_sign_positive() {
        "Infinity"
    } else {
        "-Infinity"
    };
    Value::tagged(
        "TypeCast",
        Value::object([
            ("arg", Value::tagged("A_Const", constant("sval", Value::from(text)))),
            ("typeName", parse_type("float8")),
        ]),
    )
}

/// A `String` name atom: `{"String": {"sval": name}}`.
pub fn string_node(name: &str) -> Value {
    Value::tagged("String", Value::object([("sval", Value::from(name))]))
}

/// A list of `String` name atoms.
pub fn name_list<I, S>(names: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Value::list(names.into_iter().map(|n| string_node(n.as_ref())))
}

/// A `List` node.
pub fn list_node<I: IntoIterator<Item = Value>>(items: I) -> Value {
    Value::tagged("List", Value::object([("items", Value::list(items))]))
}

/// Column reference from explicit name parts. A `*` part becomes `A_Star`.
pub fn column_ref<I, S>(parts: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let fields = parts.into_iter().map(|part| match part.as_ref() {
        "*" => Value::tagged("A_Star", Value::empty_object()),
        name => string_node(name),
    });
    Value::tagged("ColumnRef", Value::object([("fields", Value::list(fields))]))
}

/// Column reference from a possibly qualified name (`"users.id"`).
pub fn col(name: &str) -> Value {
    column_ref(name.split('.'))
}

/// Literal constant. Strings are literals here regardless of position.
pub fn val(value: impl Into<ExprArg>) -> Value {
    literal(value.into())
}

/// Unqualified `*`.
pub fn star() -> Value {
    column_ref(["*"])
}

/// Table-qualified `table.*`.
pub fn star_of(table: &str) -> Value {
    column_ref([table, "*"])
}

/// Untagged `RangeVar` record for a possibly schema-qualified name.
pub fn relation(name: &str) -> Value {
    match name.split_once('.') {
        Some((schema, rel)) => relation_in(schema, rel),
        None => range_var(None, name),
    }
}

/// Untagged `RangeVar` record in an explicit schema.
pub fn relation_in(schema: &str, name: &str) -> Value {
    range_var(Some(schema), name)
}

fn range_var(schema: Option<&str>, name: &str) -> Value {
    let mut pairs = Vec::with_capacity(4);
    if let Some(schema) = schema {
        pairs.push(("schemaname", Value::from(schema)));
    }
    pairs.push(("relname", Value::from(name)));
    pairs.push(("inh", Value::from(true)));
    pairs.push(("relpersistence", Value::from("p")));
    Value::object(pairs)
}

/// Table reference node (`RangeVar`), e.g. for FROM items.
pub fn table(name: &str) -> Value {
    Value::tagged("RangeVar", relation(name))
}

/// Schema-qualified table reference node.
pub fn table_in(schema: &str, name: &str) -> Value {
    Value::tagged("RangeVar", relation_in(schema, name))
}

/// Table reference with an alias (`users AS u`).
pub fn table_as(name: &str, alias: &str) -> Value {
    let attrs = relation(name).with(
        "alias",
        Value::object([("aliasname", Value::from(alias))]),
    );
    Value::tagged("RangeVar", attrs)
}

/// Subquery FROM item (`(SELECT ...) AS alias`).
pub fn subselect(query: impl IntoNode, alias: &str) -> Value {
    Value::tagged(
        "RangeSubselect",
        Value::object([
            ("subquery", query.into_node()),
            ("alias", Value::object([("aliasname", Value::from(alias))])),
        ]),
    )
}

/// Target-list item with an output name (`expr AS name`).
pub fn alias(expr: impl Into<ExprArg>, name: &str) -> Value {
    Value::tagged(
        "ResTarget",
        Value::object([("name", Value::from(name)), ("val", coerce(expr))]),
    )
}

/// Target-list item without an output name.
pub fn target(expr: impl Into<ExprArg>) -> Value {
    let value = coerce(expr);
    if value.kind() == Some("ResTarget") {
        return value;
    }
    Value::tagged("ResTarget", Value::object([("val", value)]))
}

pub(crate) fn is_star_ref(node: &Value) -> bool {
    match node.as_tagged() {
        Some(("ColumnRef", attrs)) => {
            let fields = attrs.get("fields").map(Value::items).unwrap_or(&[]);
            fields.len() == 1 && fields[0].kind() == Some("A_Star")
        }
        _ => false,
    }
}

/// Function call. A lone `*` argument becomes the aggregate-star form
/// (`count(*)`) rather than an argument.
pub fn func<I, A>(name: &str, args: I) -> Value
where
    I: IntoIterator<Item = A>,
    A: Into<ExprArg>,
{
    let args: Vec<Value> = args.into_iter().map(coerce).collect();
    let mut pairs = vec![("funcname", name_list(name.split('.')))];
    if args.len() == 1 && is_star_ref(&args[0]) {
        pairs.push(("agg_star", Value::from(true)));
    } else if !args.is_empty() {
        pairs.push(("args", Value::list(args)));
    }
    pairs.push(("funcformat", Value::from("COERCE_EXPLICIT_CALL")));
    Value::tagged("FuncCall", Value::object(pairs))
}

/// Positional parameter placeholder (`$1`, `$2`, ...).
pub fn param(number: u32) -> Value {
    Value::tagged("ParamRef", Value::object([("number", Value::from(number))]))
}

/// `expr::type`. The type string follows [`parse_type`].
pub fn cast(expr: impl Into<ExprArg>, type_name: &str) -> Value {
    Value::tagged(
        "TypeCast",
        Value::object([("arg", coerce(expr)), ("typeName", parse_type(type_name))]),
    )
}

/// Sort direction of an ORDER BY item or index element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "bindings", derive(TS))]
#[cfg_attr(feature = "bindings", ts(export))]
pub enum SortDirection {
    #[default]
    Default,
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Default => "SORTBY_DEFAULT",
            SortDirection::Asc => "SORTBY_ASC",
            SortDirection::Desc => "SORTBY_DESC",
        }
    }
}

/// Placement of NULLs in an ORDER BY item or index element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "bindings", derive(TS))]
#[cfg_attr(feature = "bindings", ts(export))]
pub enum NullsOrder {
    #[default]
    Default,
    First,
    Last,
}

impl NullsOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            NullsOrder::Default => "SORTBY_NULLS_DEFAULT",
            NullsOrder::First => "SORTBY_NULLS_FIRST",
            NullsOrder::Last => "SORTBY_NULLS_LAST",
        }
    }
}

/// ORDER BY item.
pub fn sort_by(expr: impl Into<ExprArg>, direction: SortDirection, nulls: NullsOrder) -> Value {
    Value::tagged(
        "SortBy",
        Value::object([
            ("node", coerce(expr)),
            ("sortby_dir", Value::from(direction.as_str())),
            ("sortby_nulls", Value::from(nulls.as_str())),
        ]),
    )
}

/// Untagged `TypeName` record with integer modifiers (`numeric(10, 2)`).
pub fn type_name(name: &str, modifiers: &[i64]) -> Value {
    type_name_with(name, modifiers.iter().map(|m| val(*m)).collect())
}

fn type_name_with(name: &str, typmods: Vec<Value>) -> Value {
    let mut pairs = vec![("names", name_list(name.split('.')))];
    if !typmods.is_empty() {
        pairs.push(("typmods", Value::from(typmods)));
    }
    pairs.push(("typemod", Value::from(-1)));
    Value::object(pairs)
}

/// Parse a type string such as `text`, `varchar(255)`, `numeric(10, 2)` or
/// `pg_catalog.int8`.
///
/// Modifiers inside the trailing parentheses are split on `,`. Integers become
/// integer constants and anything else a string constant, so the name never
/// carries the parenthesized text.
pub fn parse_type(spec: &str) -> Value {
    let spec = spec.trim();
    let Some((name, rest)) = spec.split_once('(') else {
        return type_name_with(spec, Vec::new());
    };
    let Some(inner) = rest.trim_end().strip_suffix(')') else {
        return type_name_with(spec, Vec::new());
    };
    let typmods = inner
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| match m.parse::<i64>() {
            Ok(number) => val(number),
            Err(_) => val(m),
        })
        .collect();
    type_name_with(name.trim(), typmods)
}

/// Column definition without constraints.
pub fn column_def(name: &str, type_spec: &str) -> Value {
    Value::tagged(
        "ColumnDef",
        Value::object([
            ("colname", Value::from(name)),
            ("typeName", parse_type(type_spec)),
            ("is_local", Value::from(true)),
        ]),
    )
}

/// Index element with default ordering (used by CREATE INDEX and ON CONFLICT).
pub fn index_elem(name: &str) -> Value {
    Value::tagged(
        "IndexElem",
        Value::object([
            ("name", Value::from(name)),
            ("ordering", Value::from(SortDirection::Default.as_str())),
            ("nulls_ordering", Value::from(NullsOrder::Default.as_str())),
        ]),
    )
}

/// Names out of a `ColumnRef` record's fields (stars excluded).
pub fn column_names(attrs: &Value) -> Vec<&str> {
    attrs
        .get("fields")
        .map(Value::items)
        .unwrap_or(&[])
        .iter()
        .filter_map(|f| f.attrs()?.get("sval")?.as_str())
        .collect()
}

//! Expression helpers.
//!
//! Every helper takes [`ExprArg`] operands: the first operand is coerced with
//! [`coerce`] (strings are columns), later operands with [`coerce_right`]
//! (strings are literals). The operator tokens are the ones the deparser
//! matches on structurally and must not change.
//!
//! # Examples
//!
//! ```
//! use pg_ast::expr::{and, eq, gt, is_null};
//!
//! // active = true AND age > 18
//! let filter = and([eq("active", true), gt("age", 18)]).unwrap();
//! assert_eq!(filter.kind(), Some("BoolExpr"));
//!
//! // absent operands are dropped
//! let only = and([None, Some(is_null("deleted_at"))]).unwrap();
//! assert_eq!(only.kind(), Some("NullTest"));
//! ```

use crate::nodes::{coerce, coerce_right, list_node, name_list, ExprArg, IntoNode};
use crate::value::Value;

fn a_expr(kind: &str, op: &str, left: Value, right: Value) -> Value {
    Value::tagged(
        "A_Expr",
        Value::object([
            ("kind", Value::from(kind)),
            ("name", name_list([op])),
            ("lexpr", left),
            ("rexpr", right),
        ]),
    )
}

fn binary(op: &str, left: impl Into<ExprArg>, right: impl Into<ExprArg>) -> Value {
    a_expr("AEXPR_OP", op, coerce(left), coerce_right(right))
}

/// `left = right`
pub fn eq(left: impl Into<ExprArg>, right: impl Into<ExprArg>) -> Value {
    binary("=", left, right)
}

/// `left <> right`
pub fn neq(left: impl Into<ExprArg>, right: impl Into<ExprArg>) -> Value {
    binary("<>", left, right)
}

/// `left > right`
pub fn gt(left: impl Into<ExprArg>, right: impl Into<ExprArg>) -> Value {
    binary(">", left, right)
}

/// `left >= right`
pub fn gte(left: impl Into<ExprArg>, right: impl Into<ExprArg>) -> Value {
    binary(">=", left, right)
}

/// `left < right`
pub fn lt(left: impl Into<ExprArg>, right: impl Into<ExprArg>) -> Value {
    binary("<", left, right)
}

/// `left <= right`
pub fn lte(left: impl Into<ExprArg>, right: impl Into<ExprArg>) -> Value {
    binary("<=", left, right)
}

/// `left + right`
pub fn add(left: impl Into<ExprArg>, right: impl Into<ExprArg>) -> Value {
    binary("+", left, right)
}

/// `left - right`
pub fn sub(left: impl Into<ExprArg>, right: impl Into<ExprArg>) -> Value {
    binary("-", left, right)
}

/// `left * right`
pub fn mul(left: impl Into<ExprArg>, right: impl Into<ExprArg>) -> Value {
    binary("*", left, right)
}

/// `left / right`
pub fn div(left: impl Into<ExprArg>, right: impl Into<ExprArg>) -> Value {
    binary("/", left, right)
}

/// `expr LIKE pattern`
pub fn like(expr: impl Into<ExprArg>, pattern: impl Into<ExprArg>) -> Value {
    a_expr("AEXPR_LIKE", "~~", coerce(expr), coerce_right(pattern))
}

/// `expr ILIKE pattern`
pub fn ilike(expr: impl Into<ExprArg>, pattern: impl Into<ExprArg>) -> Value {
    a_expr("AEXPR_ILIKE", "~~*", coerce(expr), coerce_right(pattern))
}

/// `expr BETWEEN low AND high`
pub fn between(
    expr: impl Into<ExprArg>,
    low: impl Into<ExprArg>,
    high: impl Into<ExprArg>,
) -> Value {
    a_expr(
        "AEXPR_BETWEEN",
        "BETWEEN",
        coerce(expr),
        list_node([coerce_right(low), coerce_right(high)]),
    )
}

/// `expr IN (values...)`
pub fn in_list<I, A>(expr: impl Into<ExprArg>, values: I) -> Value
where
    I: IntoIterator<Item = A>,
    A: Into<ExprArg>,
{
    a_expr(
        "AEXPR_IN",
        "=",
        coerce(expr),
        list_node(values.into_iter().map(coerce_right)),
    )
}

/// `expr NOT IN (values...)`
pub fn not_in_list<I, A>(expr: impl Into<ExprArg>, values: I) -> Value
where
    I: IntoIterator<Item = A>,
    A: Into<ExprArg>,
{
    not(in_list(expr, values))
}

fn bool_expr(op: &str, args: Vec<Value>) -> Value {
    Value::tagged(
        "BoolExpr",
        Value::object([("boolop", Value::from(op)), ("args", Value::list(args))]),
    )
}

fn combine<I, C>(op: &str, conditions: I) -> Option<Value>
where
    I: IntoIterator<Item = C>,
    C: Into<Option<Value>>,
{
    let mut args = Vec::new();
    for condition in conditions.into_iter().filter_map(Into::into) {
        match condition.as_tagged() {
            // flatten nested combinators of the same operator
            Some(("BoolExpr", attrs)) if attrs.get("boolop").and_then(Value::as_str) == Some(op) => {
                args.extend(attrs.get("args").map(Value::items).unwrap_or(&[]).iter().cloned());
            }
            _ => args.push(condition),
        }
    }
    match args.len() {
        0 => None,
        1 => args.pop(),
        _ => Some(bool_expr(op, args)),
    }
}

/// N-ary `AND`. Absent operands are dropped; a single remaining operand is
/// returned as is, and no operands yield `None`.
pub fn and<I, C>(conditions: I) -> Option<Value>
where
    I: IntoIterator<Item = C>,
    C: Into<Option<Value>>,
{
    combine("AND_EXPR", conditions)
}

/// N-ary `OR`, with the same absent-operand rules as [`and`].
pub fn or<I, C>(conditions: I) -> Option<Value>
where
    I: IntoIterator<Item = C>,
    C: Into<Option<Value>>,
{
    combine("OR_EXPR", conditions)
}

/// `NOT expr`
pub fn not(expr: impl Into<ExprArg>) -> Value {
    bool_expr("NOT_EXPR", vec![coerce(expr)])
}

fn null_test(expr: impl Into<ExprArg>, test: &str) -> Value {
    Value::tagged(
        "NullTest",
        Value::object([("arg", coerce(expr)), ("nulltesttype", Value::from(test))]),
    )
}

/// `expr IS NULL`
pub fn is_null(expr: impl Into<ExprArg>) -> Value {
    null_test(expr, "IS_NULL")
}

/// `expr IS NOT NULL`
pub fn is_not_null(expr: impl Into<ExprArg>) -> Value {
    null_test(expr, "IS_NOT_NULL")
}

/// `EXISTS (subquery)`
pub fn exists(subquery: impl IntoNode) -> Value {
    Value::tagged(
        "SubLink",
        Value::object([
            ("subLinkType", Value::from("EXISTS_SUBLINK")),
            ("subselect", subquery.into_node()),
        ]),
    )
}

/// `expr IN (subquery)`
pub fn in_subquery(expr: impl Into<ExprArg>, subquery: impl IntoNode) -> Value {
    Value::tagged(
        "SubLink",
        Value::object([
            ("subLinkType", Value::from("ANY_SUBLINK")),
            ("testexpr", coerce(expr)),
            ("subselect", subquery.into_node()),
        ]),
    )
}

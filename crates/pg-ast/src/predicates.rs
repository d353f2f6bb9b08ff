//! Reusable predicates for [`find`](crate::traversal::find),
//! [`transform`](crate::traversal::transform) and the builder search methods.
//!
//! A predicate receives a node's attribute record and its [`FindContext`].
//!
//! # Examples
//!
//! ```
//! use pg_ast::predicates::{has_column, in_path};
//! use pg_ast::traversal::find_all;
//! use pg_ast::value::Value;
//! use pg_ast::expr::eq;
//!
//! let root = Value::object([("whereClause", eq("active", true))]);
//! let in_where = in_path("whereClause");
//! assert_eq!(find_all(&root, "ColumnRef", Some(&in_where)).len(), 1);
//!
//! let active = has_column("active");
//! assert_eq!(find_all(&root, "A_Expr", Some(&active)).len(), 1);
//! ```

use crate::nodes::column_names;
use crate::traversal::{walk, FindContext};
use crate::value::Value;

/// A type-erased predicate, for the combinators.
pub type BoxedPredicate = Box<dyn Fn(&Value, &FindContext) -> bool + Send + Sync>;

/// Box a predicate so it can be combined with predicates of other types.
pub fn boxed<P>(predicate: P) -> BoxedPredicate
where
    P: Fn(&Value, &FindContext) -> bool + Send + Sync + 'static,
{
    Box::new(predicate)
}

fn names_relation(record: &Value, name: &str) -> bool {
    record.get("relname").and_then(Value::as_str) == Some(name)
}

/// Matches a node that is, or contains, a reference to table `name`.
///
/// Statement target relations are stored untagged under `relation`, so those
/// count as well.
pub fn has_table(name: impl Into<String>) -> impl Fn(&Value, &FindContext) -> bool {
    let name = name.into();
    move |node: &Value, _: &FindContext| {
        if names_relation(node, &name) {
            return true;
        }
        let relation_of = |record: &Value| {
            record
                .get("relation")
                .is_some_and(|relation| names_relation(relation, &name))
        };
        relation_of(node)
            || walk(node).any(|position| match position.kind {
                "RangeVar" => names_relation(position.node, &name),
                _ => relation_of(position.node),
            })
    }
}

fn names_column(record: &Value, name: &str) -> bool {
    let parts = column_names(record);
    parts.contains(&name) || (parts.len() > 1 && parts.join(".") == name)
}

/// Matches a node that is, or contains, a column reference with a name part
/// equal to `name`. A dotted `name` also matches the full qualified reference.
pub fn has_column(name: impl Into<String>) -> impl Fn(&Value, &FindContext) -> bool {
    let name = name.into();
    move |node: &Value, _: &FindContext| {
        names_column(node, &name)
            || walk(node)
                .any(|position| position.kind == "ColumnRef" && names_column(position.node, &name))
    }
}

/// Matches a `ColumnRef` record containing `*` (`*` or `table.*`).
pub fn is_star(node: &Value, _: &FindContext) -> bool {
    node.get("fields")
        .map(Value::items)
        .unwrap_or(&[])
        .iter()
        .any(|field| field.kind() == Some("A_Star"))
}

/// Matches positions below field `field`, at any depth.
pub fn in_path(field: impl Into<String>) -> impl Fn(&Value, &FindContext) -> bool {
    let field = field.into();
    move |_: &Value, context: &FindContext| context.path_contains(&field)
}

/// Matches when every predicate matches. An empty list always matches.
pub fn all_of(predicates: Vec<BoxedPredicate>) -> impl Fn(&Value, &FindContext) -> bool {
    move |node: &Value, context: &FindContext| predicates.iter().all(|p| p(node, context))
}

/// Matches when any predicate matches. An empty list never matches.
pub fn any_of(predicates: Vec<BoxedPredicate>) -> impl Fn(&Value, &FindContext) -> bool {
    move |node: &Value, context: &FindContext| predicates.iter().any(|p| p(node, context))
}

pub fn negate<P>(predicate: P) -> impl Fn(&Value, &FindContext) -> bool
where
    P: Fn(&Value, &FindContext) -> bool,
{
    move |node: &Value, context: &FindContext| !predicate(node, context)
}

//! Statement builders.
//!
//! Every builder wraps one attribute record (or a parse result root) in a
//! [`Query`] and is immutable: each mutator returns a new builder, and the
//! receiver keeps its tree. Untouched subtrees are shared between the two.
//!
//! - **[`Builder`]** is the common surface: search ([`Builder::find`],
//!   [`Builder::find_all`], [`Builder::has`]), rewrite
//!   ([`Builder::transform`], [`Builder::transform_all`], [`Builder::patch`])
//!   and deparse ([`Builder::to_sql`]).
//! - **Starters** ([`select`], [`insert`], [`update`], [`delete_from`],
//!   [`create_table`], [`alter_table`], [`create_index`]) return the
//!   specialized builders with a minimal statement skeleton.
//! - **[`AnyBuilder`]** is what searches return: the matched node, wrapped in
//!   the builder of its kind (see [`factory::create`]).
//!
//! Mutators come in two forms: a value form (`where_`, `from`, ...) that
//! AND-combines, appends or overwrites, and a callback form (`where_with`,
//! `from_with`, ...) that receives the current clause and returns its
//! replacement.
//!
//! # Examples
//!
//! ```
//! use pg_ast::builder::*;
//! use pg_ast::expr::{eq, gt};
//!
//! // SELECT id, name FROM users WHERE active = true AND age > 18 LIMIT 10
//! let query = select(["id", "name"])
//!     .from("users")
//!     .where_(eq("active", true))
//!     .where_(gt("age", 18))
//!     .limit(10);
//!
//! assert!(query.has("RangeVar"));
//! assert_eq!(query.where_clause().and_then(|w| w.kind()), Some("BoolExpr"));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::expr;
use crate::nodes::IntoNode;
use crate::parser::{is_parse_result, parse_result, statements, Parser};
use crate::traversal::{self, FindContext, Predicate};
use crate::value::Value;

pub mod alter_table;
pub mod constraints;
pub mod create_index;
pub mod create_table;
pub mod delete;
pub mod factory;
pub mod insert;
pub mod select;
pub mod update;

pub use alter_table::{alter_table, AlterTableBuilder};
pub use constraints::{AlterColumn, ColumnConstraints};
pub use create_index::{create_index, CreateIndexBuilder};
pub use create_table::{create_table, CreateTableBuilder};
pub use delete::{delete_from, DeleteBuilder};
pub use factory::{create, detect_statement_kind, AnyBuilder, StatementKind};
pub use insert::{insert, InsertBuilder, OnConflict};
pub use select::{select, JoinType, SelectBuilder};
pub use update::{update, UpdateBuilder};

/// The generic builder: an attribute record (or parse result root), its kind
/// when known, and the parser handle used by [`Builder::to_sql`].
#[derive(Clone)]
pub struct Query {
    node: Value,
    kind: Option<String>,
    parser: Option<Arc<dyn Parser>>,
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("kind", &self.kind)
            .field("node", &self.node)
            .field("parser", &self.parser.as_ref().map(|_| "<bound>"))
            .finish()
    }
}

impl Query {
    pub fn new(node: Value, kind: Option<String>, parser: Option<Arc<dyn Parser>>) -> Self {
        Query { node, kind, parser }
    }

    pub(crate) fn of_kind(kind: &str, node: Value) -> Self {
        Query::new(node, Some(kind.to_string()), None)
    }

    pub(crate) fn with_node(&self, node: Value) -> Query {
        Query {
            node,
            kind: self.kind.clone(),
            parser: self.parser.clone(),
        }
    }

    pub(crate) fn set(&self, key: &str, value: Value) -> Query {
        self.with_node(self.node.with(key, value))
    }

    pub(crate) fn unset(&self, key: &str) -> Query {
        self.with_node(self.node.without(key))
    }

    /// Set or clear an optional field.
    pub(crate) fn set_opt(&self, key: &str, value: Option<Value>) -> Query {
        match value {
            Some(value) => self.set(key, value),
            None => self.unset(key),
        }
    }

    pub(crate) fn items(&self, key: &str) -> Vec<Value> {
        self.node.get(key).map(Value::items).unwrap_or(&[]).to_vec()
    }

    /// Replace a list field. An empty list removes the field, as the parser
    /// never emits empty lists.
    pub(crate) fn set_list(&self, key: &str, items: Vec<Value>) -> Query {
        if items.is_empty() {
            self.unset(key)
        } else {
            self.set(key, Value::from(items))
        }
    }

    pub(crate) fn append<I: IntoIterator<Item = Value>>(&self, key: &str, items: I) -> Query {
        let mut list = self.items(key);
        list.extend(items);
        self.set_list(key, list)
    }

    pub(crate) fn map_list<F>(&self, key: &str, f: F) -> Query
    where
        F: FnOnce(Vec<Value>) -> Vec<Value>,
    {
        self.set_list(key, f(self.items(key)))
    }

    pub(crate) fn map_opt<F>(&self, key: &str, f: F) -> Query
    where
        F: FnOnce(Option<Value>) -> Option<Value>,
    {
        self.set_opt(key, f(self.node.get(key).cloned()))
    }

    /// AND-combine `condition` into an optional clause.
    pub(crate) fn and_where(&self, key: &str, condition: Value) -> Query {
        let combined = expr::and([self.node.get(key).cloned(), Some(condition)]);
        self.set_opt(key, combined)
    }

    fn statement_kind(&self) -> Option<String> {
        self.kind
            .clone()
            .or_else(|| detect_statement_kind(&self.node).map(|k| k.name().to_string()))
    }

    fn deparse(&self, parser: &dyn Parser) -> Result<String> {
        if is_parse_result(&self.node) {
            tracing::debug!(
                statements = statements(&self.node).len(),
                "deparsing parse result"
            );
            return Ok(parser.deparse(&self.node)?);
        }
        match self.statement_kind() {
            Some(kind) if kind.ends_with("Stmt") => {
                tracing::debug!(kind = %kind, "deparsing statement");
                let shell = parse_result([Value::tagged(&kind, self.node.clone())]);
                Ok(parser.deparse(&shell)?)
            }
            Some(kind) => {
                tracing::debug!(kind = %kind, "deparsing fragment");
                Ok(parser.deparse_node(&Value::tagged(&kind, self.node.clone()))?)
            }
            None => Err(Error::UnknownStatement),
        }
    }
}

impl IntoNode for Query {
    /// The tagged node, or the raw value when the kind is unknown.
    fn into_node(self) -> Value {
        match self.kind {
            Some(kind) => Value::tagged(&kind, self.node),
            None => self.node,
        }
    }
}

impl IntoNode for &Query {
    fn into_node(self) -> Value {
        self.clone().into_node()
    }
}

/// The surface shared by [`Query`], the statement builders and [`AnyBuilder`].
pub trait Builder: Sized {
    fn query(&self) -> &Query;

    fn from_query(query: Query) -> Self;

    /// The wrapped attribute record (or parse result root).
    fn node(&self) -> &Value {
        &self.query().node
    }

    /// The explicit node kind, if known.
    fn kind(&self) -> Option<&str> {
        self.query().kind.as_deref()
    }

    fn parser(&self) -> Option<&Arc<dyn Parser>> {
        self.query().parser.as_ref()
    }

    /// A copy bound to `parser`.
    fn with_parser(&self, parser: Arc<dyn Parser>) -> Self {
        let query = self.query();
        Self::from_query(Query {
            node: query.node.clone(),
            kind: query.kind.clone(),
            parser: Some(parser),
        })
    }

    /// First node of `kind` in document order, as a detached builder.
    fn find(&self, kind: &str) -> Option<AnyBuilder> {
        search(self, kind, None)
    }

    fn find_where<P>(&self, kind: &str, predicate: P) -> Option<AnyBuilder>
    where
        P: Fn(&Value, &FindContext) -> bool,
    {
        search(self, kind, Some(&predicate))
    }

    /// Every node of `kind` in document order, including nested ones.
    fn find_all(&self, kind: &str) -> Vec<AnyBuilder> {
        search_all(self, kind, None)
    }

    fn find_all_where<P>(&self, kind: &str, predicate: P) -> Vec<AnyBuilder>
    where
        P: Fn(&Value, &FindContext) -> bool,
    {
        search_all(self, kind, Some(&predicate))
    }

    fn has(&self, kind: &str) -> bool {
        traversal::has(self.node(), kind, None)
    }

    fn has_where<P>(&self, kind: &str, predicate: P) -> bool
    where
        P: Fn(&Value, &FindContext) -> bool,
    {
        traversal::has(self.node(), kind, Some(&predicate))
    }

    /// Rewrite the first node of `kind`. The result has the receiver's type.
    fn transform<F, R>(&self, kind: &str, f: F) -> Result<Self>
    where
        F: FnMut(AnyBuilder) -> Result<R>,
        R: IntoNode,
    {
        rewrite(self, kind, None, f, true)
    }

    fn transform_where<P, F, R>(&self, kind: &str, predicate: P, f: F) -> Result<Self>
    where
        P: Fn(&Value, &FindContext) -> bool,
        F: FnMut(AnyBuilder) -> Result<R>,
        R: IntoNode,
    {
        rewrite(self, kind, Some(&predicate), f, true)
    }

    /// Rewrite every node of `kind` in one pass.
    fn transform_all<F, R>(&self, kind: &str, f: F) -> Result<Self>
    where
        F: FnMut(AnyBuilder) -> Result<R>,
        R: IntoNode,
    {
        rewrite(self, kind, None, f, false)
    }

    fn transform_all_where<P, F, R>(&self, kind: &str, predicate: P, f: F) -> Result<Self>
    where
        P: Fn(&Value, &FindContext) -> bool,
        F: FnMut(AnyBuilder) -> Result<R>,
        R: IntoNode,
    {
        rewrite(self, kind, Some(&predicate), f, false)
    }

    /// Shallow-merge top-level attributes.
    fn patch<I, K>(&self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let query = self.query();
        Self::from_query(query.with_node(query.node.merged(pairs)))
    }

    /// Deparse with the bound parser.
    fn to_sql(&self) -> Result<String> {
        let parser = self.parser().ok_or(Error::NoParser)?;
        self.to_sql_with(parser.as_ref())
    }

    /// Deparse with an explicit parser, ignoring the bound one.
    fn to_sql_with(&self, parser: &dyn Parser) -> Result<String> {
        self.query().deparse(parser)
    }
}

fn search<B: Builder>(builder: &B, kind: &str, predicate: Option<Predicate<'_>>) -> Option<AnyBuilder> {
    traversal::find(builder.node(), kind, predicate)
        .map(|found| create(&found.kind, found.node, builder.parser().cloned()))
}

fn search_all<B: Builder>(builder: &B, kind: &str, predicate: Option<Predicate<'_>>) -> Vec<AnyBuilder> {
    traversal::find_all(builder.node(), kind, predicate)
        .into_iter()
        .map(|found| create(&found.kind, found.node, builder.parser().cloned()))
        .collect()
}

fn rewrite<B, F, R>(
    builder: &B,
    kind: &str,
    predicate: Option<Predicate<'_>>,
    mut f: F,
    first_only: bool,
) -> Result<B>
where
    B: Builder,
    F: FnMut(AnyBuilder) -> Result<R>,
    R: IntoNode,
{
    let parser = builder.parser().cloned();
    let root = traversal::transform(
        builder.node(),
        kind,
        predicate,
        |_, attrs, _| Ok(f(create(kind, attrs.clone(), parser.clone()))?.into_node()),
        first_only,
    )?;
    Ok(B::from_query(builder.query().with_node(root)))
}

impl Builder for Query {
    fn query(&self) -> &Query {
        self
    }

    fn from_query(query: Query) -> Self {
        query
    }
}

/// Implements [`Builder`] and [`IntoNode`] for a builder newtype over
/// [`Query`].
macro_rules! impl_builder {
    ($($ty:ident),* $(,)?) => {$(
        impl $crate::builder::Builder for $ty {
            fn query(&self) -> &$crate::builder::Query {
                &self.query
            }

            fn from_query(query: $crate::builder::Query) -> Self {
                $ty { query }
            }
        }

        impl $crate::nodes::IntoNode for $ty {
            fn into_node(self) -> $crate::value::Value {
                $crate::nodes::IntoNode::into_node(self.query)
            }
        }

        impl $crate::nodes::IntoNode for &$ty {
            fn into_node(self) -> $crate::value::Value {
                $crate::nodes::IntoNode::into_node(&self.query)
            }
        }
    )*};
}

pub(crate) use impl_builder;

//! Tree traversal utilities for parse trees.
//!
//! This module provides read-only walking and immutable rewriting over
//! [`Value`] trees. Node kinds are discovered structurally (see
//! [`Value::as_tagged`]), so no traversal code is specific to any node kind:
//!
//! - [`DfsIter`] / [`walk`]: pre-order iterator over every tagged position,
//!   carrying a [`FindContext`] with the ancestry of that position.
//! - [`find`], [`find_all`], [`has`], [`count`]: search by kind and optional
//!   predicate, built on [`walk`].
//! - [`transform`]: path-copying rewrite of matching positions. Subtrees that
//!   contain no match are shared with the input by pointer.
//! - [`visit`]: callback dispatch by kind, side effects only.
//!
//! Matches never stop descent: a `SelectStmt` inside a `SelectStmt` (subquery,
//! CTE body, set operation arm) is found as well.

use std::collections::HashMap;

use crate::error::Result;
use crate::value::{Fields, Value};

/// One step of the ancestry path from the root to a position
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Field name on an attribute record or plain object
    Field(String),
    /// Position inside a list
    Index(usize),
}

/// Where a position sits in the tree being traversed.
///
/// Contexts are produced fresh for every traversal call and are only meant to
/// be consumed by predicates and callbacks during that call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindContext {
    /// Index inside the enclosing list, if the position is a list element
    pub index: Option<usize>,
    /// The container holding the position: an attribute record or a list.
    /// `None` at the root.
    pub parent: Option<Value>,
    /// Field name that led here. List elements inherit the field that held
    /// the list.
    pub key: Option<String>,
    /// Field names and indices from the root. Kind tags are not path entries.
    pub path: Vec<PathSegment>,
}

impl FindContext {
    /// Returns `true` if `field` appears anywhere on the path.
    pub fn path_contains(&self, field: &str) -> bool {
        self.path
            .iter()
            .any(|segment| matches!(segment, PathSegment::Field(name) if name == field))
    }

    /// Nesting depth, counted in path entries.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    fn field(&self, parent: &Value, key: &str) -> FindContext {
        let mut path = self.path.clone();
        path.push(PathSegment::Field(key.to_string()));
        FindContext {
            index: None,
            parent: Some(parent.clone()),
            key: Some(key.to_string()),
            path,
        }
    }

    fn element(&self, parent: &Value, index: usize) -> FindContext {
        let mut path = self.path.clone();
        path.push(PathSegment::Index(index));
        FindContext {
            index: Some(index),
            parent: Some(parent.clone()),
            key: self.key.clone(),
            path,
        }
    }
}

/// Caller-supplied filter over a node's attribute record and its context
pub type Predicate<'a> = &'a dyn Fn(&Value, &FindContext) -> bool;

/// A tagged position yielded by [`DfsIter`]
#[derive(Debug, Clone)]
pub struct Position<'a> {
    pub kind: &'a str,
    /// The attribute record
    pub node: &'a Value,
    /// The tagged node itself (`{kind: node}`)
    pub wrapped: &'a Value,
    pub context: FindContext,
}

impl Position<'_> {
    fn matches(&self, kind: &str, predicate: Option<Predicate<'_>>) -> bool {
        self.kind == kind && predicate.map_or(true, |p| p(self.node, &self.context))
    }

    /// Detach into an owned [`Match`]. Only reference counts are touched.
    pub fn to_match(&self) -> Match {
        Match {
            kind: self.kind.to_string(),
            node: self.node.clone(),
            wrapped: self.wrapped.clone(),
            context: self.context.clone(),
        }
    }
}

/// A search result
#[derive(Debug, Clone)]
pub struct Match {
    pub kind: String,
    pub node: Value,
    pub wrapped: Value,
    pub context: FindContext,
}

struct Frame<'a> {
    value: &'a Value,
    context: FindContext,
}

/// Pre-order depth-first iterator over the tagged positions of a tree.
///
/// Every field of every object and every element of every list is visited
/// in document order; scalars and `null` end descent. Untagged objects and
/// lists are walked through but never yielded.
///
/// Created via [`walk`] or [`DfsIter::new`].
pub struct DfsIter<'a> {
    stack: Vec<Frame<'a>>,
}

impl<'a> DfsIter<'a> {
    /// Create a new DFS iterator starting from the given root
    pub fn new(root: &'a Value) -> Self {
        Self {
            stack: vec![Frame {
                value: root,
                context: FindContext::default(),
            }],
        }
    }

    fn push_children(&mut self, container: &'a Value, context: &FindContext) {
        // Add children in reverse order so they come out in forward order
        match container {
            Value::Object(fields) => {
                let children: Vec<_> = fields.iter().filter(|(_, v)| is_branch(v)).collect();
                for (key, child) in children.into_iter().rev() {
                    self.stack.push(Frame {
                        value: child,
                        context: context.field(container, key),
                    });
                }
            }
            Value::List(items) => {
                for (index, child) in items.iter().enumerate().rev() {
                    if is_branch(child) {
                        self.stack.push(Frame {
                            value: child,
                            context: context.element(container, index),
                        });
                    }
                }
            }
            _ => {}
        }
    }
}

impl<'a> Iterator for DfsIter<'a> {
    type Item = Position<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Frame { value, context } = self.stack.pop()?;
            match value.as_tagged() {
                Some((kind, attrs)) => {
                    self.push_children(attrs, &context);
                    return Some(Position {
                        kind,
                        node: attrs,
                        wrapped: value,
                        context,
                    });
                }
                None => self.push_children(value, &context),
            }
        }
    }
}

fn is_branch(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::List(_))
}

/// Walk every tagged position under `root`, depth-first, pre-order.
pub fn walk(root: &Value) -> DfsIter<'_> {
    DfsIter::new(root)
}

/// All positions of `kind` (optionally filtered) in document order.
pub fn find_all(root: &Value, kind: &str, predicate: Option<Predicate<'_>>) -> Vec<Match> {
    walk(root)
        .filter(|position| position.matches(kind, predicate))
        .map(|position| position.to_match())
        .collect()
}

/// The first position of `kind` in document order. Stops at the first match.
pub fn find(root: &Value, kind: &str, predicate: Option<Predicate<'_>>) -> Option<Match> {
    walk(root)
        .find(|position| position.matches(kind, predicate))
        .map(|position| position.to_match())
}

/// Returns `true` if at least one position matches.
pub fn has(root: &Value, kind: &str, predicate: Option<Predicate<'_>>) -> bool {
    walk(root).any(|position| position.matches(kind, predicate))
}

/// Number of matching positions.
pub fn count(root: &Value, kind: &str, predicate: Option<Predicate<'_>>) -> usize {
    walk(root)
        .filter(|position| position.matches(kind, predicate))
        .count()
}

struct Rewriter<'p, F> {
    kind: &'p str,
    predicate: Option<Predicate<'p>>,
    rewrite: F,
    first_only: bool,
    matched: usize,
}

impl<F> Rewriter<'_, F>
where
    F: FnMut(&Value, &Value, &FindContext) -> Result<Value>,
{
    fn done(&self) -> bool {
        self.first_only && self.matched > 0
    }

    fn position(&mut self, value: &Value, context: FindContext) -> Result<Value> {
        if self.done() {
            return Ok(value.clone());
        }
        match value.as_tagged() {
            Some((kind, attrs)) => {
                if kind == self.kind && self.predicate.map_or(true, |p| p(attrs, &context)) {
                    self.matched += 1;
                    // the replacement is final for this position
                    return (self.rewrite)(value, attrs, &context);
                }
                let rebuilt = self.children(attrs, &context)?;
                if Value::ptr_eq(&rebuilt, attrs) {
                    Ok(value.clone())
                } else {
                    Ok(Value::tagged(kind, rebuilt))
                }
            }
            None => self.children(value, &context),
        }
    }

    fn children(&mut self, container: &Value, context: &FindContext) -> Result<Value> {
        match container {
            Value::Object(fields) => {
                let mut rebuilt: Option<Fields> = None;
                for (position, (key, child)) in fields.iter().enumerate() {
                    if !is_branch(child) {
                        continue;
                    }
                    let replaced = self.position(child, context.field(container, key))?;
                    if !Value::ptr_eq(&replaced, child) {
                        rebuilt
                            .get_or_insert_with(|| (**fields).clone())
                            .set_at(position, replaced);
                    }
                }
                Ok(rebuilt.map_or_else(|| container.clone(), Value::from))
            }
            Value::List(items) => {
                let mut rebuilt: Option<Vec<Value>> = None;
                for (index, child) in items.iter().enumerate() {
                    if !is_branch(child) {
                        continue;
                    }
                    let replaced = self.position(child, context.element(container, index))?;
                    if !Value::ptr_eq(&replaced, child) {
                        rebuilt.get_or_insert_with(|| (**items).clone())[index] = replaced;
                    }
                }
                Ok(rebuilt.map_or_else(|| container.clone(), Value::from))
            }
            _ => Ok(container.clone()),
        }
    }
}

/// Rewrites matching positions, returning a new root.
///
/// `rewrite` receives `(wrapped, attrs, context)` for each match and returns
/// the replacement tagged node. Only the path from the root to a replaced
/// position is rebuilt; everything else is shared with `root`, and a walk with
/// no matches returns `root` itself. Replacements are not searched again. With
/// `first_only`, only the first match in document order is rewritten.
///
/// An error from `rewrite` aborts the walk and is returned as is.
///
/// # Example
///
/// ```
/// use pg_ast::nodes::table;
/// use pg_ast::traversal::transform;
/// use pg_ast::value::Value;
///
/// let root = Value::list([table("users"), table("posts")]);
/// let renamed = transform(&root, "RangeVar", None, |_, attrs, _| {
///     let name = attrs.get("relname").and_then(Value::as_str).unwrap_or_default();
///     Ok(Value::tagged("RangeVar", attrs.with("relname", format!("app_{name}").into())))
/// }, false)?;
/// assert_eq!(renamed.items()[1].attrs().unwrap().get("relname").unwrap().as_str(), Some("app_posts"));
/// # Ok::<(), pg_ast::Error>(())
/// ```
pub fn transform<F>(
    root: &Value,
    kind: &str,
    predicate: Option<Predicate<'_>>,
    rewrite: F,
    first_only: bool,
) -> Result<Value>
where
    F: FnMut(&Value, &Value, &FindContext) -> Result<Value>,
{
    let mut rewriter = Rewriter {
        kind,
        predicate,
        rewrite,
        first_only,
        matched: 0,
    };
    let result = rewriter.position(root, FindContext::default())?;
    tracing::trace!(kind, matched = rewriter.matched, first_only, "transform finished");
    Ok(result)
}

type Callback<'a> = Box<dyn FnMut(&Value, &FindContext) + 'a>;

/// Kind-keyed callbacks for [`visit`]
#[derive(Default)]
pub struct Visitor<'a> {
    callbacks: HashMap<String, Callback<'a>>,
}

impl<'a> Visitor<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the callback for `kind`, replacing any earlier one.
    pub fn on<F>(mut self, kind: &str, callback: F) -> Self
    where
        F: FnMut(&Value, &FindContext) + 'a,
    {
        self.callbacks.insert(kind.to_string(), Box::new(callback));
        self
    }
}

/// Invoke the registered callback of every tagged position's kind with the
/// attribute record and context, in document order.
///
/// # Example
///
/// ```
/// use pg_ast::nodes::table;
/// use pg_ast::traversal::{visit, Visitor};
/// use pg_ast::value::Value;
///
/// let root = Value::list([table("users"), table("posts")]);
/// let mut tables = Vec::new();
/// let mut visitor = Visitor::new().on("RangeVar", |attrs, _| {
///     if let Some(name) = attrs.get("relname").and_then(Value::as_str) {
///         tables.push(name.to_string());
///     }
/// });
/// visit(&root, &mut visitor);
/// drop(visitor);
/// assert_eq!(tables, ["users", "posts"]);
/// ```
pub fn visit(root: &Value, visitor: &mut Visitor<'_>) {
    if visitor.callbacks.is_empty() {
        return;
    }
    for position in walk(root) {
        if let Some(callback) = visitor.callbacks.get_mut(position.kind) {
            callback(position.node, &position.context);
        }
    }
}

//! Column constraint and ALTER COLUMN accumulators.
//!
//! Both are plain values: every method takes `&self` and returns a new
//! accumulator, so two chains started from the same state never see each
//! other's additions.

use crate::error::{Error, Result};
use crate::nodes::{coerce_right, name_list, relation, ExprArg};
use crate::value::Value;

pub(crate) fn constraint(contype: &str, extra: Vec<(&str, Value)>) -> Value {
    let mut attrs = vec![("contype", Value::from(contype))];
    attrs.extend(extra);
    Value::tagged("Constraint", Value::object(attrs))
}

pub(crate) fn keyed_constraint<I, S>(contype: &str, columns: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    constraint(contype, vec![("keys", name_list(columns))])
}

pub(crate) fn check_constraint(condition: Value) -> Value {
    constraint(
        "CONSTR_CHECK",
        vec![("raw_expr", condition), ("initially_valid", Value::from(true))],
    )
}

/// `FOREIGN KEY`/`REFERENCES` constraint. Without `local_columns` it is the
/// column-level form.
pub(crate) fn foreign_key_constraint(
    local_columns: Option<Value>,
    table: &str,
    columns: Value,
) -> Value {
    let mut attrs = vec![("pktable", relation(table))];
    if let Some(local) = local_columns {
        attrs.push(("fk_attrs", local));
    }
    attrs.extend([
        ("pk_attrs", columns),
        ("fk_matchtype", Value::from("s")),
        ("fk_upd_action", Value::from("a")),
        ("fk_del_action", Value::from("a")),
        ("initially_valid", Value::from(true)),
    ]);
    constraint("CONSTR_FOREIGN", attrs)
}

/// Constraints of one column definition.
///
/// # Examples
///
/// ```
/// use pg_ast::builder::ColumnConstraints;
///
/// let base = ColumnConstraints::new().not_null();
/// let primary = base.primary_key();
/// let unique = base.unique();
/// assert_eq!(base.constraints().len(), 1);
/// assert_eq!(primary.constraints().len(), 2);
/// assert_eq!(unique.constraints().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnConstraints {
    constraints: Vec<Value>,
}

impl ColumnConstraints {
    pub fn new() -> Self {
        ColumnConstraints {
            constraints: Vec::new(),
        }
    }

    pub(crate) fn from_existing(constraints: Vec<Value>) -> Self {
        ColumnConstraints { constraints }
    }

    fn push(&self, constraint: Value) -> Self {
        let mut constraints = self.constraints.clone();
        constraints.push(constraint);
        ColumnConstraints { constraints }
    }

    pub fn not_null(&self) -> Self {
        self.push(constraint("CONSTR_NOTNULL", Vec::new()))
    }

    pub fn primary_key(&self) -> Self {
        self.push(constraint("CONSTR_PRIMARY", Vec::new()))
    }

    pub fn unique(&self) -> Self {
        self.push(constraint("CONSTR_UNIQUE", Vec::new()))
    }

    /// `DEFAULT expr`. Strings are literals; pass a node such as
    /// `func("now", ..)` for an expression.
    pub fn default(&self, expr: impl Into<ExprArg>) -> Self {
        self.push(constraint("CONSTR_DEFAULT", vec![("raw_expr", coerce_right(expr))]))
    }

    /// `REFERENCES table (column)`
    pub fn references(&self, table: &str, column: &str) -> Self {
        self.push(foreign_key_constraint(None, table, name_list([column])))
    }

    pub fn check(&self, condition: Value) -> Self {
        self.push(check_constraint(condition))
    }

    pub fn constraints(&self) -> &[Value] {
        &self.constraints
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub(crate) fn into_constraints(self) -> Vec<Value> {
        self.constraints
    }
}

/// `ALTER COLUMN` subcommands for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct AlterColumn {
    column: String,
    commands: Vec<Value>,
}

impl AlterColumn {
    pub(crate) fn new(column: &str) -> Self {
        AlterColumn {
            column: column.to_string(),
            commands: Vec::new(),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    fn push(&self, subtype: &str) -> Self {
        let mut commands = self.commands.clone();
        commands.push(alter_table_cmd(subtype, Some(&self.column), None));
        AlterColumn {
            column: self.column.clone(),
            commands,
        }
    }

    pub fn set_not_null(&self) -> Self {
        self.push("AT_SetNotNull")
    }

    pub fn drop_not_null(&self) -> Self {
        self.push("AT_DropNotNull")
    }

    /// Always fails: a column rename is a separate statement kind
    /// (`RenameStmt`) that this builder does not produce.
    pub fn rename(&self, new_name: &str) -> Result<Self> {
        Err(Error::unsupported(format!(
            "renaming column {} to {new_name} needs a RenameStmt",
            self.column
        )))
    }

    pub fn commands(&self) -> &[Value] {
        &self.commands
    }

    pub(crate) fn into_commands(self) -> Vec<Value> {
        self.commands
    }
}

pub(crate) fn alter_table_cmd(subtype: &str, name: Option<&str>, def: Option<Value>) -> Value {
    let mut attrs = vec![("subtype", Value::from(subtype))];
    if let Some(name) = name {
        attrs.push(("name", Value::from(name)));
    }
    if let Some(def) = def {
        attrs.push(("def", def));
    }
    attrs.push(("behavior", Value::from("DROP_RESTRICT")));
    Value::tagged("AlterTableCmd", Value::object(attrs))
}

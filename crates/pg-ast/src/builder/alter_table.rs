//! ALTER TABLE builder.

use super::constraints::alter_table_cmd;
use super::{impl_builder, AlterColumn, ColumnConstraints, Query};
use crate::error::{Error, Result};
use crate::nodes::{column_def, IntoRelation};
use crate::value::Value;

const KIND: &str = "AlterTableStmt";

/// Fluent builder for ALTER TABLE statements. Each mutator appends one or
/// more subcommands.
#[derive(Debug, Clone)]
pub struct AlterTableBuilder {
    query: Query,
}

impl_builder!(AlterTableBuilder);

/// Start an ALTER TABLE of `table`.
///
/// # Examples
///
/// ```
/// use pg_ast::builder::alter_table;
///
/// // ALTER TABLE users ADD COLUMN age int NOT NULL, ALTER COLUMN email DROP NOT NULL
/// let stmt = alter_table("users")
///     .add_column_with("age", "int", |c| c.not_null())
///     .alter_column("email", |c| Ok(c.drop_not_null()))?;
/// assert_eq!(stmt.commands().len(), 2);
/// # Ok::<(), pg_ast::Error>(())
/// ```
pub fn alter_table(table: impl IntoRelation) -> AlterTableBuilder {
    AlterTableBuilder {
        query: Query::of_kind(
            KIND,
            Value::object([
                ("relation", table.into_relation()),
                ("objtype", Value::from("OBJECT_TABLE")),
            ]),
        ),
    }
}

impl AlterTableBuilder {
    fn map(&self, f: impl FnOnce(&Query) -> Query) -> Self {
        AlterTableBuilder {
            query: f(&self.query),
        }
    }

    fn push<I: IntoIterator<Item = Value>>(&self, commands: I) -> Self {
        self.map(|q| q.append("cmds", commands))
    }

    pub fn add_column(&self, name: &str, type_spec: &str) -> Self {
        self.add_column_with(name, type_spec, |c| c)
    }

    /// `ADD COLUMN` with constraints built by `f`.
    pub fn add_column_with<F>(&self, name: &str, type_spec: &str, f: F) -> Self
    where
        F: FnOnce(ColumnConstraints) -> ColumnConstraints,
    {
        let constraints = f(ColumnConstraints::new());
        let mut definition = column_def(name, type_spec);
        if !constraints.is_empty() {
            if let Some(attrs) = definition.attrs() {
                let attrs = attrs.with("constraints", Value::from(constraints.into_constraints()));
                definition = Value::tagged("ColumnDef", attrs);
            }
        }
        self.push([alter_table_cmd("AT_AddColumn", None, Some(definition))])
    }

    pub fn drop_column(&self, name: &str) -> Self {
        self.push([alter_table_cmd("AT_DropColumn", Some(name), None)])
    }

    /// `ALTER COLUMN name ...` with the subcommands built by `f`.
    pub fn alter_column<F>(&self, name: &str, f: F) -> Result<Self>
    where
        F: FnOnce(AlterColumn) -> Result<AlterColumn>,
    {
        let commands = f(AlterColumn::new(name))?.into_commands();
        if commands.is_empty() {
            tracing::debug!(column = name, "alter_column: no subcommands added");
        }
        Ok(self.push(commands))
    }

    /// `ADD` a table constraint node (see `Constraint`).
    pub fn add_constraint(&self, constraint: Value) -> Self {
        self.push([alter_table_cmd("AT_AddConstraint", None, Some(constraint))])
    }

    pub fn drop_constraint(&self, name: &str) -> Self {
        self.push([alter_table_cmd("AT_DropConstraint", Some(name), None)])
    }

    /// `IF EXISTS`
    pub fn if_exists(&self) -> Self {
        self.map(|q| q.set("missing_ok", Value::from(true)))
    }

    /// Always fails: renames are a different statement kind (`RenameStmt`).
    pub fn rename_column(&self, from: &str, to: &str) -> Result<Self> {
        Err(Error::unsupported(format!(
            "renaming column {from} to {to} needs a RenameStmt"
        )))
    }

    /// Always fails: renames are a different statement kind (`RenameStmt`).
    pub fn rename_to(&self, name: &str) -> Result<Self> {
        Err(Error::unsupported(format!(
            "renaming table to {name} needs a RenameStmt"
        )))
    }

    pub fn commands(&self) -> &[Value] {
        self.query.node.get("cmds").map(Value::items).unwrap_or(&[])
    }
}

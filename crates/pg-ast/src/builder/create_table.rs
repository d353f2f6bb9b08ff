//! CREATE TABLE builder.

use super::constraints::{check_constraint, foreign_key_constraint, keyed_constraint};
use super::{impl_builder, ColumnConstraints, Query};
use crate::nodes::{column_def, name_list, IntoRelation};
use crate::value::Value;

const KIND: &str = "CreateStmt";

/// Fluent builder for CREATE TABLE statements.
#[derive(Debug, Clone)]
pub struct CreateTableBuilder {
    query: Query,
}

impl_builder!(CreateTableBuilder);

/// Start a CREATE TABLE for `table`.
///
/// # Examples
///
/// ```
/// use pg_ast::builder::create_table;
///
/// // CREATE TABLE users (id serial PRIMARY KEY, email text NOT NULL UNIQUE)
/// let stmt = create_table("users")
///     .column_with("id", "serial", |c| c.primary_key())
///     .column_with("email", "text", |c| c.not_null().unique());
/// assert_eq!(stmt.column_names(), vec!["id", "email"]);
/// ```
pub fn create_table(table: impl IntoRelation) -> CreateTableBuilder {
    CreateTableBuilder {
        query: Query::of_kind(
            KIND,
            Value::object([
                ("relation", table.into_relation()),
                ("oncommit", Value::from("ONCOMMIT_NOOP")),
            ]),
        ),
    }
}

fn column_name(element: &Value) -> Option<&str> {
    match element.as_tagged()? {
        ("ColumnDef", attrs) => attrs.get("colname")?.as_str(),
        _ => None,
    }
}

fn with_constraints(definition: Value, constraints: ColumnConstraints) -> Value {
    let Some(attrs) = definition.attrs() else {
        return definition;
    };
    let attrs = if constraints.is_empty() {
        attrs.without("constraints")
    } else {
        attrs.with("constraints", Value::from(constraints.into_constraints()))
    };
    Value::tagged("ColumnDef", attrs)
}

impl CreateTableBuilder {
    fn map(&self, f: impl FnOnce(&Query) -> Query) -> Self {
        CreateTableBuilder {
            query: f(&self.query),
        }
    }

    /// Put a column definition in place of the column with the same name, or
    /// append it. Names match exactly (case-sensitive).
    fn upsert_column(&self, definition: Value) -> Self {
        let name = column_name(&definition).map(str::to_string);
        self.map(|q| {
            q.map_list("tableElts", |mut elements| {
                let existing = elements
                    .iter()
                    .position(|e| column_name(e).is_some() && column_name(e) == name.as_deref());
                match existing {
                    Some(index) => elements[index] = definition,
                    None => elements.push(definition),
                }
                elements
            })
        })
    }

    /// Add (or redefine) column `name` of `type_spec`, e.g. `"varchar(255)"`.
    pub fn column(&self, name: &str, type_spec: &str) -> Self {
        self.upsert_column(column_def(name, type_spec))
    }

    /// Add (or redefine) a column with constraints built by `f`.
    pub fn column_with<F>(&self, name: &str, type_spec: &str, f: F) -> Self
    where
        F: FnOnce(ColumnConstraints) -> ColumnConstraints,
    {
        let constraints = f(ColumnConstraints::new());
        self.upsert_column(with_constraints(column_def(name, type_spec), constraints))
    }

    /// Rework the constraints of an existing column, keeping its type. `f`
    /// starts from the column's current constraints. An unknown column leaves
    /// the statement unchanged.
    pub fn alter_column<F>(&self, name: &str, f: F) -> Self
    where
        F: FnOnce(ColumnConstraints) -> ColumnConstraints,
    {
        let elements = self.query.items("tableElts");
        let Some(definition) = elements.iter().find(|e| column_name(e) == Some(name)) else {
            tracing::debug!(column = name, "alter_column: no such column, nothing to alter");
            return self.clone();
        };
        let existing = definition
            .attrs()
            .and_then(|attrs| attrs.get("constraints"))
            .map(Value::items)
            .unwrap_or(&[])
            .to_vec();
        let constraints = f(ColumnConstraints::from_existing(existing));
        self.upsert_column(with_constraints(definition.clone(), constraints))
    }

    /// Replace the whole element list (columns and table constraints).
    pub fn columns_with(&self, f: impl FnOnce(Vec<Value>) -> Vec<Value>) -> Self {
        self.map(|q| q.map_list("tableElts", f))
    }

    pub fn drop_column(&self, name: &str) -> Self {
        self.map(|q| {
            q.map_list("tableElts", |elements| {
                elements
                    .into_iter()
                    .filter(|e| column_name(e) != Some(name))
                    .collect()
            })
        })
    }

    /// Table-level `PRIMARY KEY (columns)`
    pub fn primary_key<I, S>(&self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let constraint = keyed_constraint("CONSTR_PRIMARY", columns);
        self.map(|q| q.append("tableElts", [constraint]))
    }

    /// Table-level `UNIQUE (columns)`
    pub fn unique<I, S>(&self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let constraint = keyed_constraint("CONSTR_UNIQUE", columns);
        self.map(|q| q.append("tableElts", [constraint]))
    }

    pub fn check(&self, condition: Value) -> Self {
        self.map(|q| q.append("tableElts", [check_constraint(condition)]))
    }

    /// `FOREIGN KEY (columns) REFERENCES table (referenced)`
    pub fn foreign_key<I, S, J, T>(&self, columns: I, table: &str, referenced: J) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        J: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let constraint =
            foreign_key_constraint(Some(name_list(columns)), table, name_list(referenced));
        self.map(|q| q.append("tableElts", [constraint]))
    }

    pub fn if_not_exists(&self) -> Self {
        self.map(|q| q.set("if_not_exists", Value::from(true)))
    }

    /// Column names in definition order.
    pub fn column_names(&self) -> Vec<&str> {
        self.query
            .node
            .get("tableElts")
            .map(Value::items)
            .unwrap_or(&[])
            .iter()
            .filter_map(column_name)
            .collect()
    }
}

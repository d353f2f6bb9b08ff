#![allow(dead_code)]
//! A small deparser for the node shapes the builders emit.
//!
//! Covers the statement and expression kinds the integration tests build or
//! parse; anything else is a `DeparseError`. Parsing is a fixture lookup.

use std::collections::HashMap;

use pg_ast::{
    DeparseError, ParseError, ParseErrorKind, Parser, ScanError, ScanToken, Value,
};

type Out = Result<String, DeparseError>;

/// Test parser: deparses real trees, parses only SQL registered as a fixture.
#[derive(Debug, Default)]
pub struct MiniParser {
    fixtures: HashMap<String, Value>,
}

impl MiniParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixture(mut self, sql: &str, tree: Value) -> Self {
        self.fixtures.insert(sql.to_string(), tree);
        self
    }
}

impl Parser for MiniParser {
    fn parse(&self, sql: &str) -> Result<Value, ParseError> {
        self.fixtures.get(sql).cloned().ok_or_else(|| {
            ParseError::new(format!("no fixture for {sql:?}"), 1, ParseErrorKind::Syntax)
        })
    }

    fn deparse(&self, tree: &Value) -> Out {
        let statements = tree.get("stmts").map(Value::items).unwrap_or(&[]);
        let sql = statements
            .iter()
            .map(|raw| stmt(raw.get("stmt").ok_or_else(|| unsupported("RawStmt"))?))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sql.join("; "))
    }

    fn deparse_node(&self, node: &Value) -> Out {
        expr(node)
    }

    fn scan(&self, sql: &str) -> Result<Vec<ScanToken>, ScanError> {
        let mut tokens = Vec::new();
        let mut start = None;
        for (index, c) in sql.char_indices().chain([(sql.len(), ' ')]) {
            match (c.is_whitespace(), start) {
                (false, None) => start = Some(index),
                (true, Some(from)) => {
                    let word = &sql[from..index];
                    let (kind, keyword) = match word.to_ascii_uppercase().as_str() {
                        "SELECT" | "FROM" | "WHERE" => (word.to_ascii_uppercase(), 4),
                        _ => ("IDENT".to_string(), 0),
                    };
                    tokens.push(ScanToken::new(sql, kind, from, index, keyword));
                    start = None;
                }
                _ => {}
            }
        }
        Ok(tokens)
    }
}

fn unsupported(what: &str) -> DeparseError {
    DeparseError::new(format!("cannot deparse {what}"))
}

fn text<'a>(node: &'a Value, key: &str) -> Option<&'a str> {
    node.get(key).and_then(Value::as_str)
}

fn flag(node: &Value, key: &str) -> bool {
    node.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn list<'a>(node: &'a Value, key: &str) -> &'a [Value] {
    node.get(key).map(Value::items).unwrap_or(&[])
}

fn join(items: &[Value], f: impl Fn(&Value) -> Out) -> Out {
    Ok(items.iter().map(f).collect::<Result<Vec<_>, _>>()?.join(", "))
}

fn names(items: &[Value], separator: &str) -> String {
    items
        .iter()
        .filter_map(|n| text(n.attrs()?, "sval"))
        .collect::<Vec<_>>()
        .join(separator)
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn required<'a>(node: &'a Value, key: &str) -> Result<&'a Value, DeparseError> {
    node.get(key).ok_or_else(|| unsupported(key))
}

// -- Statements ---------------------------------------------------------------

pub fn stmt(node: &Value) -> Out {
    let (kind, attrs) = node.as_tagged().ok_or_else(|| unsupported("untagged statement"))?;
    match kind {
        "SelectStmt" => select(attrs),
        "InsertStmt" => insert(attrs),
        "UpdateStmt" => update(attrs),
        "DeleteStmt" => delete(attrs),
        "CreateStmt" => create_table(attrs),
        "AlterTableStmt" => alter_table(attrs),
        "IndexStmt" => create_index(attrs),
        other => Err(unsupported(other)),
    }
}

fn clause(sql: &mut String, keyword: &str, items: &[Value], f: impl Fn(&Value) -> Out) -> Result<(), DeparseError> {
    if !items.is_empty() {
        sql.push_str(&format!(" {keyword} {}", join(items, f)?));
    }
    Ok(())
}

fn filter(sql: &mut String, keyword: &str, node: Option<&Value>) -> Result<(), DeparseError> {
    if let Some(node) = node {
        sql.push_str(&format!(" {keyword} {}", expr(node)?));
    }
    Ok(())
}

fn select(a: &Value) -> Out {
    let mut sql = String::new();
    if let Some(with) = a.get("withClause") {
        sql.push_str("WITH ");
        if flag(with, "recursive") {
            sql.push_str("RECURSIVE ");
        }
        let ctes = join(list(with, "ctes"), |cte| {
            let cte = cte.attrs().ok_or_else(|| unsupported("CommonTableExpr"))?;
            Ok(format!(
                "{} AS ({})",
                text(cte, "ctename").unwrap_or_default(),
                stmt(required(cte, "ctequery")?)?
            ))
        })?;
        sql.push_str(&ctes);
        sql.push(' ');
    }

    let set_op = match text(a, "op") {
        Some("SETOP_UNION") => Some("UNION"),
        Some("SETOP_EXCEPT") => Some("EXCEPT"),
        Some("SETOP_INTERSECT") => Some("INTERSECT"),
        _ => None,
    };
    if let Some(keyword) = set_op {
        let all = if flag(a, "all") { " ALL" } else { "" };
        sql.push_str(&format!(
            "{} {keyword}{all} {}",
            select(required(a, "larg")?)?,
            select(required(a, "rarg")?)?
        ));
        return Ok(sql);
    }

    let rows = list(a, "valuesLists");
    if !rows.is_empty() {
        let rows = join(rows, |row| {
            let items = row.attrs().map(|r| list(r, "items")).unwrap_or(&[]);
            Ok(format!("({})", join(items, expr)?))
        })?;
        sql.push_str(&format!("VALUES {rows}"));
        return Ok(sql);
    }

    sql.push_str("SELECT");
    if let Some(distinct) = a.get("distinctClause") {
        let on: Vec<Value> = distinct
            .items()
            .iter()
            .filter(|d| d.as_tagged().is_some())
            .cloned()
            .collect();
        if on.is_empty() {
            sql.push_str(" DISTINCT");
        } else {
            sql.push_str(&format!(" DISTINCT ON ({})", join(&on, expr)?));
        }
    }
    let targets = list(a, "targetList");
    if !targets.is_empty() {
        sql.push_str(&format!(" {}", join(targets, target)?));
    }
    clause(&mut sql, "FROM", list(a, "fromClause"), from_item)?;
    filter(&mut sql, "WHERE", a.get("whereClause"))?;
    clause(&mut sql, "GROUP BY", list(a, "groupClause"), expr)?;
    filter(&mut sql, "HAVING", a.get("havingClause"))?;
    clause(&mut sql, "ORDER BY", list(a, "sortClause"), sort_item)?;
    filter(&mut sql, "LIMIT", a.get("limitCount"))?;
    filter(&mut sql, "OFFSET", a.get("limitOffset"))?;
    for lock in list(a, "lockingClause") {
        match lock.attrs().and_then(|l| text(l, "strength")) {
            Some("LCS_FORUPDATE") => sql.push_str(" FOR UPDATE"),
            Some("LCS_FORSHARE") => sql.push_str(" FOR SHARE"),
            _ => return Err(unsupported("LockingClause")),
        }
    }
    Ok(sql)
}

fn returning(sql: &mut String, a: &Value) -> Result<(), DeparseError> {
    clause(sql, "RETURNING", list(a, "returningList"), target)
}

fn insert(a: &Value) -> Out {
    let mut sql = format!("INSERT INTO {}", relation(required(a, "relation")?));
    let cols = list(a, "cols");
    if !cols.is_empty() {
        sql.push_str(&format!(" ({})", join(cols, target)?));
    }
    match a.get("selectStmt") {
        Some(source) => sql.push_str(&format!(" {}", stmt(source)?)),
        None => sql.push_str(" DEFAULT VALUES"),
    }
    if let Some(conflict) = a.get("onConflictClause") {
        sql.push_str(" ON CONFLICT");
        if let Some(infer) = conflict.get("infer") {
            let columns: Vec<&str> = list(infer, "indexElems")
                .iter()
                .filter_map(|e| text(e.attrs()?, "name"))
                .collect();
            sql.push_str(&format!(" ({})", columns.join(", ")));
        }
        match text(conflict, "action") {
            Some("ONCONFLICT_UPDATE") => sql.push_str(&format!(
                " DO UPDATE SET {}",
                join(list(conflict, "targetList"), assignment)?
            )),
            _ => sql.push_str(" DO NOTHING"),
        }
    }
    returning(&mut sql, a)?;
    Ok(sql)
}

fn update(a: &Value) -> Out {
    let mut sql = format!(
        "UPDATE {} SET {}",
        relation(required(a, "relation")?),
        join(list(a, "targetList"), assignment)?
    );
    clause(&mut sql, "FROM", list(a, "fromClause"), from_item)?;
    filter(&mut sql, "WHERE", a.get("whereClause"))?;
    returning(&mut sql, a)?;
    Ok(sql)
}

fn delete(a: &Value) -> Out {
    let mut sql = format!("DELETE FROM {}", relation(required(a, "relation")?));
    clause(&mut sql, "USING", list(a, "usingClause"), from_item)?;
    filter(&mut sql, "WHERE", a.get("whereClause"))?;
    returning(&mut sql, a)?;
    Ok(sql)
}

fn create_table(a: &Value) -> Out {
    let exists = if flag(a, "if_not_exists") { "IF NOT EXISTS " } else { "" };
    let elements = join(list(a, "tableElts"), |element| match element.as_tagged() {
        Some(("ColumnDef", def)) => column_def(def),
        Some(("Constraint", c)) => constraint(c, true),
        _ => Err(unsupported("table element")),
    })?;
    Ok(format!(
        "CREATE TABLE {exists}{} ({elements})",
        relation(required(a, "relation")?)
    ))
}

fn alter_table(a: &Value) -> Out {
    let exists = if flag(a, "missing_ok") { "IF EXISTS " } else { "" };
    let commands = join(list(a, "cmds"), |cmd| {
        let cmd = cmd.attrs().ok_or_else(|| unsupported("AlterTableCmd"))?;
        let name = text(cmd, "name").unwrap_or_default();
        let def = cmd.get("def").and_then(Value::attrs);
        match (text(cmd, "subtype"), def) {
            (Some("AT_AddColumn"), Some(def)) => Ok(format!("ADD COLUMN {}", column_def(def)?)),
            (Some("AT_DropColumn"), _) => Ok(format!("DROP COLUMN {name}")),
            (Some("AT_SetNotNull"), _) => Ok(format!("ALTER COLUMN {name} SET NOT NULL")),
            (Some("AT_DropNotNull"), _) => Ok(format!("ALTER COLUMN {name} DROP NOT NULL")),
            (Some("AT_AddConstraint"), Some(def)) => Ok(format!("ADD {}", constraint(def, true)?)),
            (Some("AT_DropConstraint"), _) => Ok(format!("DROP CONSTRAINT {name}")),
            _ => Err(unsupported("AlterTableCmd subtype")),
        }
    })?;
    Ok(format!(
        "ALTER TABLE {exists}{} {commands}",
        relation(required(a, "relation")?)
    ))
}

fn create_index(a: &Value) -> Out {
    let mut sql = String::from("CREATE ");
    if flag(a, "unique") {
        sql.push_str("UNIQUE ");
    }
    sql.push_str("INDEX ");
    if flag(a, "concurrent") {
        sql.push_str("CONCURRENTLY ");
    }
    if flag(a, "if_not_exists") {
        sql.push_str("IF NOT EXISTS ");
    }
    sql.push_str(&format!(
        "{} ON {}",
        text(a, "idxname").unwrap_or_default(),
        relation(required(a, "relation")?)
    ));
    match text(a, "accessMethod") {
        Some("btree") | None => {}
        Some(method) => sql.push_str(&format!(" USING {method}")),
    }
    sql.push_str(&format!(" ({})", join(list(a, "indexParams"), index_elem)?));
    let include = list(a, "indexIncludingParams");
    if !include.is_empty() {
        sql.push_str(&format!(" INCLUDE ({})", join(include, index_elem)?));
    }
    filter(&mut sql, "WHERE", a.get("whereClause"))?;
    Ok(sql)
}

// -- Clauses ------------------------------------------------------------------

fn relation(a: &Value) -> String {
    let mut sql = match text(a, "schemaname") {
        Some(schema) => format!("{schema}.{}", text(a, "relname").unwrap_or_default()),
        None => text(a, "relname").unwrap_or_default().to_string(),
    };
    if let Some(alias) = a.get("alias").and_then(|al| text(al, "aliasname")) {
        sql.push_str(&format!(" {alias}"));
    }
    sql
}

fn from_item(node: &Value) -> Out {
    match node.as_tagged() {
        Some(("RangeVar", a)) => Ok(relation(a)),
        Some(("RangeSubselect", a)) => {
            let alias = a.get("alias").and_then(|al| text(al, "aliasname")).unwrap_or_default();
            Ok(format!("({}) {alias}", stmt(required(a, "subquery")?)?))
        }
        Some(("JoinExpr", a)) => {
            let keyword = match text(a, "jointype") {
                Some("JOIN_LEFT") => "LEFT JOIN",
                Some("JOIN_RIGHT") => "RIGHT JOIN",
                Some("JOIN_FULL") => "FULL JOIN",
                _ if a.get("quals").is_none() => "CROSS JOIN",
                _ => "JOIN",
            };
            let mut sql = format!(
                "{} {keyword} {}",
                from_item(required(a, "larg")?)?,
                from_item(required(a, "rarg")?)?
            );
            filter(&mut sql, "ON", a.get("quals"))?;
            Ok(sql)
        }
        _ => Err(unsupported("FROM item")),
    }
}

fn target(node: &Value) -> Out {
    let a = match node.as_tagged() {
        Some(("ResTarget", a)) => a,
        _ => return expr(node),
    };
    match (a.get("val"), text(a, "name")) {
        (Some(value), Some(name)) => Ok(format!("{} AS {name}", expr(value)?)),
        (Some(value), None) => expr(value),
        (None, Some(name)) => Ok(name.to_string()),
        (None, None) => Err(unsupported("empty ResTarget")),
    }
}

fn assignment(node: &Value) -> Out {
    let a = node.attrs().ok_or_else(|| unsupported("assignment"))?;
    Ok(format!(
        "{} = {}",
        text(a, "name").unwrap_or_default(),
        expr(required(a, "val")?)?
    ))
}

fn sort_item(node: &Value) -> Out {
    let a = match node.as_tagged() {
        Some(("SortBy", a)) => a,
        _ => return expr(node),
    };
    let mut sql = expr(required(a, "node")?)?;
    match text(a, "sortby_dir") {
        Some("SORTBY_ASC") => sql.push_str(" ASC"),
        Some("SORTBY_DESC") => sql.push_str(" DESC"),
        _ => {}
    }
    match text(a, "sortby_nulls") {
        Some("SORTBY_NULLS_FIRST") => sql.push_str(" NULLS FIRST"),
        Some("SORTBY_NULLS_LAST") => sql.push_str(" NULLS LAST"),
        _ => {}
    }
    Ok(sql)
}

fn index_elem(node: &Value) -> Out {
    let a = node.attrs().ok_or_else(|| unsupported("IndexElem"))?;
    let mut sql = text(a, "name").unwrap_or_default().to_string();
    if text(a, "ordering") == Some("SORTBY_DESC") {
        sql.push_str(" DESC");
    }
    Ok(sql)
}

fn type_name(a: &Value) -> String {
    let name = names(list(a, "names"), ".");
    let name = name.strip_prefix("pg_catalog.").unwrap_or(&name).to_string();
    let modifiers: Vec<String> = list(a, "typmods")
        .iter()
        .filter_map(|m| expr(m).ok())
        .collect();
    if modifiers.is_empty() {
        name
    } else {
        format!("{name}({})", modifiers.join(", "))
    }
}

fn column_def(a: &Value) -> Out {
    let mut sql = format!(
        "{} {}",
        text(a, "colname").unwrap_or_default(),
        type_name(required(a, "typeName")?)
    );
    for c in list(a, "constraints") {
        let c = c.attrs().ok_or_else(|| unsupported("column constraint"))?;
        sql.push_str(&format!(" {}", constraint(c, false)?));
    }
    Ok(sql)
}

fn constraint(c: &Value, table_level: bool) -> Out {
    let keys = names(list(c, "keys"), ", ");
    match text(c, "contype") {
        Some("CONSTR_NOTNULL") => Ok("NOT NULL".to_string()),
        Some("CONSTR_PRIMARY") if table_level => Ok(format!("PRIMARY KEY ({keys})")),
        Some("CONSTR_PRIMARY") => Ok("PRIMARY KEY".to_string()),
        Some("CONSTR_UNIQUE") if table_level => Ok(format!("UNIQUE ({keys})")),
        Some("CONSTR_UNIQUE") => Ok("UNIQUE".to_string()),
        Some("CONSTR_DEFAULT") => Ok(format!("DEFAULT {}", expr(required(c, "raw_expr")?)?)),
        Some("CONSTR_CHECK") => Ok(format!("CHECK ({})", expr(required(c, "raw_expr")?)?)),
        Some("CONSTR_FOREIGN") => {
            let references = format!(
                "REFERENCES {} ({})",
                relation(required(c, "pktable")?),
                names(list(c, "pk_attrs"), ", ")
            );
            match c.get("fk_attrs") {
                Some(local) => Ok(format!("FOREIGN KEY ({}) {references}", names(local.items(), ", "))),
                None => Ok(references),
            }
        }
        _ => Err(unsupported("constraint type")),
    }
}

// -- Expressions --------------------------------------------------------------

fn constant(a: &Value) -> Out {
    if flag(a, "isnull") {
        return Ok("NULL".to_string());
    }
    if let Some(v) = a.get("ival") {
        return Ok(v.get("ival").and_then(Value::as_i64).unwrap_or(0).to_string());
    }
    if let Some(v) = a.get("fval") {
        return Ok(text(v, "fval").unwrap_or("0").to_string());
    }
    if let Some(v) = a.get("boolval") {
        return Ok(flag(v, "boolval").to_string());
    }
    if let Some(v) = a.get("sval") {
        return Ok(quote(text(v, "sval").unwrap_or_default()));
    }
    Err(unsupported("A_Const"))
}

fn nested(node: &Value) -> Out {
    let sql = expr(node)?;
    if node.kind() == Some("BoolExpr") {
        Ok(format!("({sql})"))
    } else {
        Ok(sql)
    }
}

pub fn expr(node: &Value) -> Out {
    let (kind, a) = node.as_tagged().ok_or_else(|| unsupported("untagged expression"))?;
    match kind {
        "ColumnRef" => Ok(list(a, "fields")
            .iter()
            .map(|f| match f.as_tagged() {
                Some(("A_Star", _)) => "*",
                _ => f.attrs().and_then(|s| text(s, "sval")).unwrap_or_default(),
            })
            .collect::<Vec<_>>()
            .join(".")),
        "A_Const" => constant(a),
        "A_Expr" => {
            let op = list(a, "name")
                .first()
                .and_then(|n| text(n.attrs()?, "sval"))
                .unwrap_or("=");
            let left = expr(required(a, "lexpr")?)?;
            let right = required(a, "rexpr")?;
            match text(a, "kind") {
                Some("AEXPR_LIKE") => Ok(format!("{left} LIKE {}", expr(right)?)),
                Some("AEXPR_ILIKE") => Ok(format!("{left} ILIKE {}", expr(right)?)),
                Some("AEXPR_BETWEEN") => match right.as_tagged() {
                    Some(("List", bounds)) => match list(bounds, "items") {
                        [low, high] => {
                            Ok(format!("{left} BETWEEN {} AND {}", expr(low)?, expr(high)?))
                        }
                        _ => Err(unsupported("BETWEEN bounds")),
                    },
                    _ => Err(unsupported("BETWEEN bounds")),
                },
                Some("AEXPR_IN") => {
                    let items = right.attrs().map(|l| list(l, "items")).unwrap_or(&[]);
                    Ok(format!("{left} IN ({})", join(items, expr)?))
                }
                _ => Ok(format!("{left} {op} {}", expr(right)?)),
            }
        }
        "BoolExpr" => {
            let args = list(a, "args");
            let parts = args.iter().map(nested).collect::<Result<Vec<_>, _>>()?;
            match text(a, "boolop") {
                Some("NOT_EXPR") => Ok(format!("NOT {}", parts.join(""))),
                Some("OR_EXPR") => Ok(parts.join(" OR ")),
                _ => Ok(parts.join(" AND ")),
            }
        }
        "NullTest" => {
            let arg = expr(required(a, "arg")?)?;
            match text(a, "nulltesttype") {
                Some("IS_NOT_NULL") => Ok(format!("{arg} IS NOT NULL")),
                _ => Ok(format!("{arg} IS NULL")),
            }
        }
        "FuncCall" => {
            let name = names(list(a, "funcname"), ".");
            let args = if flag(a, "agg_star") {
                "*".to_string()
            } else {
                join(list(a, "args"), expr)?
            };
            Ok(format!("{name}({args})"))
        }
        "ParamRef" => Ok(format!(
            "${}",
            a.get("number").and_then(Value::as_i64).unwrap_or(0)
        )),
        "TypeCast" => Ok(format!(
            "{}::{}",
            expr(required(a, "arg")?)?,
            type_name(required(a, "typeName")?)
        )),
        "SubLink" => {
            let subquery = stmt(required(a, "subselect")?)?;
            match text(a, "subLinkType") {
                Some("EXISTS_SUBLINK") => Ok(format!("EXISTS ({subquery})")),
                Some("ANY_SUBLINK") => {
                    Ok(format!("{} IN ({subquery})", expr(required(a, "testexpr")?)?))
                }
                _ => Ok(format!("({subquery})")),
            }
        }
        "ResTarget" => target(node),
        other => Err(unsupported(other)),
    }
}

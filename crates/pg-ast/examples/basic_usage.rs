//! Basic usage examples for pg-ast.
//!
//! Run with: cargo run --example basic_usage -p pg-ast
//!
//! No parser backend is linked here, so statements are printed as their
//! libpg_query JSON trees instead of SQL.

use pg_ast::expr::{eq, gt, is_null};
use pg_ast::nodes::col;
use pg_ast::predicates::in_path;
use pg_ast::{create_table, insert, select, wrap, Builder, Value};

fn main() {
    building();
    searching();
    rewriting();
}

/// Build a statement with the fluent builders.
fn building() {
    println!("=== Building ===\n");

    let query = select(["id", "email"])
        .from("users")
        .where_(eq("active", true))
        .where_(gt("age", 18))
        .limit(10);
    println!("{}\n", query.node());

    let table = create_table("users")
        .column_with("id", "int8", |c| c.primary_key())
        .column_with("email", "text", |c| c.not_null().unique());
    println!("{}\n", table.node());

    let row = insert("users").columns(["email"]).values(["ann@example.com"]);
    println!("{}\n", row.node());
}

/// Search a tree by kind, optionally scoped by a predicate.
fn searching() {
    println!("=== Searching ===\n");

    let query = select(["id"])
        .from("users")
        .inner_join("orders", eq("orders.user_id", col("users.id")))
        .expect("FROM is set")
        .where_(is_null("users.deleted_at"));

    for table in query.find_all("RangeVar") {
        println!("table: {}", table.node().get("relname").unwrap_or(&Value::Null));
    }
    let filtered = query.find_all_where("ColumnRef", in_path("whereClause"));
    println!("column references in WHERE: {}\n", filtered.len());
}

/// Rewrite every match in one pass; the original is left untouched.
fn rewriting() {
    println!("=== Rewriting ===\n");

    let query = wrap(select(["id"]).from("users").node().clone(), None);
    let renamed = query
        .transform_all("RangeVar", |table| {
            Ok(table.patch([("schemaname", Value::from("archive"))]))
        })
        .expect("rename");

    println!("before: {}", query.node());
    println!("after:  {}", renamed.node());
}

//! End-to-end statement generation for both dialects.

use proptest::prelude::*;
use quill_common::{Error, Value};
use quill_core::{ColumnRef, Entity, Expr, TableMetadata};
use quill_engine::{Config, QueryContext};

struct DataType;

impl Entity for DataType {
    fn metadata() -> TableMetadata {
        TableMetadata::new("datatype")
            .with_alias("d")
            .with_column("Id", "data_type_id")
            .with_column("Name", "name")
            .with_column("Created", "created")
    }
}

struct Field;

impl Entity for Field {
    fn metadata() -> TableMetadata {
        TableMetadata::new("field")
            .with_alias("f")
            .with_column("Id", "field_id")
            .with_column("DataTypeId", "data_type_id")
            .with_column("Label", "label")
    }
}

struct Unregistered;

fn standard() -> QueryContext {
    QueryContext::default()
}

fn transact_sql() -> QueryContext {
    QueryContext::new(Config::transact_sql()).unwrap()
}

#[test]
fn test_where_with_has_value() {
    let ctx = standard();
    let mut query = ctx.query::<DataType>();
    query
        .filter(&Expr::column("name").eq("text").and(Expr::column("created").has_value()))
        .unwrap();

    let statement = query.build().unwrap();
    assert_eq!(
        statement.sql,
        "SELECT d.data_type_id , d.name , d.created FROM datatype d \
         WHERE name = @ld__1 AND created IS NOT NULL"
    );
    assert_eq!(statement.parameters.len(), 1);
    assert_eq!(statement.parameters.get("ld__1"), Some(&Value::from("text")));
}

#[test]
fn test_contains() {
    let ctx = standard();
    let mut query = ctx.query::<DataType>();
    query.filter(&Expr::column("name").contains("te")).unwrap();

    let statement = query.build().unwrap();
    assert!(statement.sql.ends_with(" WHERE name LIKE '%' || @ld__1 || '%'"));
    assert_eq!(statement.parameters.get("ld__1"), Some(&Value::from("te")));
}

#[test]
fn test_full_statement_standard() {
    let ctx = standard();
    let mut query = ctx.query::<DataType>();
    let left = query.column_of::<DataType>("Id").unwrap();
    let right = query.column_of::<Field>("DataTypeId").unwrap();
    let label = query.column_of::<Field>("Label").unwrap();
    query
        .join::<Field>(left, right)
        .filter(&Expr::Column(label.clone()).starts_with("a"))
        .unwrap()
        .order_by(label)
        .order_by_descending(ColumnRef::qualified("d", "created"))
        .distinct()
        .take(5);

    assert_eq!(
        query.sql().unwrap(),
        "SELECT DISTINCT d.data_type_id , d.name , d.created FROM datatype d \
         JOIN field f ON d.data_type_id = f.data_type_id \
         WHERE f.label LIKE @ld__1 || '%' \
         ORDER BY d.created DESC, f.label LIMIT(5)"
    );
}

#[test]
fn test_full_statement_transact_sql() {
    let ctx = transact_sql();
    let mut query = ctx.query::<DataType>();
    let left = query.column_of::<DataType>("Id").unwrap();
    let right = query.column_of::<Field>("DataTypeId").unwrap();
    query
        .join::<Field>(left, right)
        .select_as::<Field>()
        .filter(&Expr::column("name").is_in(["a", "b"]).not())
        .unwrap()
        .order_by(ColumnRef::new("name"))
        .distinct()
        .take(5);

    assert_eq!(
        query.sql().unwrap(),
        "SELECT DISTINCT TOP(5) f.field_id, f.data_type_id, f.label FROM datatype d \
         JOIN field f ON d.data_type_id = f.data_type_id \
         WHERE name NOT IN (@ld__1, @ld__2) ORDER BY name"
    );
}

struct Note;

impl Entity for Note {
    fn metadata() -> TableMetadata {
        TableMetadata::new("note").with_column("Id", "id")
    }
}

struct Tag;

impl Entity for Tag {
    fn metadata() -> TableMetadata {
        TableMetadata::new("tag")
            .with_alias("t1")
            .with_column("NoteId", "note_id")
    }
}

#[test]
fn test_joined_aliases_stay_distinct() {
    let ctx = standard();
    let mut query = ctx.query::<Note>();
    let left = query.column_of::<Note>("Id").unwrap();
    let right = query.column_of::<Tag>("NoteId").unwrap();
    query.join::<Tag>(left, right);

    assert_eq!(
        query.sql().unwrap(),
        "SELECT t1.id FROM note t1 JOIN tag t2 ON t1.id = t2.note_id"
    );

    let reversed = standard();
    reversed.register::<Tag>();
    let query = reversed.query::<Note>();
    assert_eq!(query.sql().unwrap(), "SELECT t2.id FROM note t2");
}

#[test]
fn test_limit_placement() {
    let mut standard = standard().query::<DataType>();
    standard.take(5);
    let sql = standard.sql().unwrap();
    assert!(sql.starts_with("SELECT d.data_type_id"));
    assert!(sql.ends_with("FROM datatype d LIMIT(5)"));

    let mut top = transact_sql().query::<DataType>();
    top.take(5);
    let sql = top.sql().unwrap();
    assert!(sql.starts_with("SELECT TOP(5) d.data_type_id"));
    assert!(!sql.contains("LIMIT"));
}

#[test]
fn test_unregistered_entity_lookup_is_empty() {
    let ctx = standard();
    let key = quill_common::EntityKey::of::<Unregistered>();
    assert_eq!(ctx.cache().table_name(key), "");
    assert!(ctx.cache().columns(key).is_empty());
    assert!(ctx.cache().lookup(key).is_none());
}

#[test]
fn test_translation_errors_surface() {
    let ctx = standard();
    let mut query = ctx.query::<DataType>();
    let err = query
        .filter(&Expr::function("len", vec![Expr::column("name")]).gt(3))
        .err();
    assert!(matches!(err, Some(Error::Translation(_))));
    assert!(query.sql().unwrap().ends_with("FROM datatype d"));
}

#[test]
fn test_json_tree_compiles() {
    let tree: Expr = serde_json::from_str(
        r#"{ "Binary": {
            "left": { "Match": {
                "operand": { "Column": { "name": "name" } },
                "kind": "EndsWith",
                "pattern": { "Literal": { "String": "xt" } },
                "ignore_case": true
            } },
            "op": "Or",
            "right": { "Unary": {
                "op": "IsNull",
                "operand": { "Column": { "name": "created" } }
            } }
        } }"#,
    )
    .unwrap();

    let ctx = standard();
    let mut query = ctx.query::<DataType>();
    query.filter(&tree).unwrap();
    assert!(
        query
            .sql()
            .unwrap()
            .ends_with(" WHERE name LIKE '%' || @ld__1 OR created IS NULL")
    );
}

fn sort_key() -> impl Strategy<Value = (String, bool)> {
    ("[a-z]{1,6}", any::<bool>())
}

proptest! {
    #[test]
    fn prop_last_order_key_is_primary(keys in prop::collection::vec(sort_key(), 1..6)) {
        let mut query = standard().query::<DataType>();
        for (name, descending) in &keys {
            if *descending {
                query.order_by_descending(ColumnRef::new(name.as_str()));
            } else {
                query.order_by(ColumnRef::new(name.as_str()));
            }
        }

        let expected: Vec<String> = keys
            .iter()
            .rev()
            .map(|(name, descending)| {
                if *descending { format!("{name} DESC") } else { name.clone() }
            })
            .collect();
        let sql = query.sql().unwrap();
        let expected_suffix = format!(" ORDER BY {}", expected.join(", "));
        prop_assert!(sql.ends_with(&expected_suffix));
    }

    #[test]
    fn prop_repeated_values_get_distinct_names(values in prop::collection::vec("[a-c]{0,2}", 1..12)) {
        let ctx = standard();
        let mut query = ctx.query::<DataType>();
        query.filter(&Expr::column("name").is_in(values.iter().map(String::as_str))).unwrap();

        let statement = query.build().unwrap();
        prop_assert_eq!(statement.parameters.len(), values.len());
        let bound: Vec<Value> = statement.parameters.values().cloned().collect();
        let source: Vec<Value> = values.iter().map(|v| Value::from(v.as_str())).collect();
        prop_assert_eq!(bound, source);
        prop_assert_eq!(query.sql().unwrap(), statement.sql);
    }
}

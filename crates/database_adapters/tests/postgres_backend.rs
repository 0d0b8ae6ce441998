use common::types::{Record, SimpleType, SimplifiedColumn, SqlValue};
use database_adapters::{create_backend, QueryPayload};
use serde_json::json;
use test_utils::setup_postgres;

#[tokio::test]
#[ignore = "requires docker"]
async fn postgres_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let pg = setup_postgres().await?;
    let backend = create_backend(&pg.connection_config());
    backend.test_connection().await?;

    let columns = vec![
        SimplifiedColumn::new("id", SimpleType::Int).auto_increment(),
        SimplifiedColumn::new("title", SimpleType::String),
        SimplifiedColumn::new("published", SimpleType::Date),
        SimplifiedColumn::new("price", SimpleType::Float),
        SimplifiedColumn::new("in_stock", SimpleType::Boolean),
    ];
    backend.create_table("books", &columns).await?;

    let mut record = Record::new();
    record.push("title", SqlValue::Text("Dune".into()));
    record.push("published", SqlValue::Text("1965-08-01".into()));
    record.push("price", SqlValue::Int(12));
    record.push("in_stock", SqlValue::Bool(true));
    let mut bad_date = Record::new();
    bad_date.push("title", SqlValue::Text("Unknown".into()));
    bad_date.push("published", SqlValue::Text("someday".into()));

    let inserted = backend
        .insert_rows("books", &columns, &[record, bad_date])
        .await?;
    assert_eq!(inserted, 1);

    let outcome = backend
        .execute("SELECT id, title, published, price, in_stock, 1.25::numeric AS n FROM books")
        .await?;
    let QueryPayload::Rows(rows) = outcome.payload else {
        panic!("expected rows");
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], json!(1));
    assert_eq!(rows[0]["title"], json!("Dune"));
    assert_eq!(rows[0]["published"], json!("1965-08-01"));
    assert_eq!(rows[0]["price"], json!(12.0));
    assert_eq!(rows[0]["in_stock"], json!(true));
    assert_eq!(rows[0]["n"], json!(1.25));

    assert_eq!(backend.list_tables().await?, vec!["books"]);
    let schema = backend.introspect_schema().await?;
    let books = schema.table("books").unwrap();
    assert!(books.column("id").unwrap().primary_key);
    assert_eq!(books.column("title").unwrap().data_type, "character varying(255)");

    let deleted = backend.execute("DELETE FROM books").await?;
    assert_eq!(deleted.payload, QueryPayload::Affected(1));
    Ok(())
}

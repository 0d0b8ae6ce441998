use common::config::ModelsConfig;
use common::types::{ConnectionConfig, DatabaseKind, Dialect, SimpleType, SimplifiedColumn};
use database_adapters::{create_backend, QueryPayload};
use engine::{
    generate_query, generate_schema, generate_text, populate, EngineError, QueryRequest,
    RecordSource, SyntheticRequest,
};
use test_utils::{blog_schema_json, ScriptedModel};

fn models() -> ModelsConfig {
    ModelsConfig {
        schema_model: "schema-model".into(),
        query_model: "query-model".into(),
        data_model: "data-model".into(),
        ..ModelsConfig::default()
    }
}

#[tokio::test]
async fn schema_generation_extracts_fenced_json() -> anyhow::Result<()> {
    let reply = format!("Sure!\n```json\n{}\n```", blog_schema_json());
    let model = ScriptedModel::new().with_reply(reply);

    let generated = generate_schema(&model, &models(), "a blog").await?;
    assert_eq!(generated.schema.tables.len(), 2);
    assert!(generated.formatted_output.contains("users"));

    let request = &model.requests()[0];
    assert_eq!(request.model_id, "schema-model");
    assert_eq!(request.max_tokens, 2048);
    assert_eq!(request.temperature, 0.3);
    Ok(())
}

#[tokio::test]
async fn unusable_schema_reply_keeps_raw_output() {
    let model = ScriptedModel::new().with_reply("I cannot help with that");
    let err = generate_schema(&model, &models(), "a blog").await.unwrap_err();
    match err {
        EngineError::Extraction { raw_output, .. } => {
            assert_eq!(raw_output, "I cannot help with that")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn query_generation_extracts_and_validates() -> anyhow::Result<()> {
    let model = ScriptedModel::new()
        .with_reply("```sql\nSELECT count(*) FROM users;\n```")
        .with_reply("```sql\nSELECT `name FROM users;\n```");
    let request = QueryRequest {
        prompt: "count users".into(),
        dialect: Dialect::MySql,
        schema_context: Some(blog_schema_json()),
    };

    let ok = generate_query(&model, &models(), &request).await?;
    assert_eq!(ok.query, "SELECT count(*) FROM users;");
    assert!(ok.is_valid);
    assert_eq!(ok.validation_message, "Valid query");

    let bad = generate_query(&model, &models(), &request).await?;
    assert!(!bad.is_valid);
    assert_eq!(bad.validation_message, "Unbalanced backticks in MySQL query");

    let sent = &model.requests()[0];
    assert_eq!(sent.model_id, "query-model");
    assert!(sent.prompt.starts_with("You are a SQL expert."));
    assert!(sent.prompt.contains("### Database Schema"));
    Ok(())
}

#[tokio::test]
async fn empty_prompts_are_rejected_before_the_model() {
    let model = ScriptedModel::new();
    assert!(matches!(
        generate_text(&model, &models(), "  ").await,
        Err(EngineError::InvalidInput { .. })
    ));
    assert!(model.requests().is_empty());
}

#[tokio::test]
async fn populate_falls_back_when_model_output_is_unusable() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data.db");
    let backend = create_backend(&ConnectionConfig::new(
        DatabaseKind::Sqlite,
        "",
        "",
        "",
        path.to_str().unwrap(),
    ));
    let model = ScriptedModel::new().with_reply("not json at all");

    let outcome = populate(
        backend.as_ref(),
        &model,
        "data-model",
        SyntheticRequest {
            table_name: None,
            count: Some(3),
            columns: vec![
                SimplifiedColumn::new("id", SimpleType::Int).auto_increment(),
                SimplifiedColumn::new("email", SimpleType::Email),
            ],
        },
    )
    .await?;

    assert!(outcome.table_name.starts_with("synthetic_"));
    assert_eq!(outcome.source, RecordSource::Fallback);
    assert_eq!(outcome.records_inserted, 3);

    let rows = backend
        .execute(&format!("SELECT email FROM \"{}\" ORDER BY id", outcome.table_name))
        .await?;
    let QueryPayload::Rows(rows) = rows.payload else {
        panic!("expected rows");
    };
    assert_eq!(rows[2]["email"], "user3@example.com");
    Ok(())
}

#[tokio::test]
async fn populate_uses_model_records() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data.db");
    let backend = create_backend(&ConnectionConfig::new(
        DatabaseKind::Sqlite,
        "",
        "",
        "",
        path.to_str().unwrap(),
    ));
    let model = ScriptedModel::new()
        .with_reply(r#"[{"name": "Ada", "age": "36"}, {"name": "Linus", "age": 28}]"#);

    let outcome = populate(
        backend.as_ref(),
        &model,
        "data-model",
        SyntheticRequest {
            table_name: Some("people".into()),
            count: None,
            columns: vec![
                SimplifiedColumn::new("name", SimpleType::String),
                SimplifiedColumn::new("age", SimpleType::Int),
            ],
        },
    )
    .await?;

    assert_eq!(outcome.table_name, "people");
    assert_eq!(outcome.source, RecordSource::Model);
    assert_eq!(outcome.records_inserted, 2);
    assert!(model.requests()[0].prompt.starts_with("Generate 10 realistic data entries"));
    Ok(())
}

#[tokio::test]
async fn populate_rejects_oversized_counts_before_touching_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.db");
    let backend = create_backend(&ConnectionConfig::new(
        DatabaseKind::Sqlite,
        "",
        "",
        "",
        path.to_str().unwrap(),
    ));
    let model = ScriptedModel::new();

    let err = populate(
        backend.as_ref(),
        &model,
        "data-model",
        SyntheticRequest {
            table_name: Some("people".into()),
            count: Some(u32::MAX),
            columns: vec![SimplifiedColumn::new("email", SimpleType::Email)],
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, EngineError::InvalidInput { .. }));
    assert_eq!(err.message(), "count must not exceed 1000");
    assert!(model.requests().is_empty());
    assert!(backend.list_tables().await.unwrap().is_empty());
}

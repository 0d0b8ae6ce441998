//! Synthetic records for a simplified schema, and loading them into the
//! connected database.

use crate::EngineError;
use common::types::{Record, SimpleType, SimplifiedColumn, SqlValue};
use database_adapters::DatabaseBackend;
use logging::timeit;
use serde::Serialize;
use serde_json::Value;
use shared_clients::{GenerationRequest, LanguageModel};
use tracing::{info, warn};

pub const DEFAULT_RECORD_COUNT: u32 = 10;
pub const MAX_RECORD_COUNT: u32 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticRequest {
    pub table_name: Option<String>,
    pub count: Option<u32>,
    pub columns: Vec<SimplifiedColumn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    Model,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulateOutcome {
    pub table_name: String,
    pub records_generated: usize,
    pub records_inserted: usize,
    pub source: RecordSource,
}

pub fn random_table_name() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("synthetic_{}", &id[..6])
}

pub fn data_prompt(columns: &[SimplifiedColumn], count: u32) -> String {
    let schema = serde_json::to_string_pretty(columns).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Generate {count} realistic data entries as a JSON array of objects.\n\
         Schema: {schema}\n\n\
         Requirements:\n\
         - Return only a JSON array\n\
         - No markdown formatting\n\
         - Validate data types\n\
         - Example format:\n  [{{\"id\": 1, \"name\": \"John\", \"email\": \"john@test.com\"}}]"
    )
}

/// Parses a JSON array of objects out of model text. A surrounding code
/// fence or prose is tolerated; anything else yields `None`.
pub fn parse_records(raw: &str, columns: &[SimplifiedColumn]) -> Option<Vec<Record>> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end < start {
        return None;
    }
    let items: Vec<Value> = serde_json::from_str(&raw[start..=end]).ok()?;
    items
        .iter()
        .map(|item| Record::from_json(item, columns))
        .collect()
}

/// Deterministic records used when the model is unavailable or returns
/// unusable output. Auto-increment columns are left to the database.
pub fn fallback_records(columns: &[SimplifiedColumn], count: u32) -> Vec<Record> {
    (0..count as i64)
        .map(|i| {
            let mut record = Record::new();
            for column in columns.iter().filter(|c| !c.auto_increment) {
                let value = match column.column_type {
                    SimpleType::Int => SqlValue::Int(i + 1),
                    SimpleType::String => SqlValue::Text(format!("Sample {} {}", column.name, i + 1)),
                    SimpleType::Email => SqlValue::Text(format!("user{}@example.com", i + 1)),
                    SimpleType::Date => SqlValue::Text("2025-03-19".to_string()),
                    SimpleType::Datetime => SqlValue::Text("2025-03-19 12:00:00".to_string()),
                    SimpleType::Boolean => SqlValue::Bool(i % 2 == 0),
                    SimpleType::Float => SqlValue::Float(i as f64 + 0.5),
                };
                record.push(column.name.clone(), value);
            }
            record
        })
        .collect()
}

/// Asks the data model for records, falling back to [`fallback_records`]
/// on any model or parse failure.
pub async fn generate_records(
    model: &dyn LanguageModel,
    model_id: &str,
    columns: &[SimplifiedColumn],
    count: u32,
) -> (Vec<Record>, RecordSource) {
    let request = GenerationRequest::new(data_prompt(columns, count), model_id, 4096, 0.7);
    match model.generate(request).await {
        Ok(raw) => match parse_records(&raw, columns) {
            Some(records) => {
                info!(records = records.len(), "generated records with model");
                return (records, RecordSource::Model);
            }
            None => warn!("model returned no usable JSON array"),
        },
        Err(err) => warn!(error = %err, "record generation failed"),
    }
    let records = fallback_records(columns, count);
    info!(records = records.len(), "fell back to the simple generator");
    (records, RecordSource::Fallback)
}

/// Creates the target table, generates records and inserts them.
pub async fn populate(
    backend: &dyn DatabaseBackend,
    model: &dyn LanguageModel,
    model_id: &str,
    request: SyntheticRequest,
) -> Result<PopulateOutcome, EngineError> {
    if request.columns.is_empty() {
        return Err(EngineError::invalid_input(
            "Schema must contain a \"columns\" array",
        ));
    }
    if request.columns.iter().any(|c| c.name.trim().is_empty()) {
        return Err(EngineError::invalid_input("Each column must have a name"));
    }

    let table_name = request
        .table_name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(random_table_name);
    let count = request.count.unwrap_or(DEFAULT_RECORD_COUNT);
    if count > MAX_RECORD_COUNT {
        return Err(EngineError::invalid_input(format!(
            "count must not exceed {MAX_RECORD_COUNT}"
        )));
    }

    backend.create_table(&table_name, &request.columns).await?;
    let (records, source) = generate_records(model, model_id, &request.columns, count).await;
    let inserted = timeit!(
        "insert synthetic records",
        backend
            .insert_rows(&table_name, &request.columns, &records)
            .await
    )?;

    Ok(PopulateOutcome {
        table_name,
        records_generated: records.len(),
        records_inserted: inserted,
        source,
    })
}

use super::elapsed_secs;
use crate::error::ApiError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::error::ForgeError;
use common::types::{ConnectionConfig, ConnectionSummary, RawConnectionConfig, SimplifiedColumn};
use database_adapters::{create_backend, QueryPayload};
use engine::{populate, SyntheticRequest};
use logging::timeit;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Default, Deserialize)]
pub struct ExecuteBody {
    #[serde(default, rename = "sqlQuery")]
    pub sql_query: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateDataBody {
    #[serde(default)]
    pub schema: Option<SyntheticSchemaBody>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SyntheticSchemaBody {
    #[serde(default, rename = "tableName")]
    pub table_name: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub columns: Option<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct ConnectionStatus {
    status: &'static str,
    is_connected: bool,
    #[serde(flatten)]
    connection: Option<ConnectionSummary>,
}

/// Tests the connection and makes it the active one. A failed attempt
/// leaves nothing connected.
pub async fn connect_db(
    state: web::Data<AppState>,
    body: web::Json<RawConnectionConfig>,
) -> Result<HttpResponse, ApiError> {
    let config = ConnectionConfig::try_from(body.into_inner())?;
    let backend = create_backend(&config);

    if let Err(err) = backend.test_connection().await {
        warn!(db_type = %config.kind, error = %err, "connection attempt failed");
        state.clear_connection();
        return Err(err.into());
    }

    info!(db_type = %config.kind, host = %config.host(), "connected");
    let message = format!("Successfully connected to {} database", config.database);
    state.set_connection(config);

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": message,
        "is_connected": true,
    })))
}

pub async fn connection_status(state: web::Data<AppState>) -> HttpResponse {
    let connection = state.connection().map(|c| c.summary());
    HttpResponse::Ok().json(ConnectionStatus {
        status: "success",
        is_connected: connection.is_some(),
        connection,
    })
}

pub async fn get_tables(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let (_, backend) = state.backend()?;
    let tables = backend.list_tables().await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "tables": tables,
    })))
}

pub async fn get_full_schema(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let started = Instant::now();
    let (config, backend) = state.backend()?;
    let schema = timeit!("introspect schema", backend.introspect_schema().await)?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "metadata": {
            "execution_time": elapsed_secs(started),
            "database_type": config.kind,
            "table_count": schema.tables.len(),
        },
        "tables": schema.tables,
    })))
}

pub async fn execute_sql(
    state: web::Data<AppState>,
    body: web::Json<ExecuteBody>,
) -> Result<HttpResponse, ApiError> {
    let (_, backend) = state.backend()?;
    let sql = body
        .into_inner()
        .sql_query
        .ok_or_else(|| ForgeError::input("No SQL query provided"))?;
    if sql.trim().is_empty() {
        return Err(ForgeError::input("Empty SQL query").into());
    }

    let outcome = timeit!("execute statement", backend.execute(sql.trim()).await)?;
    let (message, result) = match outcome.payload {
        QueryPayload::Rows(rows) => (
            format!("Query executed successfully. Returned {} rows.", rows.len()),
            json!(rows),
        ),
        QueryPayload::Affected(count) => (
            format!("Query executed successfully. Affected {count} rows."),
            json!([{ "affected_rows": count }]),
        ),
    };

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": message,
        "query_type": outcome.query_kind,
        "result": result,
    })))
}

/// Validates the wire columns one by one so a missing name or type is
/// reported as such rather than as a generic decode error.
fn parse_columns(columns: Option<Vec<Value>>) -> Result<Vec<SimplifiedColumn>, ApiError> {
    let columns =
        columns.ok_or_else(|| ForgeError::input("Schema must contain a \"columns\" array"))?;

    columns
        .into_iter()
        .map(|column| -> Result<SimplifiedColumn, ApiError> {
            let named = column
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|n| !n.trim().is_empty());
            if !named {
                return Err(ForgeError::input("Each column must have a name").into());
            }
            if !column.get("type").is_some_and(|t| !t.is_null()) {
                return Err(ForgeError::input("Each column must have a type").into());
            }
            serde_json::from_value(column)
                .map_err(|err| ForgeError::input(format!("Invalid column definition: {err}")).into())
        })
        .collect()
}

pub async fn generate_data(
    state: web::Data<AppState>,
    body: web::Json<GenerateDataBody>,
) -> Result<HttpResponse, ApiError> {
    let started = Instant::now();
    let (_, backend) = state.backend()?;
    let schema = body
        .into_inner()
        .schema
        .ok_or_else(|| ForgeError::input("Schema is required"))?;
    let columns = parse_columns(schema.columns)?;

    let outcome = populate(
        backend.as_ref(),
        state.model.as_ref(),
        state.config.models.data_model(),
        SyntheticRequest {
            table_name: schema.table_name,
            count: schema.count,
            columns,
        },
    )
    .await?;
    let elapsed = elapsed_secs(started);

    Ok(HttpResponse::Created().json(json!({
        "status": "success",
        "message": format!("Data generated and stored successfully in {elapsed} seconds"),
        "table_name": outcome.table_name,
        "records_generated": outcome.records_generated,
        "records_inserted": outcome.records_inserted,
        "source": outcome.source,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_checks_report_the_missing_field() {
        let err = parse_columns(None).unwrap_err();
        assert_eq!(err.inner().message(), "Schema must contain a \"columns\" array");

        let err = parse_columns(Some(vec![json!({"type": "int"})])).unwrap_err();
        assert_eq!(err.inner().message(), "Each column must have a name");

        let err = parse_columns(Some(vec![json!({"name": "id"})])).unwrap_err();
        assert_eq!(err.inner().message(), "Each column must have a type");

        let columns = parse_columns(Some(vec![
            json!({"name": "id", "type": "int", "autoIncrement": true}),
            json!({"name": "email", "type": "email"}),
        ]))
        .unwrap();
        assert_eq!(columns.len(), 2);
        assert!(columns[0].auto_increment);
    }
}

use super::CliError;
use clap::Args;
use common::error::ForgeError;
use common::types::{CanonicalSchema, Dialect};
use std::path::{Path, PathBuf};
use tracing::info;
use translate::{select_table, synthesize, to_simplified};

#[derive(Debug, Args)]
pub struct DdlArgs {
    /// Canonical schema JSON file
    pub schema: PathBuf,

    /// Target dialect: mysql, postgres, sqlite or sqlserver
    #[arg(long, default_value = "mysql")]
    pub dialect: String,
}

#[derive(Debug, Args)]
pub struct SimplifyArgs {
    /// Canonical schema JSON file
    pub schema: PathBuf,

    /// Table to convert; defaults to the first table
    #[arg(long)]
    pub table: Option<String>,
}

fn read_schema(path: &Path) -> Result<CanonicalSchema, CliError> {
    let text = std::fs::read_to_string(path).map_err(|err| CliError::read(path, err))?;
    let schema: CanonicalSchema = serde_json::from_str(&text).map_err(ForgeError::from)?;
    schema.validate()?;
    info!(path = %path.display(), tables = schema.tables.len(), "loaded schema");
    Ok(schema)
}

/// Renders `CREATE TABLE` statements for every table in the file.
pub fn handle_ddl(args: &DdlArgs) -> Result<String, CliError> {
    let dialect: Dialect = args.dialect.parse()?;
    let schema = read_schema(&args.schema)?;
    Ok(synthesize(&schema, dialect))
}

/// Renders one table in the synthetic-data format as pretty JSON.
pub fn handle_simplify(args: &SimplifyArgs) -> Result<String, CliError> {
    let schema = read_schema(&args.schema)?;
    let table = select_table(&schema, args.table.as_deref())?;
    let simplified = to_simplified(table);
    Ok(serde_json::to_string_pretty(&simplified).map_err(ForgeError::from)?)
}

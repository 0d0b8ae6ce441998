//! Pulls schemas and SQL out of free-form model output and applies the
//! lightweight syntax heuristics used before returning generated queries.

pub mod schema;
pub mod sql;
pub mod validate;

pub use schema::{extract_schema, ModelOutput};
pub use sql::extract_sql_statement;
pub use validate::{validate_syntax, SyntaxCheck};

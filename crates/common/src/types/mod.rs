pub mod connection;
pub mod dialect;
pub mod record;
pub mod schema;
pub mod simplified;

pub use connection::{ConnectionConfig, ConnectionSummary, DatabaseKind, RawConnectionConfig};
pub use dialect::Dialect;
pub use record::{Record, SqlValue};
pub use schema::{CanonicalSchema, Column, DefaultValue, ForeignKey, Table};
pub use simplified::{ColumnOptions, SimpleType, SimplifiedColumn, SimplifiedSchema};

//! Pure conversions between the canonical schema and its other shapes:
//! dialect DDL, markdown, and the simplified synthetic-data format.

pub mod ddl;
pub mod dialect;
pub mod display;
pub mod functions;
pub mod simplified;
pub mod type_map;

pub use ddl::{create_table_statement, simplified_to_table, synthesize, synthesize_with, DdlOptions};
pub use dialect::{AutoIncrementStyle, DialectRules};
pub use display::format_schema_markdown;
pub use simplified::{select_table, to_simplified};
pub use type_map::{is_auto_increment_eligible, to_native_type, to_simplified_type};

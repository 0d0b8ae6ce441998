pub mod schema;
pub mod serve;
pub mod validate;

pub use schema::{handle_ddl, handle_simplify, DdlArgs, SimplifyArgs};
pub use serve::{handle_serve, ServeArgs};
pub use validate::{handle_validate, ValidateArgs};

use common::error::{DiagnosticMessage, ForgeError};
use server::ServerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Forge(#[from] ForgeError),
    #[error("{0}")]
    Server(#[from] ServerError),
    #[error("cannot read {context}")]
    Read {
        context: DiagnosticMessage,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    #[track_caller]
    pub fn read(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Read {
            context: DiagnosticMessage::new(format!("'{}': {source}", path.display())),
            source,
        }
    }
}

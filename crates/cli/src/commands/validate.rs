use super::CliError;
use clap::Args;
use common::error::ForgeError;
use common::types::Dialect;
use extract::validate_syntax;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// SQL text to check
    pub sql: String,

    /// Dialect whose quoting rules apply
    #[arg(long, default_value = "mysql")]
    pub dialect: String,
}

pub fn handle_validate(args: &ValidateArgs) -> Result<String, CliError> {
    let dialect: Dialect = args.dialect.parse()?;
    let check = validate_syntax(&args.sql, dialect);
    if check.valid {
        Ok("Valid query".to_string())
    } else {
        Err(ForgeError::input(check.reason).into())
    }
}

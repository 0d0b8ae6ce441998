use super::CliError;
use actix_web::rt::System;
use clap::Args;
use common::config::load_config;
use common::error::ForgeError;
use server::run_server;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to bind; overrides the configured `server.addr`
    #[arg(long)]
    pub addr: Option<String>,
}

pub fn handle_serve(args: ServeArgs, config_path: Option<PathBuf>) -> Result<(), CliError> {
    let mut config = load_config(config_path).map_err(ForgeError::from)?;
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }

    System::new().block_on(run_server(config))?;
    Ok(())
}

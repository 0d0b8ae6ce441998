mod commands;

use crate::commands::{
    handle_ddl, handle_serve, handle_simplify, handle_validate, CliError, DdlArgs, ServeArgs,
    SimplifyArgs, ValidateArgs,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use time::macros::format_description;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schemaforge")]
pub struct Cli {
    #[arg(
        long = "config-path",
        short = 'c',
        help = "path to schemaforge.yml or the directory holding it",
        global = true
    )]
    pub config_path: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Start the HTTP backend
    Serve(ServeArgs),
    /// Print CREATE TABLE statements for a canonical schema file
    Ddl(DdlArgs),
    /// Print one table of a canonical schema in the synthetic-data format
    Simplify(SimplifyArgs),
    /// Check SQL text against the syntax heuristics
    Validate(ValidateArgs),
}

fn print_or_exit(result: Result<String, CliError>) {
    match result {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info") // fallback log level
    });
    let time_format =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:2]");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_timer(fmt::time::LocalTime::new(time_format))
                .with_target(false)
                .with_level(true)
                .with_thread_names(false)
                .with_line_number(false)
                .with_file(false)
                .with_span_events(fmt::format::FmtSpan::NONE)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(filter)
        .init();
    let cli = Cli::parse();

    match cli.command {
        Cmd::Serve(args) => {
            if let Err(e) = handle_serve(args, cli.config_path) {
                eprintln!("Server failed: {}", e);
                std::process::exit(1);
            }
        }
        Cmd::Ddl(args) => print_or_exit(handle_ddl(&args)),
        Cmd::Simplify(args) => print_or_exit(handle_simplify(&args)),
        Cmd::Validate(args) => print_or_exit(handle_validate(&args)),
    }
}

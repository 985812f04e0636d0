//! minilang-fv: bounded verification of minilang programs.
//!
//! Usage:
//!   minilang-fv check prog.json [--unroll N] [--timeout MS] [--format json]
//!   minilang-fv equiv a.json b.json [--outputs x,y] [--with-assertions]
//!   minilang-fv dump prog.json
//!
//! Exit status: 0 verified, 1 refuted, 2 inconclusive, 3 error.

use std::process::ExitCode;

use clap::Parser;
use minilang_fv_driver::cli::{Cli, Command, OutputFormat};
use minilang_fv_driver::commands;
use minilang_fv_driver::json_output::{JsonError, print_json};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = match &cli.command {
        Command::Check { opts, .. } | Command::Equiv { opts, .. } => {
            opts.format == OutputFormat::Json
        }
        Command::Dump { format, .. } => *format == OutputFormat::Json,
    };

    match commands::run(&cli.command) {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            tracing::debug!(error = ?err, "run failed");
            if json {
                print_json(&JsonError::from(&err));
            } else {
                eprintln!("[minilang-fv] error: {err}");
            }
            ExitCode::from(3)
        }
    }
}

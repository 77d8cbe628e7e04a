use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{check, map_errors, validate};

/// Forms CLI - Command line tools for declarative form definitions
#[derive(Parser)]
#[command(name = "formc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint a form definition file or every definition in a directory
    Check {
        /// A `*.form.yaml` file or a directory of them
        path: PathBuf,

        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Validate a JSON record against a form definition
    Validate {
        /// Form definition file
        form: PathBuf,

        /// JSON object with the field values
        record: PathBuf,

        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Preview how a backend failure response maps onto form fields
    MapErrors {
        /// Form definition file
        form: PathBuf,

        /// JSON failure response, `{"errors": {...}}`
        response: PathBuf,

        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so json output stays parseable
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli.command) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Check { path, format } => check::execute(&path, &format),
        Commands::Validate {
            form,
            record,
            format,
        } => validate::execute(&form, &record, &format),
        Commands::MapErrors {
            form,
            response,
            format,
        } => map_errors::execute(&form, &response, &format),
    }
}

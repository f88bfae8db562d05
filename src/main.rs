//! Binary entry point for tablesmith.
//!
//! This binary exports entity tables to engine data-table CSV and imports
//! edited files back with replace-all semantics.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tablesmith::config::TablesmithConfig;
use tablesmith::observability::{self, LoggingConfig};

use commands::{cmd_export, cmd_export_all, cmd_import, cmd_kinds, cmd_schema};

/// Environment variable naming an explicit config file.
const ENV_CONFIG_PATH: &str = "TABLESMITH_CONFIG_PATH";

/// Tablesmith - CSV data-table codec for game content.
#[derive(Parser)]
#[command(name = "tablesmith")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the record database (overrides config and `TABLESMITH_DB`).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Export one table as CSV.
    Export {
        /// Entity kind (e.g. `items`, `talent_nodes`).
        kind: String,

        /// Output file (default: stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export every table into `<dir>/<kind>.csv`.
    ExportAll {
        /// Output directory.
        dir: PathBuf,
    },

    /// Import a CSV file, replacing the table's contents.
    Import {
        /// Entity kind.
        kind: String,

        /// CSV file to import.
        file: PathBuf,

        /// Validate without writing.
        #[arg(long)]
        dry_run: bool,
    },

    /// List supported entity kinds.
    Kinds,

    /// Show the loaded schema for a kind.
    Schema {
        /// Entity kind.
        kind: String,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };
    let config = match cli.db.clone() {
        Some(db) => config.with_db_path(db),
        None => config,
    };

    let logging = LoggingConfig::from_settings(Some(&config.logging), cli.verbose);
    if let Err(e) = observability::init(&logging) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(command: Commands, config: &TablesmithConfig) -> tablesmith::Result<()> {
    match command {
        Commands::Export { kind, output } => cmd_export(config, &kind, output),
        Commands::ExportAll { dir } => cmd_export_all(config, &dir),
        Commands::Import {
            kind,
            file,
            dry_run,
        } => cmd_import(config, &kind, &file, dry_run),
        Commands::Kinds => cmd_kinds(),
        Commands::Schema { kind } => cmd_schema(config, &kind),
    }
}

/// Loads configuration: `--config`, then `TABLESMITH_CONFIG_PATH`, then the
/// default location. Environment overrides apply on top.
fn load_config(path: Option<&Path>) -> tablesmith::Result<TablesmithConfig> {
    let config = if let Some(config_path) = path {
        TablesmithConfig::load_from_file(config_path)?
    } else if let Some(config_path) = std::env::var(ENV_CONFIG_PATH)
        .ok()
        .filter(|p| !p.trim().is_empty())
    {
        TablesmithConfig::load_from_file(Path::new(&config_path))?
    } else {
        TablesmithConfig::load_default()?
    };

    Ok(config.with_env_overrides())
}

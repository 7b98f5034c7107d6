//! HMSQ CLI - Hive metastore catalog inspection tool.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hmsq_core::{ErrorCode, HmsConnector, MetastoreConfig, MetastoreError, RetryPolicy};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit codes for CLI operations.
///
/// Following Unix conventions:
/// - 0: Success
/// - 1-127: Application errors
#[repr(i32)]
#[derive(Debug, Clone, Copy)]
pub enum ExitCode {
    /// Successful execution
    Success = 0,
    /// Configuration error (invalid config file, bad endpoint URI)
    ConfigError = 1,
    /// Metastore connectivity or protocol error
    ConnectionError = 2,
    /// Requested namespace or table does not exist
    NotFound = 3,
    /// Operation or table format not supported
    Unsupported = 4,
    /// General runtime error
    RuntimeError = 10,
}

impl ExitCode {
    /// Map an error to an exit code, preferring the structured error code
    /// when the failure came from the connector.
    fn from_error(error: &anyhow::Error) -> Self {
        if let Some(err) = error.downcast_ref::<MetastoreError>() {
            return match err.code() {
                ErrorCode::InvalidConfig => ExitCode::ConfigError,
                ErrorCode::Transient => ExitCode::ConnectionError,
                ErrorCode::NotFound => ExitCode::NotFound,
                ErrorCode::Unsupported => ExitCode::Unsupported,
                _ => ExitCode::RuntimeError,
            };
        }

        let error_str = error.to_string().to_lowercase();
        if error_str.contains("config") || error_str.contains("toml") || error_str.contains("parse")
        {
            ExitCode::ConfigError
        } else {
            ExitCode::RuntimeError
        }
    }
}

mod commands;

#[derive(Parser)]
#[command(name = "hmsq")]
#[command(about = "Hive metastore catalog inspection CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Metastore endpoint URI (overrides the config file)
    #[arg(short, long, global = true)]
    endpoint: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List namespaces (databases)
    Namespaces,

    /// List tables in a namespace
    Tables {
        /// Namespace to list
        namespace: String,
    },

    /// Show a table's metadata
    Table {
        /// Namespace the table lives in
        namespace: String,
        /// Table name
        table: String,
    },

    /// List a table's partitions
    Partitions {
        /// Namespace the table lives in
        namespace: String,
        /// Table name
        table: String,

        /// Partition predicate to push down (e.g. "ds='2024-01-01'")
        #[arg(long, default_value = "")]
        predicate: String,
    },

    /// Validate configuration file
    Validate,
}

fn main() {
    let exit_code = run_cli();
    std::process::exit(exit_code as i32);
}

/// Main CLI execution logic with proper error handling.
fn run_cli() -> ExitCode {
    let cli = Cli::parse();

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match cli.verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    if cli.json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    match execute_command(cli) {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            ExitCode::from_error(&e)
        }
    }
}

/// Execute the CLI command.
fn execute_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Namespaces => {
            let connector = build_connector(&cli)?;
            commands::namespaces::run(&connector)?;
        }

        Commands::Tables { ref namespace } => {
            let connector = build_connector(&cli)?;
            commands::tables::run(&connector, &namespace)?;
        }

        Commands::Table {
            ref namespace,
            ref table,
        } => {
            let connector = build_connector(&cli)?;
            commands::table::run(&connector, &namespace, &table)?;
        }

        Commands::Partitions {
            ref namespace,
            ref table,
            ref predicate,
        } => {
            let connector = build_connector(&cli)?;
            commands::partitions::run(&connector, &namespace, &table, &predicate)?;
        }

        Commands::Validate => {
            let config = load_config(&cli.config)?;
            config.validate()?;
            println!("Configuration is valid");
        }
    }

    Ok(())
}

/// Resolve the connector from the --endpoint flag or the config file.
fn build_connector(cli: &Cli) -> Result<HmsConnector> {
    if let Some(endpoint) = &cli.endpoint {
        return Ok(HmsConnector::from_endpoint("hms", endpoint)?);
    }
    let config = load_config(&cli.config)?;
    let connector = HmsConnector::new(config.catalog.clone(), config.hms_config()?);
    Ok(connector)
}

fn load_config(path: &Option<PathBuf>) -> Result<MetastoreConfig> {
    let path = path.clone().unwrap_or_else(|| PathBuf::from("config.toml"));
    MetastoreConfig::from_file(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

/// Default retry policy applied to CLI-initiated metastore calls.
pub(crate) fn cli_retry_policy() -> RetryPolicy {
    RetryPolicy::default()
}

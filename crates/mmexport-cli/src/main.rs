//! `mmexport` command line tool.
//!
//! Runs package exports in the background and manages the produced archives.

mod commands;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use mmexport_core::{ExporterConfig, JobStatus, default_config_path};
use tracing::{Level, debug, error};

use crate::logging::LoggingConfig;

#[derive(Parser)]
#[command(name = "mmexport")]
#[command(about = "Package content into portable archives", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Content catalog (defaults to catalog.json next to the configuration)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Verbose console logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print errors on the console
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Directory for log files
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export one package, or all packages, in full and slim mode
    Export {
        /// Package slug; every package when omitted
        slug: Option<String>,
    },
    /// List produced archives
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Delete one archive by file name
    Delete {
        /// Archive file name
        file_name: String,
    },
    /// Delete every archive of a package
    DeletePackage {
        /// Package slug
        slug: String,
    },
    /// Rename the archives of a package after its slug changed
    Rename {
        /// Current slug
        old_slug: String,
        /// New slug
        new_slug: String,
    },
    /// Show the progress of the last export
    Status,
}

/// Errors surfaced by the command line tool.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Core library error.
    #[error(transparent)]
    Core(#[from] mmexport_core::Error),

    /// The background export task panicked or was aborted.
    #[error("Export task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Output could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut logging_config = if cli.verbose {
        LoggingConfig::development()
    } else {
        LoggingConfig::production()
    };
    if cli.quiet {
        logging_config = logging_config.with_console_level(Level::ERROR);
    }
    if let Some(dir) = cli.log_dir.clone() {
        logging_config = logging_config.with_log_directory(dir);
    }
    let _guard = match logging::init(&logging_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {e}");
            None
        }
    };

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let catalog_path = cli.catalog.unwrap_or_else(|| {
        config_path
            .parent()
            .map(|dir| dir.join("catalog.json"))
            .unwrap_or_else(|| PathBuf::from("catalog.json"))
    });
    let config = ExporterConfig::load(&config_path)?;
    debug!(
        "Using config {} and catalog {}",
        config_path.display(),
        catalog_path.display()
    );

    match cli.command {
        Command::Export { slug } => {
            let status = commands::export(config, catalog_path, slug).await?;
            Ok(match status {
                JobStatus::Completed => ExitCode::SUCCESS,
                JobStatus::Cancelled => {
                    eprintln!("Export cancelled");
                    ExitCode::from(130)
                }
                _ => ExitCode::FAILURE,
            })
        }
        Command::List { json } => {
            commands::list(&config, &catalog_path, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Delete { file_name } => {
            commands::delete(&config, &catalog_path, &file_name)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::DeletePackage { slug } => {
            commands::delete_package(&config, &catalog_path, &slug)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Rename { old_slug, new_slug } => {
            commands::rename(&config, &catalog_path, &old_slug, &new_slug)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Status => {
            commands::status(&config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

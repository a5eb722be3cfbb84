// plantreg - build a deduplicated power-plant registry from national and aggregator sources

mod build;
mod check;
mod exit_codes;
mod logging;
mod project;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use exit_codes::{EXIT_DATASET, EXIT_EXPORT, EXIT_SUCCESS};
use plantreg_io::IoError;

#[derive(Parser)]
#[command(name = "plantreg")]
#[command(about = "Merge national and aggregator power-plant datasets into one registry")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output (-v debug, -vv trace). Overrides RUST_LOG.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Also append log events to this file
    #[arg(long, global = true, value_name = "PATH", env = "PLANTREG_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the registry from a TOML run configuration
    #[command(after_help = "\
Examples:
  plantreg build registry.toml
  plantreg build registry.toml --dump
  plantreg build registry.toml --json > summary.json
  plantreg build registry.toml --sqlite output/registry.sqlite")]
    Build {
        /// Path to the run configuration
        config: PathBuf,

        /// Also write the audit dump of every candidate (output.dump_csv)
        #[arg(long)]
        dump: bool,

        /// Print the run summary as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Write a SQLite copy of the registry here (overrides output.sqlite)
        #[arg(long, value_name = "PATH")]
        sqlite: Option<PathBuf>,
    },

    /// Check the reference tables named by a run configuration
    #[command(after_help = "\
Examples:
  plantreg check registry.toml
  plantreg check registry.toml --links
  plantreg check registry.toml --json")]
    Check {
        /// Path to the run configuration
        config: PathBuf,

        /// Also load the geolocation and carbon datasets and check concordance links
        #[arg(long)]
        links: bool,

        /// Print findings as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Copy a registry CSV into a new SQLite database
    #[command(after_help = "\
Examples:
  plantreg convert output/registry.csv output/registry.sqlite")]
    Convert {
        /// Registry CSV written by `plantreg build`
        csv: PathBuf,

        /// SQLite database to create (must not already hold a powerplants table)
        sqlite: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("GIT_COMMIT_HASH"),
        ")",
        "\nengine:  plantreg-conflate ",
        env!("CARGO_PKG_VERSION"),
        "\ntarget:  ",
        env!("TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = logging::init(cli.verbose, cli.log_file.as_deref()).and_then(|()| match cli.command {
        Commands::Build {
            config,
            dump,
            json,
            sqlite,
        } => build::cmd_build(&config, dump, json, sqlite),
        Commands::Check { config, links, json } => check::cmd_check(&config, links, json),
        Commands::Convert { csv, sqlite } => cmd_convert(&csv, &sqlite),
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            hint: None,
        }
    }

    /// Export failures get a hint when the target already holds a registry.
    pub fn export(err: IoError) -> Self {
        let hint = match &err {
            IoError::TableExists { .. } => Some("remove the existing database or choose another path".to_string()),
            _ => None,
        };
        Self {
            code: EXIT_EXPORT,
            message: err.to_string(),
            hint,
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// convert
// ============================================================================

fn cmd_convert(csv: &std::path::Path, sqlite: &std::path::Path) -> Result<(), CliError> {
    let rows = plantreg_io::read_registry_csv(csv).map_err(|e| CliError::new(EXIT_DATASET, e.to_string()))?;
    let written = plantreg_io::write_sqlite(sqlite, &rows).map_err(CliError::export)?;
    eprintln!("copied {written} plants from {} to {}", csv.display(), sqlite.display());
    Ok(())
}

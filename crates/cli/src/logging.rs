//! Log setup: stderr always, plus an optional append-only build log.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::exit_codes::EXIT_USAGE;
use crate::CliError;

/// `-v` beats `RUST_LOG`, which beats the `info` default.
fn filter(verbose: u8) -> EnvFilter {
    match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

pub fn init(verbose: u8, log_file: Option<&Path>) -> Result<(), CliError> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path).map_err(|e| {
                CliError {
                    code: EXIT_USAGE,
                    message: format!("cannot open log file {}: {e}", path.display()),
                    hint: None,
                }
            })?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter(verbose))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError {
            code: EXIT_USAGE,
            message: format!("cannot install logger: {e}"),
            hint: None,
        })
}

//! `plantreg build` - load, conflate, export.

use std::path::{Path, PathBuf};

use plantreg_conflate::{run, AdmissionStep};
use plantreg_io::export::registry_rows;
use plantreg_io::{write_dump_csv, write_registry_csv, write_sqlite};
use serde_json::json;
use tracing::info;

use crate::exit_codes::{EXIT_EXPORT, EXIT_INVALID_CONFIG, EXIT_USAGE};
use crate::project::Project;
use crate::CliError;

pub fn cmd_build(config_path: &Path, dump: bool, json_output: bool, sqlite: Option<PathBuf>) -> Result<(), CliError> {
    let project = Project::load(config_path)?;
    let config = &project.config;

    let dump_path = match (dump, project.dump_csv()) {
        (false, _) => None,
        (true, Some(path)) => Some(path),
        (true, None) => {
            return Err(CliError::new(EXIT_USAGE, "--dump needs a dump path")
                .with_hint("set output.dump_csv in the config"));
        }
    };
    let sqlite_path = sqlite.or_else(|| project.sqlite());

    info!(config = %config_path.display(), name = %config.name, "building registry");
    let tables = project.load_tables()?;
    let input = project.load_input(&tables)?;

    let result = run(config, &tables.countries, &tables.concordance, &input)
        .map_err(|e| CliError::new(EXIT_INVALID_CONFIG, e.to_string()))?;

    let years = &config.generation_years;
    let registry_path = project.registry_csv();
    write_registry_csv(&registry_path, &result.registry, years).map_err(CliError::export)?;

    let dumped = match dump_path {
        Some(ref path) => write_dump_csv(path, &result.audit, years).map_err(CliError::export)?,
        None => 0,
    };
    if let Some(ref path) = sqlite_path {
        // A rebuild replaces the previous database
        if path.exists() {
            std::fs::remove_file(path)
                .map_err(|e| CliError::new(EXIT_EXPORT, format!("cannot replace {}: {e}", path.display())))?;
        }
        write_sqlite(path, &registry_rows(&result.registry, years)).map_err(CliError::export)?;
    }

    if json_output {
        let out = json!({
            "meta": result.meta,
            "summary": result.summary,
            "outputs": {
                "registry_csv": registry_path.display().to_string(),
                "dump_csv": dump_path.as_ref().map(|p| p.display().to_string()),
                "sqlite": sqlite_path.as_ref().map(|p| p.display().to_string()),
            },
        });
        let text = serde_json::to_string_pretty(&out)
            .map_err(|e| CliError::new(EXIT_USAGE, format!("JSON serialization error: {e}")))?;
        println!("{text}");
    }

    // Human summary to stderr
    let s = &result.summary;
    eprintln!(
        "{}: {} plants ({} with generation data) from {} candidates, {} excluded, {} carbon records consumed",
        result.meta.config_name, s.total_plants, s.with_generation, s.candidates, s.excluded, s.consumed_carbon,
    );
    for step in AdmissionStep::ORDER {
        let added = s.by_step.get(&step.to_string()).copied().unwrap_or(0);
        eprintln!("  {:<24} {added}", step.to_string());
    }
    eprintln!("wrote {}", registry_path.display());
    if let Some(path) = dump_path {
        eprintln!("wrote {} ({dumped} rows)", path.display());
    }
    if let Some(path) = sqlite_path {
        eprintln!("wrote {}", path.display());
    }

    Ok(())
}

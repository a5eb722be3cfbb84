//! `plantreg check` - validate the reference tables before a build.

use std::path::Path;

use plantreg_conflate::check::{check_concordance, check_countries, check_fuel_groups, check_source_codes};
use plantreg_conflate::CheckReport;
use plantreg_io::read_alias_groups;

use crate::exit_codes::{EXIT_CHECK_FAILED, EXIT_INVALID_CONFIG, EXIT_USAGE};
use crate::project::{resource_err, Project};
use crate::CliError;

pub fn cmd_check(config_path: &Path, links: bool, json_output: bool) -> Result<(), CliError> {
    let project = Project::load(config_path)?;
    let config = &project.config;
    let mut report = CheckReport::new();

    let groups = read_alias_groups(&project.resolve(&config.resources.fuel_thesaurus)).map_err(resource_err)?;
    check_fuel_groups(&groups, &mut report);

    let countries = project.load_countries()?;
    check_countries(&countries, &mut report);

    let concordance = project.load_concordance()?;
    let codes = concordance.codes();
    let wiki = config
        .wiki_code()
        .map_err(|e| CliError::new(EXIT_INVALID_CONFIG, e.to_string()))?;
    check_source_codes(
        &countries,
        &[
            ("global", &codes.global),
            ("geolocation", &codes.geolocation),
            ("carbon", &codes.carbon),
            ("fourth", &codes.fourth),
            ("wiki", &wiki),
        ],
        &mut report,
    );

    let (geolocation, carbon) = if links {
        (
            Some(project.load_source(&config.sources.geolocation.file, &codes.geolocation, None)?),
            Some(project.load_source(&config.sources.carbon.file, &codes.carbon, None)?),
        )
    } else {
        (None, None)
    };
    check_concordance(&concordance, geolocation.as_ref(), carbon.as_ref(), &mut report);

    if json_output {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::new(EXIT_USAGE, format!("JSON serialization error: {e}")))?;
        println!("{text}");
    }

    for finding in report.findings() {
        eprintln!("{}: {}: {}", finding.severity, finding.table, finding.message);
    }
    let errors = report.errors().count();
    let warnings = report.warnings().count();
    eprintln!(
        "checked {} fuel labels, {} countries, {} concordance rows: {errors} errors, {warnings} warnings",
        groups.len(),
        countries.len(),
        concordance.len(),
    );

    if !report.is_ok() {
        return Err(CliError::new(EXIT_CHECK_FAILED, format!("{errors} reference table errors")));
    }
    Ok(())
}

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;

use crate::concordance::Concordance;
use crate::country::CountryReference;
use crate::id::{DatasetCode, PlantId};
use crate::model::Dataset;
use crate::thesaurus::AliasGroup;

/// Broken links quoted per finding before the list is cut short.
const SAMPLE_IDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub table: &'static str,
    pub message: String,
}

/// Findings from checking the reference tables. Errors fail the check,
/// warnings are reported only.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    findings: Vec<Finding>,
}

impl CheckReport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, severity: Severity, table: &'static str, message: String) {
        self.findings.push(Finding { severity, table, message });
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Warning)
    }

    pub fn is_ok(&self) -> bool {
        self.errors().next().is_none()
    }
}

/// Fuel thesaurus rows as read from the file, before any case folding.
pub fn check_fuel_groups(groups: &[AliasGroup], report: &mut CheckReport) {
    const TABLE: &str = "fuel thesaurus";

    if groups.is_empty() {
        report.push(Severity::Error, TABLE, "no fuel labels defined".into());
        return;
    }

    let mut owners: HashMap<String, &str> = HashMap::new();
    for (index, group) in groups.iter().enumerate() {
        let label = group.label.trim();
        if label.is_empty() {
            report.push(Severity::Error, TABLE, format!("row {} has an empty canonical label", index + 1));
            continue;
        }
        if owners.insert(label.to_lowercase(), label).is_some() {
            report.push(Severity::Error, TABLE, format!("label '{label}' is defined more than once"));
        }
    }

    for group in groups {
        let label = group.label.trim();
        for alias in group.aliases.iter().map(|a| a.trim()).filter(|a| !a.is_empty()) {
            if alias != alias.to_lowercase() {
                report.push(
                    Severity::Error,
                    TABLE,
                    format!("alias '{alias}' of '{label}' is not lower-case"),
                );
            }
            let key = alias.to_lowercase();
            match owners.get(&key) {
                Some(owner) if !owner.eq_ignore_ascii_case(label) => report.push(
                    Severity::Error,
                    TABLE,
                    format!("alias '{alias}' is claimed by both '{owner}' and '{label}'"),
                ),
                Some(_) => {}
                None => {
                    owners.insert(key, label);
                }
            }
        }
    }
}

pub fn check_countries(countries: &CountryReference, report: &mut CheckReport) {
    const TABLE: &str = "country information";

    if countries.is_empty() {
        report.push(Severity::Error, TABLE, "no countries defined".into());
        return;
    }

    if let Err(e) = countries.thesaurus() {
        report.push(Severity::Error, TABLE, e.to_string());
    }

    let mut iso3: BTreeMap<&str, &str> = BTreeMap::new();
    for country in countries.iter() {
        if country.iso3.len() != 3 || !country.iso3.chars().all(|c| c.is_ascii_uppercase()) {
            report.push(
                Severity::Error,
                TABLE,
                format!("{}: iso3 '{}' is not three uppercase letters", country.name, country.iso3),
            );
        }
        if let Some(other) = iso3.insert(country.iso3.as_str(), country.name.as_str()) {
            report.push(
                Severity::Error,
                TABLE,
                format!("iso3 '{}' is shared by '{other}' and '{}'", country.iso3, country.name),
            );
        }
        if country.has_national_source && country.use_geolocation_source {
            report.push(
                Severity::Warning,
                TABLE,
                format!("{}: geolocation flag is ignored because a national source is set", country.name),
            );
        }
    }
}

/// A national dataset is keyed by its country's iso3, so that code must not
/// also name an aggregator source (`GEO` is Georgia).
pub fn check_source_codes(countries: &CountryReference, sources: &[(&str, &DatasetCode)], report: &mut CheckReport) {
    const TABLE: &str = "country information";

    for country in countries.national_countries() {
        if let Some((role, _)) = sources.iter().find(|(_, code)| code.as_str() == country.iso3) {
            report.push(
                Severity::Error,
                TABLE,
                format!("{}: iso3 '{}' is also the {role} source code", country.name, country.iso3),
            );
        }
    }
}

/// Links into datasets that are not loaded are not checked.
pub fn check_concordance(
    concordance: &Concordance,
    geolocation: Option<&Dataset>,
    carbon: Option<&Dataset>,
    report: &mut CheckReport,
) {
    const TABLE: &str = "concordance";

    if concordance.is_empty() {
        report.push(Severity::Warning, TABLE, "no concordance rows; aggregator links are disabled".into());
        return;
    }

    let mut missing_geo: Vec<&PlantId> = Vec::new();
    let mut missing_carbon: Vec<&PlantId> = Vec::new();
    for (_, links) in concordance.iter() {
        if let (Some(id), Some(dataset)) = (&links.geolocation, geolocation) {
            if dataset.get(id).is_none() {
                missing_geo.push(id);
            }
        }
        if let (Some(id), Some(dataset)) = (&links.carbon, carbon) {
            if dataset.get(id).is_none() {
                missing_carbon.push(id);
            }
        }
    }

    for (missing, code) in [
        (missing_geo, &concordance.codes().geolocation),
        (missing_carbon, &concordance.codes().carbon),
    ] {
        if missing.is_empty() {
            continue;
        }
        let mut sorted = missing;
        sorted.sort();
        let sample: Vec<String> = sorted.iter().take(SAMPLE_IDS).map(|id| id.to_string()).collect();
        report.push(
            Severity::Warning,
            TABLE,
            format!(
                "{} link(s) point at ids missing from the {code} dataset (e.g. {})",
                sorted.len(),
                sample.join(", ")
            ),
        );
    }
}

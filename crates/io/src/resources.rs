// Reference tables: fuel thesaurus, country information, plant concordance

use std::path::Path;

use plantreg_conflate::{
    AliasGroup, Concordance, ConcordanceCodes, ConcordanceRow, CountryInfo, CountryReference, FuelThesaurus,
};
use tracing::info;

use crate::encoding::read_file_as_utf8;
use crate::error::IoError;

/// Header-skipping, ragged-row reader used by all reference tables.
fn records(data: &str, context: &str) -> Result<Vec<csv::StringRecord>, IoError> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data.as_bytes())
        .records()
        .collect::<Result<_, _>>()
        .map_err(|source| IoError::Csv {
            context: context.to_string(),
            source,
        })
}

fn context_of(path: &Path) -> String {
    path.display().to_string()
}

// ---------------------------------------------------------------------------
// Fuel thesaurus
// ---------------------------------------------------------------------------

/// One group per row: canonical label first, aliases after. Cells are
/// trimmed but keep their case so the table can be checked as written.
pub fn parse_alias_groups(data: &str, context: &str) -> Result<Vec<AliasGroup>, IoError> {
    let mut groups = Vec::new();
    for record in records(data, context)? {
        let mut cells = record.iter().map(str::trim).filter(|c| !c.is_empty());
        let Some(label) = cells.next() else { continue };
        groups.push(AliasGroup::new(label, cells));
    }
    Ok(groups)
}

pub fn read_alias_groups(path: &Path) -> Result<Vec<AliasGroup>, IoError> {
    parse_alias_groups(&read_file_as_utf8(path)?, &context_of(path))
}

pub fn load_fuel_thesaurus(path: &Path) -> Result<FuelThesaurus, IoError> {
    let groups = read_alias_groups(path)?;
    let thesaurus = FuelThesaurus::from_groups(&groups)?;
    info!(
        labels = thesaurus.thesaurus().len(),
        aliases = thesaurus.thesaurus().alias_count(),
        "loaded fuel thesaurus"
    );
    Ok(thesaurus)
}

// ---------------------------------------------------------------------------
// Country information
// ---------------------------------------------------------------------------

const COUNTRY_COLUMNS: usize = 5;

fn parse_flag(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" | "" => Some(false),
        _ => None,
    }
}

fn optional_cell(record: &csv::StringRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// Columns: name, iso3, iso2, has_national_source, use_geolocation_source,
/// geolocation_name, carbon_name, curated_table_key.
pub fn parse_country_reference(data: &str, context: &str) -> Result<CountryReference, IoError> {
    let mut entries = Vec::new();
    for (index, record) in records(data, context)?.iter().enumerate() {
        let row = index + 2;
        let malformed = |message: String| IoError::MalformedRow {
            context: context.to_string(),
            row,
            message,
        };
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        if record.len() < COUNTRY_COLUMNS {
            return Err(malformed(format!(
                "expected at least {COUNTRY_COLUMNS} columns, found {}",
                record.len()
            )));
        }
        let name = record[0].trim();
        if name.is_empty() {
            return Err(malformed("country name is empty".into()));
        }
        let flag = |i: usize, column: &str| {
            parse_flag(&record[i]).ok_or_else(|| malformed(format!("{column} must be 0 or 1, got '{}'", &record[i])))
        };
        entries.push(CountryInfo {
            name: name.to_string(),
            iso3: record[1].trim().to_string(),
            iso2: record[2].trim().to_string(),
            has_national_source: flag(3, "has_national_source")?,
            use_geolocation_source: flag(4, "use_geolocation_source")?,
            geolocation_name: optional_cell(record, 5),
            carbon_name: optional_cell(record, 6),
            curated_table_key: optional_cell(record, 7),
        });
    }
    Ok(CountryReference::from_entries(entries)?)
}

pub fn load_country_reference(path: &Path) -> Result<CountryReference, IoError> {
    let countries = parse_country_reference(&read_file_as_utf8(path)?, &context_of(path))?;
    info!(
        countries = countries.len(),
        national = countries.national_countries().count(),
        "loaded country information"
    );
    Ok(countries)
}

// ---------------------------------------------------------------------------
// Concordance
// ---------------------------------------------------------------------------

/// Columns: global number, then optional geolocation, carbon and fourth
/// numbers. Numbers are the digits of the linked ids.
pub fn parse_concordance(data: &str, context: &str, codes: ConcordanceCodes) -> Result<Concordance, IoError> {
    let mut rows = Vec::new();
    for (index, record) in records(data, context)?.iter().enumerate() {
        let row = index + 2;
        let number = |i: usize| -> Result<Option<u32>, IoError> {
            match record.get(i).map(str::trim).filter(|c| !c.is_empty()) {
                None => Ok(None),
                Some(cell) => cell.parse().map(Some).map_err(|_| IoError::MalformedRow {
                    context: context.to_string(),
                    row,
                    message: format!("column {} is not a plant number: '{cell}'", i + 1),
                }),
            }
        };
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let global = number(0)?.ok_or_else(|| IoError::MalformedRow {
            context: context.to_string(),
            row,
            message: "global plant number is empty".into(),
        })?;
        rows.push(ConcordanceRow {
            global,
            geolocation: number(1)?,
            carbon: number(2)?,
            fourth: number(3)?,
        });
    }
    Ok(Concordance::from_rows(codes, rows)?)
}

pub fn load_concordance(path: &Path, codes: ConcordanceCodes) -> Result<Concordance, IoError> {
    let concordance = parse_concordance(&read_file_as_utf8(path)?, &context_of(path), codes)?;
    info!(rows = concordance.len(), "loaded concordance");
    Ok(concordance)
}

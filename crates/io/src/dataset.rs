// Source datasets: JSON record lists or registry-format CSV

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use plantreg_conflate::text::{clean_cell, clean_optional, clean_text};
use plantreg_conflate::{
    CountryReference, CountryThesaurus, Dataset, DatasetCode, FuelThesaurus, GenerationPeriod, PlantId, PlantRecord,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::encoding::read_file_as_utf8;
use crate::error::IoError;
use crate::row::{generation_year, RegistryRow, MAX_FUELS, WARNING_BANNER};

/// Controlled vocabularies applied to every loaded record.
#[derive(Debug, Clone, Copy)]
pub struct Vocabulary<'a> {
    pub fuel: &'a FuelThesaurus,
    pub country: &'a CountryThesaurus,
}

impl Vocabulary<'_> {
    fn apply(&self, record: &mut PlantRecord) {
        let raw_fuels = std::mem::take(&mut record.fuel);
        record.fuel = raw_fuels.iter().flat_map(|f| self.fuel.standardize(f)).collect();
        record.country = record.country.as_deref().and_then(|c| self.country.standardize(c));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Json,
    Csv,
}

impl DatasetFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

pub fn load_dataset(path: &Path, code: &DatasetCode, vocabulary: Option<Vocabulary<'_>>) -> Result<Dataset, IoError> {
    let format = DatasetFormat::from_path(path).ok_or_else(|| IoError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    let data = read_file_as_utf8(path)?;
    let dataset = parse_dataset(&data, format, &path.display().to_string(), code, vocabulary)?;
    info!(dataset = %code, plants = dataset.len(), path = %path.display(), "loaded dataset");
    Ok(dataset)
}

pub fn parse_dataset(
    data: &str,
    format: DatasetFormat,
    context: &str,
    code: &DatasetCode,
    vocabulary: Option<Vocabulary<'_>>,
) -> Result<Dataset, IoError> {
    let mut records = match format {
        DatasetFormat::Json => parse_json_records(data, context)?,
        DatasetFormat::Csv => parse_registry_csv(data, context)?
            .into_iter()
            .filter_map(|row| row_to_record(row, context))
            .collect(),
    };
    if let Some(vocabulary) = vocabulary {
        records.iter_mut().for_each(|r| vocabulary.apply(r));
    }
    Ok(Dataset::from_records(code.clone(), records)?)
}

/// `<dir>/<ISO3>.json` or `<dir>/<ISO3>.csv` for every country flagged with
/// a national source. The ISO3 code doubles as the dataset code.
pub fn load_national_datasets(
    directory: &Path,
    countries: &CountryReference,
    vocabulary: Option<Vocabulary<'_>>,
) -> Result<BTreeMap<String, Dataset>, IoError> {
    let mut datasets = BTreeMap::new();
    for country in countries.national_countries() {
        let code = DatasetCode::new(&country.iso3)?;
        let path = national_file(directory, &country.iso3).ok_or_else(|| IoError::Read {
            path: directory.join(format!("{}.json", country.iso3)),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no national dataset for {}", country.name),
            ),
        })?;
        datasets.insert(country.name.clone(), load_dataset(&path, &code, vocabulary)?);
    }
    Ok(datasets)
}

fn national_file(directory: &Path, iso3: &str) -> Option<PathBuf> {
    ["json", "csv"]
        .iter()
        .map(|ext| directory.join(format!("{iso3}.{ext}")))
        .find(|p| p.is_file())
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

const NUMERIC_FIELDS: [&str; 3] = ["capacity_mw", "capacity_year", "commissioning_year"];
const INTEGER_FIELDS: [&str; 1] = ["capacity_year"];

/// A JSON array of records. A record that cannot be read is dropped with a
/// warning; the rest of the file still loads.
fn parse_json_records(data: &str, context: &str) -> Result<Vec<PlantRecord>, IoError> {
    let values: Vec<Value> = serde_json::from_str(data).map_err(|source| IoError::Json {
        context: context.to_string(),
        source,
    })?;

    let mut records = Vec::with_capacity(values.len());
    for (index, mut value) in values.into_iter().enumerate() {
        sanitize_numbers(&mut value, context, index);
        match serde_json::from_value::<PlantRecord>(value) {
            Ok(mut record) => {
                record.name = clean_text(&record.name);
                if record.name.is_empty() {
                    warn!(context, id = %record.id, "record without a name dropped");
                    continue;
                }
                record.owner = clean_optional(record.owner.as_deref());
                record.source = clean_optional(record.source.as_deref());
                record.url = clean_optional(record.url.as_deref());
                records.push(record);
            }
            Err(e) => warn!(context, index, error = %e, "unreadable record dropped"),
        }
    }
    Ok(records)
}

/// Numeric fields that arrive as text are parsed; anything unparsable
/// becomes null so the record still loads.
fn sanitize_numbers(value: &mut Value, context: &str, index: usize) {
    let Some(object) = value.as_object_mut() else { return };

    for field in NUMERIC_FIELDS {
        if let Some(slot) = object.get_mut(field) {
            *slot = numeric_value(slot, INTEGER_FIELDS.contains(&field), context, index, field);
        }
    }
    if let Some(location) = object.get_mut("location").and_then(Value::as_object_mut) {
        for field in ["latitude", "longitude"] {
            if let Some(slot) = location.get_mut(field) {
                *slot = numeric_value(slot, false, context, index, field);
            }
        }
    }
}

fn numeric_value(slot: &Value, integer: bool, context: &str, index: usize, field: &str) -> Value {
    let number = match slot {
        Value::Null => return Value::Null,
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => return Value::Null,
        Value::String(s) => parse_number(s),
        _ => None,
    };
    match number {
        Some(n) if integer && n.fract() == 0.0 => Value::from(n as i64),
        Some(n) if !integer => Value::from(n),
        _ => {
            warn!(context, index, field, value = %slot, "unparsable number treated as missing");
            Value::Null
        }
    }
}

// ---------------------------------------------------------------------------
// Registry CSV
// ---------------------------------------------------------------------------

/// Numbers may carry thousands separators.
fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().replace(',', "").parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Strip the warning banner if the file starts with one.
fn skip_banner(data: &str) -> &str {
    let first = data.lines().next().unwrap_or_default();
    if first.trim() == WARNING_BANNER || first.starts_with("NOTE:") {
        data.get(first.len()..).map(|rest| rest.trim_start_matches(['\r', '\n'])).unwrap_or_default()
    } else {
        data
    }
}

/// Rows of a registry-format CSV (registry or dump layout). Rows without
/// an id or a name are dropped with a warning; unparsable numbers become
/// missing values.
pub fn parse_registry_csv(data: &str, context: &str) -> Result<Vec<RegistryRow>, IoError> {
    let csv_error = |source| IoError::Csv {
        context: context.to_string(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(skip_banner(data).as_bytes());

    let headers = reader.headers().map_err(csv_error)?.clone();
    let columns: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h.trim(), i)).collect();
    for required in ["id", "name"] {
        if !columns.contains_key(required) {
            return Err(IoError::MissingColumn {
                context: context.to_string(),
                column: required.to_string(),
            });
        }
    }
    let years: Vec<(i32, usize)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| generation_year(h.trim()).map(|y| (y, i)))
        .collect();

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(csv_error)?;
        let line = index + 2;
        let cell = |name: &str| -> Option<&str> {
            columns
                .get(name)
                .and_then(|&i| record.get(i))
                .map(str::trim)
                .filter(|c| !c.is_empty())
        };
        let number = |name: &str| -> Option<f64> {
            let raw = cell(name)?;
            let parsed = parse_number(raw);
            if parsed.is_none() {
                warn!(context, line, column = name, value = raw, "unparsable number treated as missing");
            }
            parsed
        };
        let text = |name: &str| cell(name).and_then(clean_cell);

        let (Some(id), Some(name)) = (cell("id"), text("name")) else {
            warn!(context, line, "row without an id or a name dropped");
            continue;
        };

        rows.push(RegistryRow {
            name,
            id: id.to_string(),
            in_registry: cell("in_registry").map(|v| v.eq_ignore_ascii_case("yes")),
            capacity_mw: number("capacity_mw"),
            capacity_year: number("year_of_capacity_data").map(|y| y as i32),
            country: text("country"),
            owner: text("owner"),
            source: text("source"),
            url: cell("url").map(str::to_string),
            latitude: number("latitude"),
            longitude: number("longitude"),
            fuels: (1..=MAX_FUELS).filter_map(|i| cell(&format!("fuel{i}")).map(str::to_string)).collect(),
            generation: years
                .iter()
                .map(|&(year, i)| {
                    let gwh = record.get(i).map(str::trim).filter(|c| !c.is_empty()).and_then(|raw| {
                        let parsed = parse_number(raw);
                        if parsed.is_none() {
                            warn!(context, line, year, value = raw, "unparsable generation treated as missing");
                        }
                        parsed
                    });
                    (year, gwh)
                })
                .collect(),
            commissioning_year: number("commissioning_year"),
            estimated_generation_gwh: number("estimated_generation_gwh"),
            geolocation_source: text("geolocation_source"),
            consumed_by: cell("consumed_by").map(str::to_string),
        });
    }
    Ok(rows)
}

/// Registry rows read back from a file written by the export.
pub fn read_registry_csv(path: &Path) -> Result<Vec<RegistryRow>, IoError> {
    parse_registry_csv(&read_file_as_utf8(path)?, &path.display().to_string())
}

/// Rebuild a plant record from a registry row. Rows whose id cannot be
/// parsed are dropped with a warning.
pub fn row_to_record(row: RegistryRow, context: &str) -> Option<PlantRecord> {
    let id: PlantId = match row.id.parse() {
        Ok(id) => id,
        Err(e) => {
            warn!(context, id = %row.id, error = %e, "row with an invalid id dropped");
            return None;
        }
    };

    let mut record = PlantRecord::new(id, row.name);
    record.country = row.country;
    record.owner = row.owner;
    record.source = row.source;
    record.url = row.url;
    record.capacity_mw = row.capacity_mw;
    record.capacity_year = row.capacity_year;
    record.fuel = row.fuels.into_iter().collect();
    record.location.latitude = row.latitude;
    record.location.longitude = row.longitude;
    record.commissioning_year = row.commissioning_year;

    for (year, gwh) in row.generation {
        if gwh.is_none() {
            continue;
        }
        match GenerationPeriod::for_year(gwh, year) {
            Ok(period) => record.generation.push(period),
            Err(e) => warn!(context, id = %record.id, year, error = %e, "generation year skipped"),
        }
    }
    if let Some(gwh) = row.estimated_generation_gwh {
        if let Ok(period) = GenerationPeriod::new(Some(gwh), None) {
            record.generation.push(period.mark_estimated());
        }
    }
    Some(record)
}

// Flat registry row: the CSV/SQLite shape of a plant record

use plantreg_conflate::{AuditEntry, PlantRecord};
use tracing::warn;

/// First line of every registry CSV, ahead of the header row.
pub const WARNING_BANNER: &str =
    "NOTE: compiled registry of national and aggregator sources; verify critical values against the original sources before use.";

/// Fuel columns available per row.
pub const MAX_FUELS: usize = 4;

const GENERATION_PREFIX: &str = "generation_gwh_";

/// Column layout of a registry file. Generation columns follow the
/// configured year window; the dump layout adds the audit columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    years: Vec<i32>,
    dump: bool,
}

impl Layout {
    pub fn registry(years: &[i32]) -> Self {
        Self {
            years: years.to_vec(),
            dump: false,
        }
    }

    pub fn dump(years: &[i32]) -> Self {
        Self {
            years: years.to_vec(),
            dump: true,
        }
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn is_dump(&self) -> bool {
        self.dump
    }

    pub fn header(&self) -> Vec<String> {
        let mut header: Vec<String> = vec!["name".into(), "id".into()];
        if self.dump {
            header.push("in_registry".into());
        }
        header.extend(
            [
                "capacity_mw",
                "year_of_capacity_data",
                "country",
                "owner",
                "source",
                "url",
                "latitude",
                "longitude",
            ]
            .map(String::from),
        );
        header.extend((1..=MAX_FUELS).map(|i| format!("fuel{i}")));
        header.extend(self.years.iter().map(|y| format!("{GENERATION_PREFIX}{y}")));
        header.extend(["commissioning_year", "estimated_generation_gwh", "geolocation_source"].map(String::from));
        if self.dump {
            header.push("consumed_by".into());
        }
        header
    }
}

/// One registry row with every value already flattened to output form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryRow {
    pub name: String,
    pub id: String,
    pub in_registry: Option<bool>,
    pub capacity_mw: Option<f64>,
    pub capacity_year: Option<i32>,
    pub country: Option<String>,
    pub owner: Option<String>,
    pub source: Option<String>,
    pub url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub fuels: Vec<String>,
    /// Generation per year, keyed in layout order.
    pub generation: Vec<(i32, Option<f64>)>,
    pub commissioning_year: Option<f64>,
    pub estimated_generation_gwh: Option<f64>,
    pub geolocation_source: Option<String>,
    pub consumed_by: Option<String>,
}

impl RegistryRow {
    pub fn from_record(record: &PlantRecord, years: &[i32]) -> Self {
        if record.fuel.len() > MAX_FUELS {
            warn!(
                id = %record.id,
                fuels = record.fuel.len(),
                "more than {MAX_FUELS} fuels, extra fuels dropped from export"
            );
        }
        Self {
            name: record.name.clone(),
            id: record.id.to_string(),
            in_registry: None,
            capacity_mw: record.capacity_mw,
            capacity_year: record.capacity_year,
            country: record.country.clone(),
            owner: record.owner.clone(),
            source: record.source.clone(),
            url: record.url.clone(),
            latitude: record.location.latitude,
            longitude: record.location.longitude,
            fuels: record.fuel.iter().take(MAX_FUELS).cloned().collect(),
            generation: years.iter().map(|&y| (y, record.annual_generation(y))).collect(),
            commissioning_year: record.commissioning_year,
            estimated_generation_gwh: record.estimated_generation(),
            geolocation_source: record.coordinate_source().map(ToString::to_string),
            consumed_by: None,
        }
    }

    pub fn from_audit(entry: &AuditEntry, years: &[i32]) -> Self {
        Self {
            in_registry: Some(entry.in_registry),
            consumed_by: entry.consumed_by.as_ref().map(ToString::to_string),
            ..Self::from_record(&entry.record, years)
        }
    }

    pub fn generation_for(&self, year: i32) -> Option<f64> {
        self.generation.iter().find(|(y, _)| *y == year).and_then(|(_, gwh)| *gwh)
    }

    /// Cells in `layout` order. Missing values are empty cells.
    pub fn to_fields(&self, layout: &Layout) -> Vec<String> {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let num = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();

        let mut fields = vec![self.name.clone(), self.id.clone()];
        if layout.dump {
            fields.push(yes_no(self.in_registry.unwrap_or(false)).to_string());
        }
        fields.push(num(self.capacity_mw));
        fields.push(self.capacity_year.map(|y| y.to_string()).unwrap_or_default());
        fields.push(text(&self.country));
        fields.push(text(&self.owner));
        fields.push(text(&self.source));
        fields.push(text(&self.url));
        fields.push(num(self.latitude));
        fields.push(num(self.longitude));
        for i in 0..MAX_FUELS {
            fields.push(self.fuels.get(i).cloned().unwrap_or_default());
        }
        for &year in &layout.years {
            fields.push(num(self.generation_for(year)));
        }
        fields.push(num(self.commissioning_year));
        fields.push(num(self.estimated_generation_gwh));
        fields.push(text(&self.geolocation_source));
        if layout.dump {
            fields.push(text(&self.consumed_by));
        }
        fields
    }
}

pub fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// Year encoded in a `generation_gwh_<year>` column name.
pub fn generation_year(column: &str) -> Option<i32> {
    column.strip_prefix(GENERATION_PREFIX)?.parse().ok()
}

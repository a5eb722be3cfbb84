use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ConflateError;
use crate::id::{DatasetCode, PlantId};

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// Geolocation in WGS84 degrees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            description: None,
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }

    /// Both coordinates, when the location counts as present.
    ///
    /// A zero coordinate is the "no data" sentinel used by several agency
    /// exports, so `(0, 0)` and half-zero pairs are treated as missing.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let usable = |v: Option<f64>| v.filter(|x| x.is_finite() && *x != 0.0);
        Some((usable(self.latitude)?, usable(self.longitude)?))
    }

    pub fn is_present(&self) -> bool {
        self.coordinates().is_some()
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Generation reported (or estimated) for one period.
///
/// The period dates are either both present with `end >= start`, or both
/// absent. Deserialization goes through the same check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGenerationPeriod")]
pub struct GenerationPeriod {
    gwh: Option<f64>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    source: Option<String>,
    estimated: bool,
}

#[derive(Deserialize)]
struct RawGenerationPeriod {
    #[serde(default)]
    gwh: Option<f64>,
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default)]
    end_date: Option<NaiveDate>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    estimated: bool,
}

impl TryFrom<RawGenerationPeriod> for GenerationPeriod {
    type Error = ConflateError;

    fn try_from(raw: RawGenerationPeriod) -> Result<Self, Self::Error> {
        let span = match (raw.start_date, raw.end_date) {
            (Some(start), Some(end)) => Some((start, end)),
            (None, None) => None,
            (start, end) => {
                return Err(ConflateError::InvalidPeriod(format!(
                    "start {start:?} and end {end:?} must both be present or both absent"
                )))
            }
        };
        let mut period = Self::new(raw.gwh, span)?;
        period.source = raw.source;
        period.estimated = raw.estimated;
        Ok(period)
    }
}

impl GenerationPeriod {
    pub fn new(gwh: Option<f64>, span: Option<(NaiveDate, NaiveDate)>) -> Result<Self, ConflateError> {
        if let Some((start, end)) = span {
            if end < start {
                return Err(ConflateError::InvalidPeriod(format!(
                    "end {end} precedes start {start}"
                )));
            }
        }
        Ok(Self {
            gwh,
            start_date: span.map(|(start, _)| start),
            end_date: span.map(|(_, end)| end),
            source: None,
            estimated: false,
        })
    }

    /// Generation for a full calendar year.
    pub fn for_year(gwh: Option<f64>, year: i32) -> Result<Self, ConflateError> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| ConflateError::InvalidPeriod(format!("year {year} out of range")))?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| ConflateError::InvalidPeriod(format!("year {year} out of range")))?;
        Self::new(gwh, Some((start, end)))
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn mark_estimated(mut self) -> Self {
        self.estimated = true;
        self
    }

    pub fn gwh(&self) -> Option<f64> {
        self.gwh
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn is_estimated(&self) -> bool {
        self.estimated
    }

    /// Calendar year covered, when the period starts and ends in the same year.
    pub fn calendar_year(&self) -> Option<i32> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if start.year() == end.year() => Some(start.year()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

/// Which dataset's coordinates a registry entry ultimately uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinateSource {
    /// Coordinates from a country's own authoritative dataset.
    National { country: String },
    /// Coordinates from an aggregator or niche dataset, by display label.
    Dataset { label: String },
}

impl fmt::Display for CoordinateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::National { country } => write!(f, "{country} national data"),
            Self::Dataset { label } => write!(f, "{label} data"),
        }
    }
}

impl Serialize for CoordinateSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Input slot a dataset fills in a conflation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRole {
    National,
    Global,
    Geolocation,
    Carbon,
    Wiki,
}

impl fmt::Display for SourceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::National => write!(f, "national"),
            Self::Global => write!(f, "global"),
            Self::Geolocation => write!(f, "geolocation"),
            Self::Carbon => write!(f, "carbon"),
            Self::Wiki => write!(f, "wiki"),
        }
    }
}

/// Admission rule that accepted a plant into the registry, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionStep {
    National,
    GlobalDirect,
    GlobalViaGeolocation,
    GlobalViaCarbon,
    GeolocationPrimary,
    Wiki,
}

impl AdmissionStep {
    /// Every step, in the order the pipeline applies them.
    pub const ORDER: [AdmissionStep; 6] = [
        Self::National,
        Self::GlobalDirect,
        Self::GlobalViaGeolocation,
        Self::GlobalViaCarbon,
        Self::GeolocationPrimary,
        Self::Wiki,
    ];
}

impl fmt::Display for AdmissionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::National => write!(f, "national"),
            Self::GlobalDirect => write!(f, "global_direct"),
            Self::GlobalViaGeolocation => write!(f, "global_via_geolocation"),
            Self::GlobalViaCarbon => write!(f, "global_via_carbon"),
            Self::GeolocationPrimary => write!(f, "geolocation_primary"),
            Self::Wiki => write!(f, "wiki"),
        }
    }
}

// ---------------------------------------------------------------------------
// Plant record
// ---------------------------------------------------------------------------

/// One power plant as emitted by a source extractor.
///
/// Text fields use `None` for "no data"; `Some("")` is a present but empty
/// value. `coordinate_source` is only ever set by the conflation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantRecord {
    pub id: PlantId,
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub capacity_mw: Option<f64>,
    #[serde(default)]
    pub capacity_year: Option<i32>,
    #[serde(default)]
    pub fuel: BTreeSet<String>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub generation: Vec<GenerationPeriod>,
    #[serde(default)]
    pub commissioning_year: Option<f64>,
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    coordinate_source: Option<CoordinateSource>,
}

impl PlantRecord {
    pub fn new(id: PlantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            country: None,
            owner: None,
            source: None,
            url: None,
            capacity_mw: None,
            capacity_year: None,
            fuel: BTreeSet::new(),
            location: Location::default(),
            generation: Vec::new(),
            commissioning_year: None,
            coordinate_source: None,
        }
    }

    pub fn coordinate_source(&self) -> Option<&CoordinateSource> {
        self.coordinate_source.as_ref()
    }

    pub(crate) fn set_coordinate_source(&mut self, source: CoordinateSource) {
        self.coordinate_source = Some(source);
    }

    /// Missing capacity never meets a threshold.
    pub fn meets_capacity(&self, minimum_mw: f64) -> bool {
        self.capacity_mw.is_some_and(|c| c >= minimum_mw)
    }

    /// Whether any period carries a generation figure.
    pub fn has_generation(&self) -> bool {
        self.generation.iter().any(|g| g.gwh().is_some())
    }

    /// Total generation of the periods falling inside `year`.
    pub fn annual_generation(&self, year: i32) -> Option<f64> {
        self.generation
            .iter()
            .filter(|g| g.calendar_year() == Some(year) && !g.is_estimated())
            .filter_map(|g| g.gwh())
            .fold(None, |acc, gwh| Some(acc.unwrap_or(0.0) + gwh))
    }

    /// Figure of the most recent estimated period.
    pub fn estimated_generation(&self) -> Option<f64> {
        self.generation
            .iter()
            .filter(|g| g.is_estimated() && g.gwh().is_some())
            .max_by_key(|g| g.end_date())
            .and_then(|g| g.gwh())
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Records of one source, keyed by id. Immutable once built.
#[derive(Debug, Clone)]
pub struct Dataset {
    code: DatasetCode,
    plants: BTreeMap<PlantId, PlantRecord>,
}

impl Dataset {
    pub fn empty(code: DatasetCode) -> Self {
        Self {
            code,
            plants: BTreeMap::new(),
        }
    }

    /// Build a dataset. Every id must carry `code`; a repeated id keeps the
    /// first record.
    pub fn from_records(
        code: DatasetCode,
        records: impl IntoIterator<Item = PlantRecord>,
    ) -> Result<Self, ConflateError> {
        let mut plants = BTreeMap::new();
        for record in records {
            if !record.id.belongs_to(&code) {
                return Err(ConflateError::ForeignId {
                    dataset: code.to_string(),
                    id: record.id.to_string(),
                });
            }
            if plants.contains_key(&record.id) {
                tracing::warn!(dataset = %code, id = %record.id, "duplicate plant id, keeping first record");
                continue;
            }
            plants.insert(record.id.clone(), record);
        }
        Ok(Self { code, plants })
    }

    pub fn code(&self) -> &DatasetCode {
        &self.code
    }

    pub fn get(&self, id: &PlantId) -> Option<&PlantRecord> {
        self.plants.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlantRecord> {
        self.plants.values()
    }

    pub fn len(&self) -> usize {
        self.plants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }
}

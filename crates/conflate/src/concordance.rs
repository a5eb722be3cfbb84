//! Hand-curated cross-reference between aggregator datasets.

use std::collections::HashMap;

use crate::error::ConflateError;
use crate::id::{DatasetCode, PlantId};

/// One row of the concordance file, as numeric ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcordanceRow {
    pub global: u32,
    pub geolocation: Option<u32>,
    pub carbon: Option<u32>,
    pub fourth: Option<u32>,
}

/// Dataset codes for the concordance columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcordanceCodes {
    pub global: DatasetCode,
    pub geolocation: DatasetCode,
    pub carbon: DatasetCode,
    pub fourth: DatasetCode,
}

/// Records linked to one global-aggregator plant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links {
    pub geolocation: Option<PlantId>,
    pub carbon: Option<PlantId>,
    pub fourth: Option<PlantId>,
}

impl Links {
    pub fn is_empty(&self) -> bool {
        self.geolocation.is_none() && self.carbon.is_none() && self.fourth.is_none()
    }
}

/// Global id → linked ids. Read-only during a run.
#[derive(Debug, Clone)]
pub struct Concordance {
    codes: ConcordanceCodes,
    table: HashMap<PlantId, Links>,
}

impl Concordance {
    pub fn empty(codes: ConcordanceCodes) -> Self {
        Self {
            codes,
            table: HashMap::new(),
        }
    }

    pub fn from_rows(
        codes: ConcordanceCodes,
        rows: impl IntoIterator<Item = ConcordanceRow>,
    ) -> Result<Self, ConflateError> {
        let mut table = HashMap::new();
        for row in rows {
            let global = codes.global.id(row.global);
            let links = Links {
                geolocation: row.geolocation.map(|n| codes.geolocation.id(n)),
                carbon: row.carbon.map(|n| codes.carbon.id(n)),
                fourth: row.fourth.map(|n| codes.fourth.id(n)),
            };
            if table.contains_key(&global) {
                return Err(ConflateError::DuplicateConcordance(global.to_string()));
            }
            table.insert(global, links);
        }
        Ok(Self { codes, table })
    }

    /// Linked ids for a global plant. An unknown id and a row with empty
    /// cross-references both resolve to empty links.
    pub fn resolve(&self, global: &PlantId) -> Links {
        self.table.get(global).cloned().unwrap_or_default()
    }

    pub fn codes(&self) -> &ConcordanceCodes {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlantId, &Links)> {
        self.table.iter()
    }
}

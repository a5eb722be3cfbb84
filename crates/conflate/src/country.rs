use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConflateError;
use crate::thesaurus::{AliasGroup, CountryThesaurus};

/// Per-country reference metadata. Read-only configuration for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryInfo {
    pub name: String,
    pub iso3: String,
    pub iso2: String,
    /// Country publishes its own authoritative dataset.
    pub has_national_source: bool,
    /// Geolocation aggregator is the primary source for this country.
    pub use_geolocation_source: bool,
    /// Country name as spelled by the geolocation aggregator.
    #[serde(default)]
    pub geolocation_name: Option<String>,
    /// Country name as spelled by the carbon tracker.
    #[serde(default)]
    pub carbon_name: Option<String>,
    /// Key of a manually curated fallback table.
    #[serde(default)]
    pub curated_table_key: Option<String>,
}

/// How the global aggregator treats a country's plants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountryPolicy {
    /// Plants come from the country's own dataset.
    National,
    /// Plants come from the geolocation aggregator.
    GeolocationPrimary,
    /// Plants come from the global aggregator.
    Global,
}

impl CountryInfo {
    /// National data shadows everything else; the geolocation flag comes next.
    pub fn policy(&self) -> CountryPolicy {
        if self.has_national_source {
            CountryPolicy::National
        } else if self.use_geolocation_source {
            CountryPolicy::GeolocationPrimary
        } else {
            CountryPolicy::Global
        }
    }

    fn alias_group(&self) -> AliasGroup {
        let aliases = [&self.geolocation_name, &self.carbon_name]
            .into_iter()
            .flatten()
            .cloned();
        AliasGroup::new(self.name.clone(), aliases)
    }
}

/// Country reference table keyed by canonical name.
#[derive(Debug, Clone, Default)]
pub struct CountryReference {
    countries: BTreeMap<String, CountryInfo>,
}

impl CountryReference {
    pub fn from_entries(entries: impl IntoIterator<Item = CountryInfo>) -> Result<Self, ConflateError> {
        let mut countries = BTreeMap::new();
        for info in entries {
            if countries.contains_key(&info.name) {
                return Err(ConflateError::DuplicateCountry(info.name));
            }
            countries.insert(info.name.clone(), info);
        }
        Ok(Self { countries })
    }

    pub fn get(&self, name: &str) -> Option<&CountryInfo> {
        self.countries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountryInfo> {
        self.countries.values()
    }

    /// Countries whose plants come from their own dataset, by name.
    pub fn national_countries(&self) -> impl Iterator<Item = &CountryInfo> {
        self.iter().filter(|c| c.has_national_source)
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    /// Country-name thesaurus: canonical name plus each aggregator spelling.
    pub fn thesaurus(&self) -> Result<CountryThesaurus, ConflateError> {
        let groups: Vec<AliasGroup> = self.iter().map(CountryInfo::alias_group).collect();
        CountryThesaurus::from_groups(&groups)
    }
}

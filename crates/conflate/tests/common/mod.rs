// Shared builders for the engine integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;

use plantreg_conflate::{
    Concordance, ConcordanceRow, ConflateConfig, ConflateInput, CountryInfo, CountryReference, Dataset,
    DatasetCode, Location, PlantRecord,
};

pub const CONFIG: &str = r#"
name = "Integration"
minimum_capacity_mw = 1.0

[resources]
fuel_thesaurus = "fuel.csv"
country_information = "countries.csv"
concordance = "concordance.csv"

[sources.global]
code = "WRI"
label = "WRI"
file = "wri.json"

[sources.geolocation]
code = "GEODB"
label = "GEO"
file = "geo.json"

[sources.carbon]
code = "CARMA"
label = "CARMA"
file = "carma.json"

[sources.wiki]
code = "SRCWT"
label = "SourceWatch"
file = "sourcewatch.json"
"#;

pub fn config() -> ConflateConfig {
    ConflateConfig::from_toml(CONFIG).unwrap()
}

pub fn country(name: &str, iso3: &str, national: bool, geo: bool) -> CountryInfo {
    CountryInfo {
        name: name.into(),
        iso3: iso3.into(),
        iso2: iso3[..2].into(),
        has_national_source: national,
        use_geolocation_source: geo,
        geolocation_name: None,
        carbon_name: None,
        curated_table_key: None,
    }
}

pub fn countries() -> CountryReference {
    CountryReference::from_entries([
        country("Chile", "CHL", true, false),
        country("Malta", "MLT", false, true),
        country("Ruritania", "RUR", false, false),
        country("China", "CHN", false, false),
    ])
    .unwrap()
}

pub fn plant(id: &str, country: &str, capacity: Option<f64>, location: Option<(f64, f64)>) -> PlantRecord {
    let mut p = PlantRecord::new(id.parse().unwrap(), format!("Plant {id}"));
    p.country = Some(country.into());
    p.capacity_mw = capacity;
    if let Some((lat, lon)) = location {
        p.location = Location::new(lat, lon);
    }
    p
}

pub fn dataset(code: &str, plants: Vec<PlantRecord>) -> Dataset {
    Dataset::from_records(DatasetCode::new(code).unwrap(), plants).unwrap()
}

pub fn link(global: u32, geo: Option<u32>, carbon: Option<u32>) -> ConcordanceRow {
    ConcordanceRow {
        global,
        geolocation: geo,
        carbon,
        fourth: None,
    }
}

pub fn concordance(rows: Vec<ConcordanceRow>) -> Concordance {
    Concordance::from_rows(config().concordance_codes().unwrap(), rows).unwrap()
}

pub struct InputBuilder {
    pub national: BTreeMap<String, Dataset>,
    pub global: Vec<PlantRecord>,
    pub geolocation: Vec<PlantRecord>,
    pub carbon: Vec<PlantRecord>,
    pub wiki: Vec<PlantRecord>,
}

impl InputBuilder {
    pub fn new() -> Self {
        Self {
            national: BTreeMap::new(),
            global: Vec::new(),
            geolocation: Vec::new(),
            carbon: Vec::new(),
            wiki: Vec::new(),
        }
    }

    pub fn national(mut self, country: &str, code: &str, plants: Vec<PlantRecord>) -> Self {
        self.national.insert(country.into(), dataset(code, plants));
        self
    }

    pub fn build(self) -> ConflateInput {
        ConflateInput {
            national: self.national,
            global: dataset("WRI", self.global),
            geolocation: dataset("GEODB", self.geolocation),
            carbon: dataset("CARMA", self.carbon),
            wiki: dataset("SRCWT", self.wiki),
        }
    }
}

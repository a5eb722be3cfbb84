use serde::Deserialize;

use crate::concordance::ConcordanceCodes;
use crate::error::ConflateError;
use crate::id::DatasetCode;

pub const DEFAULT_MINIMUM_CAPACITY_MW: f64 = 1.0;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ConflateConfig {
    pub name: String,
    /// Plants below this capacity are dropped at the national and
    /// global-aggregator steps.
    #[serde(default = "default_minimum_capacity")]
    pub minimum_capacity_mw: f64,
    /// Calendar years exported as annual generation columns.
    #[serde(default = "default_generation_years")]
    pub generation_years: Vec<i32>,
    pub resources: ResourceFiles,
    pub sources: SourceSet,
    #[serde(default)]
    pub national: NationalConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_minimum_capacity() -> f64 {
    DEFAULT_MINIMUM_CAPACITY_MW
}

fn default_generation_years() -> Vec<i32> {
    (2013..=2017).collect()
}

// ---------------------------------------------------------------------------
// Reference tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceFiles {
    pub fuel_thesaurus: String,
    pub country_information: String,
    pub concordance: String,
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSet {
    /// Manually curated global registry.
    pub global: SourceConfig,
    /// Geolocation-rich observatory database.
    pub geolocation: SourceConfig,
    /// Carbon-tracking database.
    pub carbon: SourceConfig,
    /// Wiki-sourced single-country coal database.
    pub wiki: SourceConfig,
    /// Code of the fourth concordance column, which has no dataset of its own.
    #[serde(default = "default_fourth_code")]
    pub fourth_code: String,
}

fn default_fourth_code() -> String {
    "OSM".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Id prefix of the dataset's records.
    pub code: String,
    /// Name used in coordinate-source tags (`"<label> data"`).
    pub label: String,
    pub file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NationalConfig {
    /// Directory holding one `<ISO3>.json` or `<ISO3>.csv` per country.
    #[serde(default = "default_national_dir")]
    pub directory: String,
}

impl Default for NationalConfig {
    fn default() -> Self {
        Self {
            directory: default_national_dir(),
        }
    }
}

fn default_national_dir() -> String {
    "source_databases".into()
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub registry_csv: Option<String>,
    #[serde(default)]
    pub dump_csv: Option<String>,
    #[serde(default)]
    pub sqlite: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ConflateConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConflateError> {
        let config: ConflateConfig =
            toml::from_str(input).map_err(|e| ConflateError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConflateError> {
        if !self.minimum_capacity_mw.is_finite() || self.minimum_capacity_mw < 0.0 {
            return Err(ConflateError::ConfigValidation(format!(
                "minimum_capacity_mw must be a non-negative number, got {}",
                self.minimum_capacity_mw
            )));
        }

        if self.generation_years.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConflateError::ConfigValidation(
                "generation_years must be strictly increasing".into(),
            ));
        }

        let codes = self.concordance_codes()?;
        let wiki = self.wiki_code()?;
        let all = [&codes.global, &codes.geolocation, &codes.carbon, &codes.fourth, &wiki];
        for (i, a) in all.iter().enumerate() {
            if all[i + 1..].contains(a) {
                return Err(ConflateError::ConfigValidation(format!(
                    "dataset code '{a}' is used by more than one source"
                )));
            }
        }

        for (role, source) in self.sources.named() {
            if source.label.trim().is_empty() {
                return Err(ConflateError::ConfigValidation(format!(
                    "sources.{role}: label must not be empty"
                )));
            }
        }

        Ok(())
    }

    pub fn concordance_codes(&self) -> Result<ConcordanceCodes, ConflateError> {
        let code = |role: &str, raw: &str| {
            DatasetCode::new(raw).map_err(|_| {
                ConflateError::ConfigValidation(format!(
                    "sources.{role}: code '{raw}' must be ASCII uppercase letters"
                ))
            })
        };
        Ok(ConcordanceCodes {
            global: code("global", &self.sources.global.code)?,
            geolocation: code("geolocation", &self.sources.geolocation.code)?,
            carbon: code("carbon", &self.sources.carbon.code)?,
            fourth: code("fourth_code", &self.sources.fourth_code)?,
        })
    }

    pub fn wiki_code(&self) -> Result<DatasetCode, ConflateError> {
        DatasetCode::new(&self.sources.wiki.code).map_err(|_| {
            ConflateError::ConfigValidation(format!(
                "sources.wiki: code '{}' must be ASCII uppercase letters",
                self.sources.wiki.code
            ))
        })
    }
}

impl SourceSet {
    /// Sources with a dataset file, paired with their config key.
    pub fn named(&self) -> [(&'static str, &SourceConfig); 4] {
        [
            ("global", &self.global),
            ("geolocation", &self.geolocation),
            ("carbon", &self.carbon),
            ("wiki", &self.wiki),
        ]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
name = "Test registry"

[resources]
fuel_thesaurus = "resources/fuel_type_thesaurus.csv"
country_information = "resources/country_information.csv"
concordance = "resources/master_plant_concordance.csv"

[sources.global]
code = "WRI"
label = "WRI"
file = "sources/wri.json"

[sources.geolocation]
code = "GEODB"
label = "GEO"
file = "sources/geo.json"

[sources.carbon]
code = "CARMA"
label = "CARMA"
file = "sources/carma.json"

[sources.wiki]
code = "SRCWT"
label = "SourceWatch"
file = "sources/sourcewatch.json"
"#;

    #[test]
    fn parse_valid_with_defaults() {
        let config = ConflateConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "Test registry");
        assert_eq!(config.minimum_capacity_mw, 1.0);
        assert_eq!(config.generation_years, vec![2013, 2014, 2015, 2016, 2017]);
        assert_eq!(config.sources.fourth_code, "OSM");
        assert_eq!(config.national.directory, "source_databases");
        assert!(config.output.dump_csv.is_none());

        let codes = config.concordance_codes().unwrap();
        assert_eq!(codes.geolocation.as_str(), "GEODB");
    }

    #[test]
    fn parse_explicit_threshold_and_output() {
        let input = format!(
            r#"minimum_capacity_mw = 5.0
generation_years = [2015, 2016]
{VALID}
[output]
registry_csv = "out/registry.csv"
dump_csv = "out/dump.csv"
"#
        );
        let config = ConflateConfig::from_toml(&input).unwrap();
        assert_eq!(config.minimum_capacity_mw, 5.0);
        assert_eq!(config.generation_years, vec![2015, 2016]);
        assert_eq!(config.output.dump_csv.as_deref(), Some("out/dump.csv"));
    }

    #[test]
    fn reject_negative_threshold() {
        let input = format!("minimum_capacity_mw = -1.0\n{VALID}");
        let err = ConflateConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("minimum_capacity_mw"));
    }

    #[test]
    fn reject_unsorted_years() {
        let input = format!("generation_years = [2016, 2015]\n{VALID}");
        let err = ConflateConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn reject_lowercase_code() {
        let input = VALID.replace(r#"code = "CARMA""#, r#"code = "carma""#);
        let err = ConflateConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("sources.carbon"));
    }

    #[test]
    fn reject_shared_code() {
        let input = VALID.replace(r#"code = "SRCWT""#, r#"code = "WRI""#);
        let err = ConflateConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("'WRI'"));
    }

    #[test]
    fn reject_missing_sources() {
        let input = r#"
name = "Bad"
[resources]
fuel_thesaurus = "a"
country_information = "b"
concordance = "c"
"#;
        assert!(matches!(
            ConflateConfig::from_toml(input),
            Err(ConflateError::ConfigParse(_))
        ));
    }
}

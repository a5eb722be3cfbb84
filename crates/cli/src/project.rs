//! A run configuration plus everything it points at on disk.

use std::path::{Path, PathBuf};

use plantreg_conflate::{
    Concordance, ConflateConfig, ConflateInput, CountryReference, CountryThesaurus, Dataset, DatasetCode,
    FuelThesaurus,
};
use plantreg_io::{
    load_concordance, load_country_reference, load_dataset, load_fuel_thesaurus, load_national_datasets, IoError,
    Vocabulary,
};

use crate::exit_codes::{EXIT_DATASET, EXIT_INVALID_CONFIG, EXIT_RESOURCE};
use crate::CliError;

pub const DEFAULT_REGISTRY_CSV: &str = "output/registry.csv";

pub struct Project {
    pub config: ConflateConfig,
    base_dir: PathBuf,
}

impl Project {
    pub fn load(config_path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(config_path).map_err(|e| {
            CliError::new(EXIT_INVALID_CONFIG, format!("cannot read config {}: {e}", config_path.display()))
        })?;
        let config = ConflateConfig::from_toml(&text).map_err(|e| CliError::new(EXIT_INVALID_CONFIG, e.to_string()))?;

        // Paths in the config are relative to the config file's directory
        let base_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self { config, base_dir })
    }

    pub fn resolve(&self, file: impl AsRef<Path>) -> PathBuf {
        let file = file.as_ref();
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.base_dir.join(file)
        }
    }

    pub fn registry_csv(&self) -> PathBuf {
        self.resolve(self.config.output.registry_csv.as_deref().unwrap_or(DEFAULT_REGISTRY_CSV))
    }

    pub fn dump_csv(&self) -> Option<PathBuf> {
        self.config.output.dump_csv.as_deref().map(|p| self.resolve(p))
    }

    pub fn sqlite(&self) -> Option<PathBuf> {
        self.config.output.sqlite.as_deref().map(|p| self.resolve(p))
    }

    fn codes(&self) -> Result<plantreg_conflate::ConcordanceCodes, CliError> {
        self.config
            .concordance_codes()
            .map_err(|e| CliError::new(EXIT_INVALID_CONFIG, e.to_string()))
    }

    pub fn load_countries(&self) -> Result<CountryReference, CliError> {
        load_country_reference(&self.resolve(&self.config.resources.country_information)).map_err(resource_err)
    }

    pub fn load_concordance(&self) -> Result<Concordance, CliError> {
        load_concordance(&self.resolve(&self.config.resources.concordance), self.codes()?).map_err(resource_err)
    }

    pub fn load_tables(&self) -> Result<Tables, CliError> {
        let fuel = load_fuel_thesaurus(&self.resolve(&self.config.resources.fuel_thesaurus)).map_err(resource_err)?;
        let countries = self.load_countries()?;
        let country_names = countries
            .thesaurus()
            .map_err(|e| CliError::new(EXIT_RESOURCE, e.to_string()).with_hint("run `plantreg check` on this config"))?;
        let concordance = self.load_concordance()?;
        Ok(Tables {
            fuel,
            countries,
            country_names,
            concordance,
        })
    }

    /// One aggregator dataset, as named by `sources.<role>.file`.
    pub fn load_source(&self, file: &str, code: &DatasetCode, tables: Option<&Tables>) -> Result<Dataset, CliError> {
        load_dataset(&self.resolve(file), code, tables.map(Tables::vocabulary)).map_err(dataset_err)
    }

    pub fn load_input(&self, tables: &Tables) -> Result<ConflateInput, CliError> {
        let codes = self.codes()?;
        let wiki_code = self
            .config
            .wiki_code()
            .map_err(|e| CliError::new(EXIT_INVALID_CONFIG, e.to_string()))?;
        let sources = &self.config.sources;

        Ok(ConflateInput {
            national: load_national_datasets(
                &self.resolve(&self.config.national.directory),
                &tables.countries,
                Some(tables.vocabulary()),
            )
            .map_err(dataset_err)?,
            global: self.load_source(&sources.global.file, &codes.global, Some(tables))?,
            geolocation: self.load_source(&sources.geolocation.file, &codes.geolocation, Some(tables))?,
            carbon: self.load_source(&sources.carbon.file, &codes.carbon, Some(tables))?,
            wiki: self.load_source(&sources.wiki.file, &wiki_code, Some(tables))?,
        })
    }
}

/// Reference tables for one run.
pub struct Tables {
    pub fuel: FuelThesaurus,
    pub countries: CountryReference,
    pub country_names: CountryThesaurus,
    pub concordance: Concordance,
}

impl Tables {
    pub fn vocabulary(&self) -> Vocabulary<'_> {
        Vocabulary {
            fuel: &self.fuel,
            country: &self.country_names,
        }
    }
}

pub fn resource_err(err: IoError) -> CliError {
    CliError::new(EXIT_RESOURCE, err.to_string())
}

fn dataset_err(err: IoError) -> CliError {
    let hint = match &err {
        IoError::UnsupportedFormat { .. } => Some("datasets must be .json record lists or registry-format .csv"),
        IoError::Read { .. } => Some("paths are resolved relative to the config file"),
        _ => None,
    };
    let cli = CliError::new(EXIT_DATASET, err.to_string());
    match hint {
        Some(hint) => cli.with_hint(hint),
        None => cli,
    }
}

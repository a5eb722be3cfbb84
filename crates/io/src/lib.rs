// File I/O operations

pub mod dataset;
pub mod encoding;
pub mod error;
pub mod export;
pub mod resources;
pub mod row;
pub mod sqlite;

pub use dataset::{load_dataset, load_national_datasets, read_registry_csv, DatasetFormat, Vocabulary};
pub use error::IoError;
pub use export::{write_dump_csv, write_registry_csv};
pub use resources::{load_concordance, load_country_reference, load_fuel_thesaurus, read_alias_groups};
pub use row::{Layout, RegistryRow, WARNING_BANNER};
pub use sqlite::{copy_csv_to_sqlite, write_sqlite};

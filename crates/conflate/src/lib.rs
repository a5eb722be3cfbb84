//! `plantreg-conflate` - power-plant registry conflation engine.
//!
//! Pure engine crate: receives pre-loaded datasets and reference tables,
//! returns the merged registry, the audit log and a summary.
//! No CLI or IO dependencies.

pub mod check;
pub mod concordance;
pub mod config;
pub mod country;
pub mod engine;
pub mod error;
pub mod id;
pub mod model;
pub mod registry;
pub mod summary;
pub mod text;
pub mod thesaurus;

pub use check::{CheckReport, Finding, Severity};
pub use concordance::{Concordance, ConcordanceCodes, ConcordanceRow, Links};
pub use config::ConflateConfig;
pub use country::{CountryInfo, CountryPolicy, CountryReference};
pub use engine::{run, ConflateInput, ConflateResult};
pub use error::ConflateError;
pub use id::{DatasetCode, PlantId};
pub use model::{AdmissionStep, CoordinateSource, Dataset, GenerationPeriod, Location, PlantRecord, SourceRole};
pub use registry::{AuditEntry, AuditLog, Registry, RegistryEntry};
pub use thesaurus::{AliasGroup, CountryThesaurus, FuelThesaurus, Thesaurus};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConflateError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (bad code, bad threshold, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Dataset code is not a run of ASCII uppercase letters.
    #[error("invalid dataset code '{0}'")]
    InvalidCode(String),
    /// Plant id is not `<CODE><digits>`.
    #[error("invalid plant id '{0}'")]
    InvalidId(String),
    /// Generation period with inverted or half-present dates.
    #[error("invalid generation period: {0}")]
    InvalidPeriod(String),
    /// A thesaurus group without a canonical label.
    #[error("thesaurus group {index} has an empty canonical label")]
    EmptyLabel { index: usize },
    /// The same alias resolves to two canonical labels.
    #[error("alias '{alias}' is claimed by both '{first}' and '{second}'")]
    AmbiguousAlias { alias: String, first: String, second: String },
    /// The country reference lists a country twice.
    #[error("country '{0}' appears more than once in the country reference")]
    DuplicateCountry(String),
    /// The concordance lists the same global id twice.
    #[error("concordance lists '{0}' more than once")]
    DuplicateConcordance(String),
    /// A record whose id belongs to a different dataset.
    #[error("dataset {dataset}: record '{id}' does not belong to this dataset")]
    ForeignId { dataset: String, id: String },
}

//! Controlled vocabularies: alias thesauri for fuel and country labels.

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::error::ConflateError;

/// Delimiters between sub-values of a fuel cell: `coal/gas`, `oil, gas`,
/// `solar and wind`, `solar y eólica`.
static FUEL_DELIMITERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*(?:/|,|\band\b|\by\b)\s*").expect("static regex"));

/// One canonical label and the strings that resolve to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasGroup {
    pub label: String,
    pub aliases: Vec<String>,
}

impl AliasGroup {
    pub fn new(label: impl Into<String>, aliases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            label: label.into(),
            aliases: aliases.into_iter().map(Into::into).collect(),
        }
    }
}

/// Alias → canonical label lookup with disjoint alias sets.
#[derive(Debug, Clone)]
pub struct Thesaurus {
    labels: Vec<String>,
    index: HashMap<String, usize>,
    case_insensitive: bool,
}

impl Thesaurus {
    /// Build from groups. The label is always an alias of itself; blank
    /// aliases are ignored. Fails when an alias maps to two labels.
    pub fn from_groups(groups: &[AliasGroup], case_insensitive: bool) -> Result<Self, ConflateError> {
        let mut labels = Vec::with_capacity(groups.len());
        let mut index: HashMap<String, usize> = HashMap::new();

        for (i, group) in groups.iter().enumerate() {
            let label = group.label.trim();
            if label.is_empty() {
                return Err(ConflateError::EmptyLabel { index: i });
            }
            let slot = labels.len();
            labels.push(label.to_string());

            let candidates = std::iter::once(label).chain(group.aliases.iter().map(|a| a.trim()));
            for alias in candidates.filter(|a| !a.is_empty()) {
                let key = normalize_key(alias, case_insensitive);
                match index.get(&key) {
                    Some(&owner) if owner != slot => {
                        return Err(ConflateError::AmbiguousAlias {
                            alias: key,
                            first: labels[owner].clone(),
                            second: label.to_string(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        index.insert(key, slot);
                    }
                }
            }
        }

        Ok(Self {
            labels,
            index,
            case_insensitive,
        })
    }

    /// Exact-match lookup of one token.
    pub fn lookup(&self, token: &str) -> Option<&str> {
        let key = normalize_key(token.trim(), self.case_insensitive);
        self.index.get(&key).map(|&i| self.labels[i].as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn alias_count(&self) -> usize {
        self.index.len()
    }
}

fn normalize_key(token: &str, case_insensitive: bool) -> String {
    if case_insensitive {
        token.to_lowercase()
    } else {
        token.to_string()
    }
}

// ---------------------------------------------------------------------------
// Fuel
// ---------------------------------------------------------------------------

/// Case-insensitive fuel vocabulary.
#[derive(Debug, Clone)]
pub struct FuelThesaurus(Thesaurus);

impl FuelThesaurus {
    pub fn from_groups(groups: &[AliasGroup]) -> Result<Self, ConflateError> {
        Thesaurus::from_groups(groups, true).map(Self)
    }

    /// Canonical fuel labels named by a raw cell. A cell matching one alias
    /// as a whole is not split. Unidentified fragments are logged and left
    /// out, so the set may be empty.
    pub fn standardize(&self, raw: &str) -> BTreeSet<String> {
        let mut fuels = BTreeSet::new();
        if let Some(label) = self.0.lookup(raw) {
            fuels.insert(label.to_string());
            return fuels;
        }
        for fragment in FUEL_DELIMITERS.split(raw).map(str::trim).filter(|f| !f.is_empty()) {
            match self.0.lookup(fragment) {
                Some(label) => {
                    fuels.insert(label.to_string());
                }
                None => warn!(fuel = fragment, raw, "unidentified fuel"),
            }
        }
        fuels
    }

    pub fn thesaurus(&self) -> &Thesaurus {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Country
// ---------------------------------------------------------------------------

/// Case-sensitive country vocabulary; one value in, one label out.
#[derive(Debug, Clone)]
pub struct CountryThesaurus(Thesaurus);

impl CountryThesaurus {
    pub fn from_groups(groups: &[AliasGroup]) -> Result<Self, ConflateError> {
        Thesaurus::from_groups(groups, false).map(Self)
    }

    /// Canonical country name, or `None` when the value is unknown.
    pub fn standardize(&self, raw: &str) -> Option<String> {
        let found = self
            .0
            .lookup(raw)
            .or_else(|| self.0.lookup(&raw.replace(',', "")))
            .map(str::to_string);
        if found.is_none() {
            warn!(country = raw.trim(), "unidentified country");
        }
        found
    }

    pub fn thesaurus(&self) -> &Thesaurus {
        &self.0
    }
}

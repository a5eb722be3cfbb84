use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConflateError;

/// Width of the zero-padded numeric part of a plant id.
pub const ID_DIGITS: usize = 7;

/// Short uppercase tag naming one source dataset (`WRI`, `GEODB`, `USA`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatasetCode(String);

impl DatasetCode {
    pub fn new(code: impl Into<String>) -> Result<Self, ConflateError> {
        let code = code.into();
        if code.is_empty() || !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(ConflateError::InvalidCode(code));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the id of record `number` within this dataset.
    pub fn id(&self, number: u32) -> PlantId {
        PlantId {
            code: self.clone(),
            number,
        }
    }
}

impl fmt::Display for DatasetCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DatasetCode {
    type Error = ConflateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DatasetCode> for String {
    fn from(code: DatasetCode) -> Self {
        code.0
    }
}

/// Plant identifier: dataset code plus a sequence number unique within
/// that dataset. Renders as `USA0001234`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlantId {
    code: DatasetCode,
    number: u32,
}

impl PlantId {
    pub fn code(&self) -> &DatasetCode {
        &self.code
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn belongs_to(&self, code: &DatasetCode) -> bool {
        &self.code == code
    }
}

impl fmt::Display for PlantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:0width$}", self.code, self.number, width = ID_DIGITS)
    }
}

impl FromStr for PlantId {
    type Err = ConflateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| ConflateError::InvalidId(s.to_string()))?;
        let (letters, digits) = s.split_at(split);
        let code = DatasetCode::new(letters).map_err(|_| ConflateError::InvalidId(s.to_string()))?;
        // Exactly the padded width, or a wider number with no leading zero
        let canonical = digits.len() == ID_DIGITS || (digits.len() > ID_DIGITS && !digits.starts_with('0'));
        if !canonical || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConflateError::InvalidId(s.to_string()));
        }
        let number = digits
            .parse::<u32>()
            .map_err(|_| ConflateError::InvalidId(s.to_string()))?;
        Ok(Self { code, number })
    }
}

impl TryFrom<String> for PlantId {
    type Error = ConflateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PlantId> for String {
    fn from(id: PlantId) -> Self {
        id.to_string()
    }
}

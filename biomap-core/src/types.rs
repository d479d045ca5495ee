use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BiomapError, BiomapResult};

/// Numeric identifier of a region within its granularity (IBGE code).
pub type RegionCode = u64;

/// Selector value meaning "no filter, the whole country".
pub const NATIONWIDE: &str = "Brasil";

/// The 27 federative units, in the order their base polygons are drawn.
pub const STATE_CODES: [&str; 27] = [
    "RO", "AC", "AM", "RR", "PA", "AP", "TO", "MA", "PI", "CE", "RN", "PB", "PE", "AL", "SE",
    "BA", "MG", "ES", "RJ", "SP", "PR", "SC", "RS", "MS", "MT", "GO", "DF",
];

const STATE_NAMES: [(&str, &str); 27] = [
    ("Acre", "AC"),
    ("Alagoas", "AL"),
    ("Amapá", "AP"),
    ("Amazonas", "AM"),
    ("Bahia", "BA"),
    ("Ceará", "CE"),
    ("Distrito Federal", "DF"),
    ("Espírito Santo", "ES"),
    ("Goiás", "GO"),
    ("Maranhão", "MA"),
    ("Mato Grosso", "MT"),
    ("Mato Grosso do Sul", "MS"),
    ("Minas Gerais", "MG"),
    ("Pará", "PA"),
    ("Paraíba", "PB"),
    ("Paraná", "PR"),
    ("Pernambuco", "PE"),
    ("Piauí", "PI"),
    ("Rio de Janeiro", "RJ"),
    ("Rio Grande do Norte", "RN"),
    ("Rio Grande do Sul", "RS"),
    ("Rondônia", "RO"),
    ("Roraima", "RR"),
    ("Santa Catarina", "SC"),
    ("São Paulo", "SP"),
    ("Sergipe", "SE"),
    ("Tocantins", "TO"),
];

/// Two-letter code of one of the 27 federative units.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StateCode(String);

impl StateCode {
    pub fn new(code: &str) -> BiomapResult<Self> {
        let upper = code.trim().to_ascii_uppercase();
        if STATE_CODES.contains(&upper.as_str()) {
            Ok(Self(upper))
        } else {
            Err(BiomapError::unknown_region(code))
        }
    }

    /// All 27 states in drawing order.
    pub fn all() -> impl Iterator<Item = StateCode> {
        STATE_CODES.iter().map(|c| StateCode(c.to_string()))
    }

    /// Resolve a full state name ("São Paulo") to its code.
    pub fn from_name(name: &str) -> Option<Self> {
        STATE_NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name.trim()))
            .map(|(_, c)| StateCode(c.to_string()))
    }

    pub fn name(&self) -> &'static str {
        STATE_NAMES
            .iter()
            .find(|(_, c)| *c == self.0)
            .map(|(n, _)| *n)
            .unwrap_or("")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StateCode {
    type Error = BiomapError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        StateCode::new(&value)
    }
}

impl From<StateCode> for String {
    fn from(code: StateCode) -> Self {
        code.0
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StateCode {
    type Err = BiomapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StateCode::new(s).or_else(|e| StateCode::from_name(s).ok_or(e))
    }
}

/// Active region selection: the whole country or a single state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum RegionFilter {
    #[default]
    Nationwide,
    State(StateCode),
}

impl RegionFilter {
    pub fn matches(&self, state: &StateCode) -> bool {
        match self {
            RegionFilter::Nationwide => true,
            RegionFilter::State(selected) => selected == state,
        }
    }

    pub fn is_nationwide(&self) -> bool {
        matches!(self, RegionFilter::Nationwide)
    }

    /// Key used by the bounding-box table.
    pub fn key(&self) -> &str {
        match self {
            RegionFilter::Nationwide => NATIONWIDE,
            RegionFilter::State(code) => code.as_str(),
        }
    }
}

impl FromStr for RegionFilter {
    type Err = BiomapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(NATIONWIDE) {
            Ok(RegionFilter::Nationwide)
        } else {
            s.parse().map(RegionFilter::State)
        }
    }
}

impl fmt::Display for RegionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl From<StateCode> for RegionFilter {
    fn from(code: StateCode) -> Self {
        RegionFilter::State(code)
    }
}

/// Normalization family declared by a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScaleKind {
    #[default]
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "log", alias = "logarithmic")]
    Logarithmic,
}

impl fmt::Display for ScaleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleKind::Linear => f.write_str("linear"),
            ScaleKind::Logarithmic => f.write_str("log"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_code_validation() {
        assert_eq!(StateCode::new("sp").unwrap().as_str(), "SP");
        assert!(StateCode::new("XX").is_err());
        assert_eq!(StateCode::all().count(), 27);
    }

    #[test]
    fn test_state_code_from_full_name() {
        let code: StateCode = "São Paulo".parse().unwrap();
        assert_eq!(code.as_str(), "SP");
        assert_eq!(code.name(), "São Paulo");
    }

    #[test]
    fn test_region_filter_parse() {
        assert_eq!("Brasil".parse::<RegionFilter>().unwrap(), RegionFilter::Nationwide);
        let sp: RegionFilter = "SP".parse().unwrap();
        assert_eq!(sp.key(), "SP");
        assert!(sp.matches(&StateCode::new("SP").unwrap()));
        assert!(!sp.matches(&StateCode::new("RJ").unwrap()));
        assert!("Atlantis".parse::<RegionFilter>().is_err());
    }

    #[test]
    fn test_scale_kind_serde() {
        let kind: ScaleKind = serde_json::from_str("\"log\"").unwrap();
        assert_eq!(kind, ScaleKind::Logarithmic);
        let kind: ScaleKind = serde_json::from_str("\"linear\"").unwrap();
        assert_eq!(kind, ScaleKind::Linear);
    }
}

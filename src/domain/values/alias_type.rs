use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of key an alias or cache entry is stored under.
///
/// `Ticker` and `Name` are the two kinds the resolution cache uses;
/// `Abbreviation` and `LocalName` only appear on registry-contributed
/// aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AliasType {
    Ticker,
    Name,
    Abbreviation,
    LocalName,
}

impl fmt::Display for AliasType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ticker => write!(f, "ticker"),
            Self::Name => write!(f, "name"),
            Self::Abbreviation => write!(f, "abbreviation"),
            Self::LocalName => write!(f, "local-name"),
        }
    }
}

impl FromStr for AliasType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ticker" => Ok(Self::Ticker),
            "name" => Ok(Self::Name),
            "abbreviation" => Ok(Self::Abbreviation),
            "local-name" | "local_name" => Ok(Self::LocalName),
            _ => Err(format!("Invalid alias type: '{s}'")),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Provenance of a resolution: which tier of the cascade produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Provider-supplied identifier that passed checksum validation.
    Provider,
    /// Curated manual override map.
    Manual,
    /// Local canonical store (mirror tables or positive cache).
    Store,
    /// Community registry.
    Registry,
    /// Free bulk lookup service (batched name query).
    Wikidata,
    /// Rate-limited profile lookup service.
    Finnhub,
    /// Unreliable symbol-suggest fallback.
    Suggest,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider => write!(f, "provider"),
            Self::Manual => write!(f, "manual"),
            Self::Store => write!(f, "store"),
            Self::Registry => write!(f, "registry"),
            Self::Wikidata => write!(f, "wikidata"),
            Self::Finnhub => write!(f, "finnhub"),
            Self::Suggest => write!(f, "suggest"),
        }
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "provider" => Ok(Self::Provider),
            "manual" => Ok(Self::Manual),
            "store" => Ok(Self::Store),
            "registry" => Ok(Self::Registry),
            "wikidata" => Ok(Self::Wikidata),
            "finnhub" => Ok(Self::Finnhub),
            "suggest" => Ok(Self::Suggest),
            _ => Err(format!("Invalid resolution source: '{s}'")),
        }
    }
}

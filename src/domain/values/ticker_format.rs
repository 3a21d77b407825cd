use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of ticker format tags produced by classification.
///
/// Observation only: these tags are recorded by the format log and never
/// consulted by the resolution cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TickerFormat {
    /// Root plus a two-letter venue code after a space ("NVDA US").
    SpaceSuffix,
    /// Root plus a venue code after a dot ("VOD.L", "MSFT.OQ").
    DotSuffix,
    /// Root plus a single-letter share class after a dash ("BRK-B").
    DashClassSuffix,
    /// All digits ("0700", "9988").
    Numeric,
    /// Bare symbol, or anything unclassifiable.
    #[default]
    Plain,
}

impl fmt::Display for TickerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpaceSuffix => write!(f, "space-suffix"),
            Self::DotSuffix => write!(f, "dot-suffix"),
            Self::DashClassSuffix => write!(f, "dash-class-suffix"),
            Self::Numeric => write!(f, "numeric"),
            Self::Plain => write!(f, "plain"),
        }
    }
}

impl FromStr for TickerFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "space-suffix" => Ok(Self::SpaceSuffix),
            "dot-suffix" => Ok(Self::DotSuffix),
            "dash-class-suffix" => Ok(Self::DashClassSuffix),
            "numeric" => Ok(Self::Numeric),
            "plain" => Ok(Self::Plain),
            _ => Err(format!("Invalid ticker format tag: '{s}'")),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Equity,
    Bond,
    Fund,
    Cash,
    #[default]
    Other,
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equity => write!(f, "equity"),
            Self::Bond => write!(f, "bond"),
            Self::Fund => write!(f, "fund"),
            Self::Cash => write!(f, "cash"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl FromStr for AssetClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "equity" | "stock" => Ok(Self::Equity),
            "bond" => Ok(Self::Bond),
            "fund" | "etf" => Ok(Self::Fund),
            "cash" => Ok(Self::Cash),
            "other" | "unknown" => Ok(Self::Other),
            _ => Err(format!(
                "Invalid asset class: '{s}'. Use equity, bond, fund, cash or other"
            )),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Checksum-validated canonical security identifier (ISIN layout).
///
/// 12 characters: 2-letter country code, 9 alphanumeric NSIN, 1 check digit.
/// The check digit is verified with the Luhn algorithm after expanding
/// letters to numbers (A=10 .. Z=35). Parsing is tolerant of surrounding
/// whitespace and lowercase input; the stored form is always uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalId(String);

impl CanonicalId {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let id = raw.trim().to_ascii_uppercase();
        if id.len() != 12 {
            return Err(format!(
                "canonical id must be 12 characters, got {} in '{}'",
                id.len(),
                raw.trim()
            ));
        }
        let bytes = id.as_bytes();
        if !bytes[..2].iter().all(|b| b.is_ascii_alphabetic()) {
            return Err(format!("'{id}' does not start with a 2-letter country code"));
        }
        if !bytes[2..11].iter().all(|b| b.is_ascii_alphanumeric()) {
            return Err(format!("'{id}' has a non-alphanumeric NSIN segment"));
        }
        if !bytes[11].is_ascii_digit() {
            return Err(format!("'{id}' does not end in a numeric check digit"));
        }
        if !luhn_valid(&id) {
            return Err(format!("'{id}' fails the check-digit validation"));
        }
        Ok(CanonicalId(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn country_code(&self) -> &str {
        &self.0[..2]
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CanonicalId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CanonicalId::parse(s)
    }
}

impl TryFrom<String> for CanonicalId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        CanonicalId::parse(&s)
    }
}

impl From<CanonicalId> for String {
    fn from(id: CanonicalId) -> String {
        id.0
    }
}

/// Luhn over the digit expansion of the full 12-character identifier,
/// doubling every second digit from the right.
fn luhn_valid(id: &str) -> bool {
    let mut digits = String::with_capacity(24);
    for ch in id.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
        } else {
            let value = ch as u32 - 'A' as u32 + 10;
            digits.push_str(&value.to_string());
        }
    }

    let mut total = 0u32;
    for (i, ch) in digits.chars().rev().enumerate() {
        let mut n = ch.to_digit(10).unwrap_or(0);
        if i % 2 == 1 {
            n *= 2;
            if n > 9 {
                n -= 9;
            }
        }
        total += n;
    }
    total % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_known_identifiers() {
        for raw in ["US0378331005", "DE0007164600", "GB0002374006"] {
            assert!(CanonicalId::parse(raw).is_ok(), "{raw} should be valid");
        }
    }

    #[test]
    fn test_normalizes_case_and_whitespace() {
        let id = CanonicalId::parse("  us0378331005 ").unwrap();
        assert_eq!(id.as_str(), "US0378331005");
        assert_eq!(id.country_code(), "US");
    }

    #[test]
    fn test_rejects_bad_check_digit() {
        assert!(CanonicalId::parse("US0378331006").is_err());
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(CanonicalId::parse("").is_err());
        assert!(CanonicalId::parse("US037833100").is_err());
        assert!(CanonicalId::parse("0S0378331005").is_err());
        assert!(CanonicalId::parse("US037833100X").is_err());
        assert!(CanonicalId::parse("N/A").is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let id = CanonicalId::parse("US0378331005").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"US0378331005\"");
        let back: CanonicalId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_serde_rejects_invalid() {
        let result: Result<CanonicalId, _> = serde_json::from_str("\"US0378331006\"");
        assert!(result.is_err());
    }
}

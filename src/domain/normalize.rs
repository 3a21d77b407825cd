//! Name and ticker normalization for identity resolution.
//!
//! Everything in this module is pure: classification and variant generation
//! never look at the store, the registry, or prior outcomes. The format
//! observer records which variants succeed per provider, but that data does
//! not feed back into generation in this version.

use crate::domain::values::ticker_format::TickerFormat;

/// Legal-form and share-class words stripped from the end of issuer names.
/// Ordered pairs are checked before single words so "CLASS A" is removed
/// as a unit.
const MULTI_WORD_SUFFIXES: &[(&str, &str)] = &[
    ("CLASS", "A"),
    ("CLASS", "B"),
    ("CLASS", "C"),
    ("CL", "A"),
    ("CL", "B"),
    ("CL", "C"),
    ("SPONSORED", "ADR"),
    ("UNSPONSORED", "ADR"),
];

const SINGLE_WORD_SUFFIXES: &[&str] = &[
    "INCORPORATED",
    "CORPORATION",
    "HOLDINGS",
    "LIMITED",
    "COMPANY",
    "ORDINARY",
    "COMMON",
    "CORP",
    "INC",
    "LTD",
    "PLC",
    "LLC",
    "LLP",
    "CO",
    "AG",
    "SA",
    "NV",
    "SE",
    "AB",
    "AS",
    "KK",
    "BV",
    "CV",
    "LP",
    "ADR",
    "ADS",
    "GDR",
    "REGISTERED",
    "REG",
];

/// Canonical normalized form of an issuer name.
///
/// Uppercases, drops punctuation except `&` (AT&T, S&P), collapses
/// whitespace, then strips trailing legal-form suffixes. "& CO" is part of
/// the name (JPMORGAN CHASE & CO) and survives stripping.
pub fn normalize_name(raw: &str) -> String {
    let upper = raw.to_uppercase();
    let cleaned: String = upper
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '&' { c } else { ' ' })
        .collect();
    let mut words: Vec<&str> = cleaned.split_whitespace().collect();

    loop {
        let n = words.len();
        if n >= 2 {
            let pair = (words[n - 2], words[n - 1]);
            if MULTI_WORD_SUFFIXES.contains(&pair) {
                words.truncate(n - 2);
                continue;
            }
        }
        if n >= 1 && SINGLE_WORD_SUFFIXES.contains(&words[n - 1]) {
            if words[n - 1] == "CO" && n >= 2 && words[n - 2] == "&" {
                break;
            }
            words.truncate(n - 1);
            continue;
        }
        break;
    }

    words.join(" ")
}

/// Search variants for an issuer name, most specific first.
pub fn name_variants(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut variants: Vec<String> = Vec::new();
    let mut add = |v: String, variants: &mut Vec<String>| {
        if !v.is_empty() && !variants.contains(&v) {
            variants.push(v);
        }
    };

    let original = trimmed
        .to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    add(original, &mut variants);

    let normalized = normalize_name(trimmed);
    add(normalized.clone(), &mut variants);

    if let Some(first) = normalized.split_whitespace().next() {
        if first.len() >= 3 {
            add(first.to_string(), &mut variants);
        }
    }

    if let Some(rest) = normalized.strip_prefix("THE ") {
        add(rest.to_string(), &mut variants);
    }

    variants
}

fn venue_region(code: &str) -> String {
    match code {
        "US" | "UN" | "UQ" => "US",
        "TT" => "TW",
        "LN" => "GB",
        "GR" => "DE",
        "FP" => "FR",
        "JP" => "JP",
        "HK" => "HK",
        "CN" => "CA",
        "AU" => "AU",
        other => other,
    }
    .to_string()
}

fn dot_suffix_venue(code: &str) -> String {
    match code {
        "OQ" => "NASDAQ",
        "O" | "N" => "NYSE",
        "L" => "LSE",
        "DE" => "XETRA",
        "PA" => "EURONEXT",
        "T" => "TSE",
        "HK" => "HKEX",
        "KS" => "KRX",
        "TW" => "TWSE",
        other => other,
    }
    .to_string()
}

/// Single letters that are venue codes after a dot, not share classes.
const SINGLE_LETTER_VENUES: &[&str] = &["O", "N", "L", "T"];

fn is_space_suffix(ticker: &str) -> Option<(&str, &str)> {
    let mut parts = ticker.split_whitespace();
    let root = parts.next()?;
    let venue = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    if venue.len() == 2
        && venue.chars().all(|c| c.is_ascii_alphabetic())
        && root
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '-'))
    {
        Some((root, venue))
    } else {
        None
    }
}

fn is_dot_suffix(ticker: &str) -> Option<(&str, &str)> {
    let (root, suffix) = ticker.rsplit_once('.')?;
    if root.is_empty() || suffix.is_empty() || suffix.len() > 2 {
        return None;
    }
    if !suffix.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    // A single trailing letter is a venue only for known codes; "BRK.B" is
    // a share class and stays intact.
    if suffix.len() == 1 && !SINGLE_LETTER_VENUES.contains(&suffix) {
        return None;
    }
    Some((root, suffix))
}

fn is_dash_class(ticker: &str) -> bool {
    match ticker.split_once('-') {
        Some((root, class)) => {
            !root.is_empty()
                && root.chars().all(|c| c.is_ascii_alphabetic())
                && class.len() == 1
                && class.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}

/// Split a raw ticker into its root symbol and an optional venue hint.
///
/// Handles space-suffixed ("NVDA US"), dot-suffixed ("VOD.L", "MSFT.OQ")
/// and dash-class ("BRK-B") forms; anything else passes through unchanged.
pub fn parse_ticker(raw: &str) -> (String, Option<String>) {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        return (String::new(), None);
    }

    if let Some((root, venue)) = is_space_suffix(&ticker) {
        return (root.to_string(), Some(venue_region(venue)));
    }

    if let Some((root, suffix)) = is_dot_suffix(&ticker) {
        return (root.to_string(), Some(dot_suffix_venue(suffix)));
    }

    // Dash classes keep the class marker; it distinguishes share lines.
    (ticker, None)
}

/// Lookup variants for a ticker, most likely first. Callers cap the
/// fan-out per provider tier; generation itself is unbounded.
pub fn ticker_variants(raw: &str) -> Vec<String> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        return Vec::new();
    }

    let (root, venue) = parse_ticker(&ticker);
    let mut variants: Vec<String> = Vec::new();
    let mut add = |v: String, variants: &mut Vec<String>| {
        let v = v.trim().to_uppercase();
        if !v.is_empty() && !variants.contains(&v) {
            variants.push(v);
        }
    };

    add(ticker.clone(), &mut variants);
    add(root.clone(), &mut variants);

    for sep in ['/', '-', '.'] {
        if root.contains(sep) {
            add(root.replace(sep, ""), &mut variants);
            for other in ['/', '-', '.'] {
                if other != sep {
                    add(root.replace(sep, &other.to_string()), &mut variants);
                }
            }
        }
    }

    if venue.as_deref().is_none() || venue.as_deref() == Some("US") {
        add(format!("{root}.US"), &mut variants);
        add(format!("{root} US"), &mut variants);
    }

    variants
}

/// Classify the format of a single ticker variant.
pub fn detect_format(variant: &str) -> TickerFormat {
    let ticker = variant.trim().to_uppercase();
    if ticker.is_empty() {
        return TickerFormat::Plain;
    }
    if is_space_suffix(&ticker).is_some() {
        return TickerFormat::SpaceSuffix;
    }
    if is_dot_suffix(&ticker).is_some() {
        return TickerFormat::DotSuffix;
    }
    if is_dash_class(&ticker) {
        return TickerFormat::DashClassSuffix;
    }
    if ticker.chars().all(|c| c.is_ascii_digit()) {
        return TickerFormat::Numeric;
    }
    TickerFormat::Plain
}

//! Fixed-point decimal text conversion.
//!
//! Amounts and hash rates are stored as scaled integers. These helpers turn
//! them into decimal strings and back without touching floating point.

use crate::GuruError;

/// Render `raw` (scaled by `10^scale`) with exactly `shown` fractional digits.
///
/// Digits beyond `shown` are truncated, never rounded up.
pub fn format_fixed(raw: u128, scale: u32, shown: u32) -> String {
    let unit = 10u128.pow(scale);
    let whole = raw / unit;
    let frac = raw % unit;
    if shown == 0 {
        return whole.to_string();
    }
    let shown = shown.min(scale);
    let frac = frac / 10u128.pow(scale - shown);
    format!("{whole}.{frac:0width$}", width = shown as usize)
}

/// Parse a non-negative decimal string into a value scaled by `10^scale`.
///
/// Rejects signs, exponents, and more fractional digits than `scale`.
pub fn parse_fixed(s: &str, scale: u32) -> Result<u128, GuruError> {
    let s = s.trim();
    let invalid = || GuruError::InvalidDecimal(s.to_string());
    if s.is_empty() {
        return Err(invalid());
    }
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > scale as usize {
        return Err(invalid());
    }

    let unit = 10u128.pow(scale);
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let frac_raw: u128 = if frac.is_empty() {
        0
    } else {
        let digits: u128 = frac.parse().map_err(|_| invalid())?;
        digits * 10u128.pow(scale - frac.len() as u32)
    };
    whole
        .checked_mul(unit)
        .and_then(|w| w.checked_add(frac_raw))
        .ok_or_else(invalid)
}

/// Serde adapter that encodes a value through its `Display` / `FromStr`
/// impls, for formats (TOML, JSON) that cannot carry `u128` faithfully.
pub mod as_str {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::fmt::Display;
    use std::str::FromStr;

    pub fn serialize<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

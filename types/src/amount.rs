//! Reward amount type.
//!
//! Amounts are represented as fixed-point integers (u128) to avoid floating-point
//! drift over many small accruals. The smallest unit is 1 raw; one whole
//! unit is `10^18` raw.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use crate::decimal::{format_fixed, parse_fixed};
use crate::GuruError;

/// A non-negative reward amount (wallet balances, accrued value, reward rates).
///
/// Internally stored as raw units (u128) for precision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);

    /// Number of fractional decimal digits carried by the raw representation.
    pub const DECIMALS: u32 = 18;

    /// Raw units per whole unit.
    pub const RAW_PER_UNIT: u128 = 1_000_000_000_000_000_000;

    /// Fractional digits shown by `Display`.
    pub const DISPLAY_DECIMALS: u32 = 8;

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Whole units, e.g. `Amount::from_units(3)` is `3.0`.
    pub fn from_units(units: u64) -> Self {
        Self(units as u128 * Self::RAW_PER_UNIT)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Lossless decimal rendering with all 18 fractional digits.
    /// Trailing zeros are dropped, keeping at least one fractional digit.
    pub fn to_exact_string(&self) -> String {
        let full = format_fixed(self.0, Self::DECIMALS, Self::DECIMALS);
        let trimmed = full.trim_end_matches('0');
        if trimmed.ends_with('.') {
            format!("{trimmed}0")
        } else {
            trimmed.to_string()
        }
    }
}

/// Serde adapter writing the lossless decimal string, for config files
/// where the 8-digit `Display` form would drop precision.
pub mod serde_exact {
    use super::Amount;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_exact_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        crate::decimal::as_str::deserialize(deserializer)
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_fixed(self.0, Self::DECIMALS, Self::DISPLAY_DECIMALS))
    }
}

impl FromStr for Amount {
    type Err = GuruError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(s, Self::DECIMALS).map(Self)
    }
}

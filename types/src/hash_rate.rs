//! Miner hash rate, the accrual multiplier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::decimal::{format_fixed, parse_fixed};
use crate::GuruError;

/// A strictly positive hash rate, stored in micro-units (6 fractional digits).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HashRate(u64);

impl HashRate {
    pub const DECIMALS: u32 = 6;

    /// Micro-units per whole hash unit.
    pub const MICROS_PER_UNIT: u64 = 1_000_000;

    /// A rate of exactly 1.0.
    pub const ONE: Self = Self(Self::MICROS_PER_UNIT);

    /// Build a hash rate from micro-units. Zero is rejected.
    pub fn from_micros(micros: u64) -> Result<Self, GuruError> {
        if micros == 0 {
            return Err(GuruError::InvalidHashRate("hash rate must be positive".into()));
        }
        Ok(Self(micros))
    }

    /// Build a hash rate from whole units. Zero is rejected.
    pub fn from_units(units: u64) -> Result<Self, GuruError> {
        let micros = units
            .checked_mul(Self::MICROS_PER_UNIT)
            .ok_or_else(|| GuruError::InvalidHashRate(format!("{units} is too large")))?;
        Self::from_micros(micros)
    }

    pub fn micros(&self) -> u64 {
        self.0
    }
}

impl Default for HashRate {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for HashRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_fixed(self.0 as u128, Self::DECIMALS, Self::DECIMALS))
    }
}

impl FromStr for HashRate {
    type Err = GuruError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = parse_fixed(s, Self::DECIMALS)?;
        let micros = u64::try_from(raw)
            .map_err(|_| GuruError::InvalidHashRate(format!("{s} is too large")))?;
        Self::from_micros(micros)
    }
}

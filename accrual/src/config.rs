//! Engine configuration with TOML support.

use guru_types::amount::serde_exact;
use guru_types::decimal::as_str;
use guru_types::{Amount, HashRate};
use serde::{Deserialize, Serialize};

use crate::reward::RATE_DIVISOR;
use crate::AccrualError;

/// Reward economics for the accrual engine.
///
/// Decimal values are written as strings in TOML so no precision is lost:
///
/// ```toml
/// reward_rate = "0.000001"
/// default_hash_rate = "1.0"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Reward units credited per second per whole hash unit.
    #[serde(default = "default_reward_rate", with = "serde_exact")]
    pub reward_rate: Amount,

    /// Hash rate given to a miner created by its first start.
    #[serde(default = "default_hash_rate", with = "as_str")]
    pub default_hash_rate: HashRate,
}

fn default_reward_rate() -> Amount {
    // 0.000001 per second per hash unit.
    Amount::new(1_000_000_000_000)
}

fn default_hash_rate() -> HashRate {
    HashRate::ONE
}

impl EngineConfig {
    /// Parse configuration from a TOML string and validate it.
    pub fn from_toml_str(s: &str) -> Result<Self, AccrualError> {
        let config: Self = toml::from_str(s).map_err(|e| AccrualError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, AccrualError> {
        toml::to_string_pretty(self).map_err(|e| AccrualError::Config(e.to_string()))
    }

    /// The reward rate must divide evenly by the per-millisecond,
    /// per-micro-hash divisor, otherwise split settlements would round
    /// differently from a single one.
    pub fn validate(&self) -> Result<(), AccrualError> {
        if self.reward_rate.raw() % RATE_DIVISOR != 0 {
            return Err(AccrualError::Config(format!(
                "reward_rate {} has more than 9 fractional digits",
                self.reward_rate.to_exact_string()
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reward_rate: default_reward_rate(),
            default_hash_rate: default_hash_rate(),
        }
    }
}

//! Daemon configuration, loaded from TOML.
//!
//! ```toml
//! data_dir = "./guru_data"
//! log_format = "json"
//! log_level = "info"
//!
//! [store]
//! map_size = 67108864
//! lock_timeout_ms = 5000
//!
//! [engine]
//! reward_rate = "0.000001"
//! default_hash_rate = "1.0"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use guru_accrual::EngineConfig;
use guru_store_lmdb::environment::DEFAULT_MAP_SIZE;
use guru_utils::LogFormat;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Directory holding the LMDB files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub log_format: LogFormat,

    /// `tracing` filter directive, e.g. `"info"` or `"warn,guru_accrual=debug"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Longest an operation waits for a lock before failing.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./guru_data")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_map_size() -> usize {
    DEFAULT_MAP_SIZE
}

fn default_lock_timeout_ms() -> u64 {
    guru_store::lock::DEFAULT_LOCK_TIMEOUT.as_millis() as u64
}

impl StoreConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            map_size: default_map_size(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl DaemonConfig {
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.engine.validate()?;
        if config.store.lock_timeout_ms == 0 {
            anyhow::bail!("store.lock_timeout_ms must be positive");
        }
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            store: StoreConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = DaemonConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = DaemonConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = DaemonConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.store.lock_timeout(), Duration::from_secs(5));
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn nested_tables_override() {
        let toml = r#"
            log_format = "json"

            [store]
            lock_timeout_ms = 250

            [engine]
            default_hash_rate = "4"
        "#;
        let config = DaemonConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.store.lock_timeout_ms, 250);
        assert_eq!(config.store.map_size, DEFAULT_MAP_SIZE);
        assert_eq!(config.engine.default_hash_rate.micros(), 4_000_000);
    }

    #[test]
    fn invalid_engine_section_is_rejected() {
        assert!(DaemonConfig::from_toml_str("[engine]\nreward_rate = \"0.0000000000001\"").is_err());
        assert!(DaemonConfig::from_toml_str("[store]\nlock_timeout_ms = 0").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(DaemonConfig::from_toml_file(Path::new("/nonexistent/guru.toml")).is_err());
    }
}

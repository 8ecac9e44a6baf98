//! Configuration loading and typed config structures for the claim engine.
//!
//! The canonical configuration lives in `freehold-config.yaml` next to the
//! binary. This module defines strongly-typed structs that mirror the YAML
//! structure; every field has a named default so a missing file or a
//! partial file still yields a fully-populated config.

use std::path::Path;

use freehold_billing::{CostSchedule, UpkeepConfig};
use freehold_types::WorldRules;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level claim engine configuration.
///
/// Mirrors the structure of `freehold-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FreeholdConfig {
    /// Per-world claim and capability rules.
    #[serde(default)]
    pub world_rules: WorldRules,

    /// One-time claim pricing.
    #[serde(default)]
    pub claim: ClaimConfig,

    /// Recurring upkeep billing.
    #[serde(default)]
    pub upkeep: UpkeepSection,

    /// Snapshot persistence.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Banned accounts whose estates are reaped at startup.
    #[serde(default)]
    pub banned_accounts: Vec<Uuid>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FreeholdConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// The `FREEHOLD_DATA_DIR` environment variable overrides
    /// `persistence.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.persistence.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.persistence.apply_env_overrides();
        Ok(config)
    }
}

/// One-time claim pricing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClaimConfig {
    /// Flat cost charged for every new claim.
    #[serde(default = "default_claim_base")]
    pub base: Decimal,

    /// Additional cost per block of footprint area.
    #[serde(default = "default_claim_per_block")]
    pub per_block: Decimal,
}

impl ClaimConfig {
    /// The claim pricing as a cost schedule.
    pub const fn schedule(&self) -> CostSchedule {
        CostSchedule::new(self.base, self.per_block)
    }
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            base: default_claim_base(),
            per_block: default_claim_per_block(),
        }
    }
}

/// Recurring upkeep billing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpkeepSection {
    /// Flat upkeep cost per billing cycle.
    #[serde(default = "default_upkeep_base")]
    pub base: Decimal,

    /// Additional upkeep per block of footprint area.
    #[serde(default = "default_upkeep_per_block")]
    pub per_block: Decimal,

    /// Hours between upkeep charges for each estate.
    #[serde(default = "default_check_interval_hours")]
    pub check_interval_hours: i64,

    /// Days an estate survives after a missed payment before expiry.
    #[serde(default = "default_grace_period_days")]
    pub grace_period_days: i64,

    /// Seconds between billing sweeps over the registry.
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
}

impl UpkeepSection {
    /// The section as the billing engine's configuration.
    pub fn to_upkeep_config(&self) -> UpkeepConfig {
        UpkeepConfig {
            schedule: CostSchedule::new(self.base, self.per_block),
            check_interval: chrono::TimeDelta::hours(self.check_interval_hours),
            grace_period: chrono::TimeDelta::days(self.grace_period_days),
        }
    }
}

impl Default for UpkeepSection {
    fn default() -> Self {
        Self {
            base: default_upkeep_base(),
            per_block: default_upkeep_per_block(),
            check_interval_hours: default_check_interval_hours(),
            grace_period_days: default_grace_period_days(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

/// Snapshot persistence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Directory holding the snapshot files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Seconds between dirty-gated saves.
    #[serde(default = "default_save_interval_seconds")]
    pub save_interval_seconds: u64,
}

impl PersistenceConfig {
    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("FREEHOLD_DATA_DIR") {
            if !dir.is_empty() {
                self.data_dir = dir;
            }
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            save_interval_seconds: default_save_interval_seconds(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_claim_base() -> Decimal {
    Decimal::from(100)
}

fn default_claim_per_block() -> Decimal {
    // 0.25 per block of footprint.
    Decimal::new(25, 2)
}

fn default_upkeep_base() -> Decimal {
    Decimal::from(100)
}

fn default_upkeep_per_block() -> Decimal {
    // 0.5 per block of footprint.
    Decimal::new(5, 1)
}

const fn default_check_interval_hours() -> i64 {
    24
}

const fn default_grace_period_days() -> i64 {
    30
}

const fn default_sweep_interval_seconds() -> u64 {
    3_600
}

fn default_data_dir() -> String {
    "data/freehold".to_owned()
}

const fn default_save_interval_seconds() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_owned()
}

//! Serializable run configuration, loaded from TOML.

use backlab_core::engine::SimConfig;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from reading or parsing a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Full configuration for a single replay, as written in a TOML file.
///
/// ```toml
/// [backtest]
/// budget = 1000000.0
/// lookback = 90
/// universe = ["AAPL", "GOOG"]
///
/// [costs]
/// enabled = true
///
/// [data]
/// dir = "data"
///
/// [strategy]
/// name = "mean_reversion"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    #[serde(default)]
    pub costs: CostsSection,
    #[serde(default)]
    pub data: DataSection,
    pub strategy: StrategySection,
}

/// Core replay parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestSection {
    pub budget: f64,
    pub lookback: usize,

    /// First simulated date (inclusive). Defaults to the first feed date
    /// with a full lookback behind it.
    #[serde(default)]
    pub start: Option<NaiveDate>,

    /// Last simulated date (inclusive). Defaults to the last feed date.
    #[serde(default)]
    pub end: Option<NaiveDate>,

    /// Instruments to trade. Empty means every symbol found in the data
    /// directory.
    #[serde(default)]
    pub universe: Vec<String>,
}

/// Trading cost model parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostsSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_commission")]
    pub commission_per_share: f64,
    #[serde(default = "default_slippage_factor")]
    pub slippage_factor: f64,
}

/// Where the bar data comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataSection {
    /// Directory of per-symbol CSV files.
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,

    /// Generate a synthetic random-walk feed instead of reading CSVs.
    #[serde(default)]
    pub synthetic: bool,

    /// Seed for the synthetic feed. Ignored when `synthetic` is false.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// Which strategy to run and its parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategySection {
    /// Registered strategy name, e.g. "buy_and_hold" or "mean_reversion".
    pub name: String,

    /// Long moving-average period for mean reversion.
    #[serde(default)]
    pub long_period: Option<usize>,

    /// Short moving-average period for mean reversion.
    #[serde(default)]
    pub short_period: Option<usize>,
}

fn default_true() -> bool {
    true
}

fn default_commission() -> f64 {
    0.1
}

fn default_slippage_factor() -> f64 {
    0.05
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_seed() -> u64 {
    42
}

impl Default for CostsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            commission_per_share: default_commission(),
            slippage_factor: default_slippage_factor(),
        }
    }
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            synthetic: false,
            seed: default_seed(),
        }
    }
}

impl BacktestConfig {
    /// Read and parse a TOML config file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    /// Project this config onto the core engine's configuration.
    pub fn to_sim_config(&self) -> SimConfig {
        let mut sim = SimConfig::new(self.backtest.budget, self.backtest.lookback);
        sim.trading_costs = self.costs.enabled;
        sim.commission_per_share = self.costs.commission_per_share;
        sim.slippage_factor = self.costs.slippage_factor;
        sim.start = self.backtest.start;
        sim.end = self.backtest.end;
        sim
    }
}

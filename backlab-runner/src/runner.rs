//! Replay runner — wires together data loading, the engine, and metrics.
//!
//! Two entry points:
//! - `run_single_backtest()`: loads data per the config, then runs. Used
//!   by the CLI.
//! - `run_backtest_from_data()`: takes a pre-loaded feed. Used by batch
//!   mode to avoid re-reading CSVs for every strategy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use backlab_core::domain::LedgerRow;
use backlab_core::engine::{run_backtest, EngineError, RunStatus, SimConfig};
use backlab_core::feed::MarketData;
use backlab_core::strategy::examples::{BuyAndHold, MeanReversion};
use backlab_core::strategy::Strategy;
use chrono::NaiveDate;

use crate::config::{BacktestConfig, ConfigError, StrategySection};
use crate::data_loader::{generate_synthetic_feed, load_csv_dir, LoadError, LoadedData};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] LoadError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("unknown strategy '{0}' (expected 'buy_and_hold' or 'mean_reversion')")]
    UnknownStrategy(String),

    #[error("a synthetic feed needs an explicit universe and date range")]
    SyntheticNeedsUniverse,
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub strategy: String,
    pub status: RunStatus,
    pub metrics: PerformanceMetrics,
    /// One row per simulated day, oldest first.
    pub rows: Vec<LedgerRow>,
    pub budget: f64,
    pub final_value: f64,
    pub symbols: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Symbols the loader dropped before the run.
    pub dropped_symbols: Vec<String>,
    /// Loader and engine warnings, in order of occurrence.
    pub warnings: Vec<String>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Build a strategy instance from its config section.
pub fn build_strategy(section: &StrategySection) -> Result<Box<dyn Strategy>, RunError> {
    match section.name.as_str() {
        "buy_and_hold" => Ok(Box::new(BuyAndHold)),
        "mean_reversion" => {
            let mut strategy = MeanReversion::default();
            if let Some(long) = section.long_period {
                strategy.long_period = long;
            }
            if let Some(short) = section.short_period {
                strategy.short_period = short;
            }
            Ok(Box::new(strategy))
        }
        other => Err(RunError::UnknownStrategy(other.to_string())),
    }
}

/// Run a single replay from a `BacktestConfig`, loading the feed it names.
pub fn run_single_backtest(config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    let sim = config.to_sim_config();
    let strategy = build_strategy(&config.strategy)?;

    let loaded = if config.data.synthetic {
        let (start, end) = match (config.backtest.start, config.backtest.end) {
            (Some(start), Some(end)) if !config.backtest.universe.is_empty() => (start, end),
            _ => return Err(RunError::SyntheticNeedsUniverse),
        };
        LoadedData {
            data: generate_synthetic_feed(
                &config.backtest.universe,
                start,
                end,
                config.data.seed,
            )?,
            dropped: Vec::new(),
            warnings: Vec::new(),
        }
    } else {
        load_csv_dir(&config.data.dir, &config.backtest.universe)?
    };

    let mut result = run_backtest_from_data(&loaded.data, strategy.as_ref(), sim)?;
    result.dropped_symbols = loaded.dropped;
    let mut warnings = loaded.warnings;
    warnings.append(&mut result.warnings);
    result.warnings = warnings;
    Ok(result)
}

/// Run a replay against a pre-loaded feed. No I/O.
pub fn run_backtest_from_data(
    data: &MarketData,
    strategy: &dyn Strategy,
    sim: SimConfig,
) -> Result<BacktestResult, RunError> {
    let run = run_backtest(data, strategy, sim)?;
    let metrics = PerformanceMetrics::compute(&run.daily_returns());
    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        strategy: strategy.name().to_string(),
        status: run.status,
        final_value: run.final_value(),
        metrics,
        budget: run.budget,
        symbols: run.symbols,
        start_date: run.rows.first().map(|r| r.date),
        end_date: run.rows.last().map(|r| r.date),
        dropped_symbols: Vec::new(),
        warnings: run.warnings,
        rows: run.rows,
    })
}

//! Backlab runner — orchestration around the core replay engine.
//!
//! This crate builds on `backlab-core` to provide:
//! - CSV feed loading with calendar alignment and a synthetic fallback
//! - TOML run configuration
//! - A single-run entry point that attaches performance metrics
//! - Run-log CSV and JSON artifact export
//! - Parallel batch runs of several strategies over one feed

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use batch::{run_batch, BatchEntry};
pub use config::{BacktestConfig, ConfigError};
pub use data_loader::{generate_synthetic_feed, load_csv_dir, LoadError, LoadedData};
pub use export::{export_json, export_ledger_csv, import_json};
pub use metrics::PerformanceMetrics;
pub use runner::{
    build_strategy, run_backtest_from_data, run_single_backtest, BacktestResult, RunError,
};

//! Batch mode — run several strategies against one feed in parallel.
//!
//! Each run owns its entire state, so strategies execute on the rayon
//! pool with nothing shared but the immutable feed. Output order matches
//! input order regardless of scheduling.

use rayon::prelude::*;

use backlab_core::engine::SimConfig;
use backlab_core::feed::MarketData;
use backlab_core::strategy::Strategy;

use crate::runner::{run_backtest_from_data, BacktestResult, RunError};

/// One strategy's outcome within a batch. Engine aborts are kept per
/// entry so one defective strategy cannot sink the rest of the batch.
#[derive(Debug)]
pub struct BatchEntry {
    pub strategy: String,
    pub outcome: Result<BacktestResult, RunError>,
}

/// Run every strategy against the same feed and config.
pub fn run_batch(
    data: &MarketData,
    strategies: &[Box<dyn Strategy>],
    sim: SimConfig,
) -> Vec<BatchEntry> {
    strategies
        .par_iter()
        .map(|strategy| BatchEntry {
            strategy: strategy.name().to_string(),
            outcome: run_backtest_from_data(data, strategy.as_ref(), sim),
        })
        .collect()
}

//! Ledger row — one simulated day's full accounting record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::portfolio::PositionBook;

/// Everything the engine knows about one simulated day, appended to the
/// run's ledger after the execution engine and accounting pass.
///
/// Downstream consumers (metrics, export, strategies conditioning on their
/// own past behavior) read these rows; nothing mutates them afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub date: NaiveDate,
    /// Position after today's fills.
    pub position: PositionBook,
    /// Sized order quantities the strategy asked for.
    pub order: BTreeMap<String, i64>,
    /// Quantities actually filled (zero for instruments that missed their
    /// limit, and everywhere on a rejected day).
    pub filled: BTreeMap<String, i64>,
    /// Per-instrument pnl for the day, net of trading costs.
    pub daily_pnl: BTreeMap<String, f64>,
    /// Sum of `daily_pnl` over instruments.
    pub daily_pnl_total: f64,
    /// Running sum of `daily_pnl_total`, seeded at zero.
    pub total_pnl: f64,
    /// Commission + slippage paid today, per instrument.
    pub cost_to_trade: BTreeMap<String, f64>,
    pub funds: f64,
    pub margin: f64,
    /// Mark-to-market portfolio value at today's close.
    pub value: f64,
}

impl LedgerRow {
    /// Total trading cost paid today.
    pub fn cost_total(&self) -> f64 {
        self.cost_to_trade.values().sum()
    }
}

//! Portfolio state — cash, reserved margin, and mark-to-market value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Signed integer share count per instrument, carried day to day.
///
/// Owned by the simulation loop's ledger; mutated only through the
/// execution engine's output.
pub type PositionBook = BTreeMap<String, i64>;

/// Scalar portfolio state for one simulated day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    /// Uninvested cash. May go negative only transiently inside a day's
    /// computation; a persisted non-positive `value` stops the run.
    pub funds: f64,
    /// Cash notionally reserved to cover short exposure. Recomputed from
    /// scratch every day from the current short market value.
    pub margin: f64,
    /// Total mark-to-market worth: funds + margin + long market value.
    pub value: f64,
}

impl PortfolioState {
    /// Opening state: all cash, no shorts, value equal to the budget.
    pub fn seed(budget: f64) -> Self {
        Self {
            funds: budget,
            margin: 0.0,
            value: budget,
        }
    }
}

/// Mark-to-market over all positions, long and short, at the given prices.
///
/// This is the pre-trade value handed to the order sizer. Instruments with
/// a non-finite price contribute nothing.
pub fn mark_to_market(
    positions: &PositionBook,
    prices: &BTreeMap<String, f64>,
    funds: f64,
    margin: f64,
) -> f64 {
    let held: f64 = positions
        .iter()
        .filter_map(|(symbol, &qty)| {
            let price = prices.get(symbol).copied()?;
            price.is_finite().then(|| qty as f64 * price)
        })
        .sum();
    funds + margin + held
}

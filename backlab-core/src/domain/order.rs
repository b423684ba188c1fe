//! Order table — the strategy's desired exposure, one record per instrument.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Desired exposure for one instrument, as returned by a strategy.
///
/// `signal` is kept as a raw integer rather than an enum: the engine treats
/// strategy output as untrusted and rejects anything outside {-1, 0, 1}
/// during validation, before any state is touched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Direction: -1 (short/sell), 0 (flat/hold), +1 (long/buy).
    pub signal: i32,
    /// Relative capital allocation, >= 0. The table-wide sum is
    /// renormalized to 1 if it exceeds 1.
    pub weight: f64,
    /// Limit price, >= 0. Zero means "no limit": the order always fills
    /// at the open, modeling a market order.
    pub limit_price: f64,
}

impl OrderRecord {
    /// A flat/hold record (no exposure requested).
    pub fn hold() -> Self {
        Self {
            signal: 0,
            weight: 0.0,
            limit_price: 0.0,
        }
    }

    /// A market order in the given direction with the given weight.
    pub fn market(signal: i32, weight: f64) -> Self {
        Self {
            signal,
            weight,
            limit_price: 0.0,
        }
    }
}

/// Ordered mapping from instrument symbol to its order record.
///
/// A `BTreeMap` keeps iteration deterministic, which is what makes two runs
/// with identical inputs produce byte-identical ledgers.
pub type OrderTable = BTreeMap<String, OrderRecord>;

/// Signed integer share quantities, per instrument. Negative reduces/shorts.
pub type QuantityMap = BTreeMap<String, i64>;

/// Sum of weights across the table.
pub fn weight_sum(orders: &OrderTable) -> f64 {
    orders.values().map(|r| r.weight).sum()
}

//! Execution engine — fills, margin recomputation, and the cash update.

use std::collections::BTreeMap;

use crate::domain::{OrderTable, PositionBook, QuantityMap};

/// Trading-cost model applied to fills.
#[derive(Debug, Clone, Copy)]
pub struct CostModel {
    /// When false, commission and slippage are both zero.
    pub enabled: bool,
    /// Flat commission per share traded, per instrument.
    pub commission_per_share: f64,
}

impl CostModel {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            commission_per_share: 0.0,
        }
    }
}

/// Result of one day's execution pass.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub positions: PositionBook,
    pub funds: f64,
    pub margin: f64,
    /// Commission + slippage per instrument, all zeros when the cost model
    /// is disabled or the day was rejected.
    pub cost_to_trade: BTreeMap<String, f64>,
    /// Signed quantity actually traded per instrument.
    pub filled: QuantityMap,
    /// Set when a traded instrument had no usable price: the whole day's
    /// order was rejected and every other field carries state through
    /// unchanged.
    pub rejected: Option<String>,
}

/// Apply one day's sized orders.
///
/// Each instrument is evaluated independently, with no partial fills: a
/// buy fills when the open is at or below the limit, a sell when it is at
/// or above, and a zero limit means a market order that always fills.
/// Instruments that miss their limit are skipped for the day.
///
/// Margin is recomputed from scratch as the full notional of all short
/// exposure at today's open. When costs are enabled, fills pay a flat
/// per-share commission plus slippage at an adjusted price (buys worse by
/// the estimate, sells worse by the estimate, floored at zero).
pub fn execute_orders(
    orders: &OrderTable,
    quantities: &QuantityMap,
    positions: &PositionBook,
    prices: &BTreeMap<String, f64>,
    slippage: &BTreeMap<String, f64>,
    funds: f64,
    margin: f64,
    costs: CostModel,
) -> ExecutionOutcome {
    // A traded instrument without a usable price rejects the entire day.
    for (symbol, &quantity) in quantities {
        if quantity == 0 {
            continue;
        }
        let price = prices.get(symbol).copied().unwrap_or(f64::NAN);
        if !price.is_finite() {
            return ExecutionOutcome {
                positions: positions.clone(),
                funds,
                margin,
                cost_to_trade: zero_costs(quantities),
                filled: zero_fills(quantities),
                rejected: Some(symbol.clone()),
            };
        }
    }

    let mut after = positions.clone();
    for (symbol, &quantity) in quantities {
        if quantity == 0 {
            continue;
        }
        let price = prices[symbol];
        let limit = orders.get(symbol).map(|r| r.limit_price).unwrap_or(0.0);
        if fills(quantity, price, limit) {
            *after.entry(symbol.clone()).or_insert(0) += quantity;
        }
    }

    let margin_after = short_notional(&after, prices);

    let mut cost_to_trade = BTreeMap::new();
    let mut cost_sum = 0.0;
    for symbol in quantities.keys() {
        let before = positions.get(symbol).copied().unwrap_or(0);
        let now = after.get(symbol).copied().unwrap_or(0);
        let traded = (now - before).unsigned_abs() as f64;
        let cost = if costs.enabled && traded > 0.0 {
            let price = prices.get(symbol).copied().unwrap_or(0.0);
            let estimate = slippage.get(symbol).copied().unwrap_or(0.0);
            let direction = quantities
                .get(symbol)
                .map(|q| q.signum() as f64)
                .unwrap_or(0.0);
            let adjusted = (price + direction * estimate).max(0.0);
            let commission = traded * costs.commission_per_share;
            let slippage_cost = traded * (price - adjusted).abs();
            commission + slippage_cost
        } else {
            0.0
        };
        cost_sum += cost;
        cost_to_trade.insert(symbol.clone(), cost);
    }

    let mut filled = QuantityMap::new();
    let mut order_value = 0.0;
    for symbol in quantities.keys() {
        let before = positions.get(symbol).copied().unwrap_or(0);
        let now = after.get(symbol).copied().unwrap_or(0);
        filled.insert(symbol.clone(), now - before);
        if now != before {
            order_value += (now - before) as f64 * prices[symbol];
        }
    }

    let margin_call = margin_after - margin;
    // The margin delta is charged once inside order_value and once more on
    // its own. Deliberate — see the cash-update note in DESIGN.md before
    // touching this.
    let order_value = order_value + margin_call;
    let funds_after = funds - order_value - margin_call - cost_sum;

    ExecutionOutcome {
        positions: after,
        funds: funds_after,
        margin: margin_after,
        cost_to_trade,
        filled,
        rejected: None,
    }
}

/// Fill criterion for one instrument. A zero limit is "no limit".
fn fills(quantity: i64, price: f64, limit: f64) -> bool {
    if limit == 0.0 {
        return true;
    }
    if quantity > 0 {
        price <= limit
    } else {
        price >= limit
    }
}

/// Full notional of all short exposure, as a positive cash amount.
fn short_notional(positions: &PositionBook, prices: &BTreeMap<String, f64>) -> f64 {
    -positions
        .iter()
        .filter(|(_, &qty)| qty < 0)
        .filter_map(|(symbol, &qty)| {
            let price = prices.get(symbol).copied()?;
            price.is_finite().then(|| qty as f64 * price)
        })
        .sum::<f64>()
}

fn zero_costs(quantities: &QuantityMap) -> BTreeMap<String, f64> {
    quantities.keys().map(|s| (s.clone(), 0.0)).collect()
}

fn zero_fills(quantities: &QuantityMap) -> QuantityMap {
    quantities.keys().map(|s| (s.clone(), 0)).collect()
}

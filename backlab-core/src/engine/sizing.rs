//! Order sizer — weights plus capital into integer share quantities.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::domain::{weight_sum, OrderTable, PositionBook, QuantityMap};
use crate::engine::EngineError;

/// Convert a validated order table into signed integer share quantities.
///
/// With positive total weight, the aggregate deployable capital is
///
/// ```text
/// deployable = (sum(w) * value) / sum(w * (price + cost) / price)
/// ```
///
/// which deflates the naive weight-times-value target so that each dollar
/// allocated also pays its own trading cost (`cost` = slippage estimate +
/// flat commission per share). Each instrument's desired position is
/// `w * deployable / price`, and the trade quantity is the gap between
/// `signal * desired` and the current position, truncated toward zero —
/// fractional shares are not supported, so very small targets round to no
/// trade at all.
///
/// With zero total weight the strategy wants no exposure: every current
/// position is closed out in full.
pub fn size_orders(
    orders: &OrderTable,
    prices: &BTreeMap<String, f64>,
    slippage: &BTreeMap<String, f64>,
    commission_per_share: f64,
    value: f64,
    positions: &PositionBook,
    date: NaiveDate,
) -> Result<QuantityMap, EngineError> {
    let total_weight = weight_sum(orders);
    let mut quantities = QuantityMap::new();

    if total_weight > 0.0 {
        let mut cost_adjusted_weight = 0.0;
        for (symbol, rec) in orders {
            if rec.weight == 0.0 {
                continue;
            }
            let price = price_for(prices, symbol, date)?;
            let cost = slippage.get(symbol).copied().unwrap_or(0.0) + commission_per_share;
            cost_adjusted_weight += rec.weight * (price + cost) / price;
        }
        let deployable = total_weight * value / cost_adjusted_weight;

        for (symbol, rec) in orders {
            let current = positions.get(symbol).copied().unwrap_or(0);
            let quantity = if rec.weight == 0.0 {
                // Unweighted instruments need no price: close them out.
                -current
            } else {
                let price = price_for(prices, symbol, date)?;
                let desired = rec.weight * deployable / price;
                (f64::from(rec.signal) * desired - current as f64).trunc() as i64
            };
            quantities.insert(symbol.clone(), quantity);
        }
    } else {
        // Full liquidation: no price needed to close what is already held.
        for symbol in orders.keys() {
            let current = positions.get(symbol).copied().unwrap_or(0);
            quantities.insert(symbol.clone(), -current);
        }
    }

    Ok(quantities)
}

fn price_for(
    prices: &BTreeMap<String, f64>,
    symbol: &str,
    date: NaiveDate,
) -> Result<f64, EngineError> {
    let price = prices
        .get(symbol)
        .copied()
        .ok_or_else(|| EngineError::UnknownInstrument {
            date,
            symbol: symbol.to_string(),
        })?;
    if !(price > 0.0) {
        return Err(EngineError::ZeroPrice {
            date,
            symbol: symbol.to_string(),
        });
    }
    Ok(price)
}

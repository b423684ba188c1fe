//! Order validator — structural checks on a strategy's output.

use chrono::NaiveDate;

use crate::domain::{weight_sum, OrderTable};
use crate::engine::EngineError;

/// Validate a day's order table in place.
///
/// Checks, for every instrument: signal in {-1, 0, 1}, limit price a
/// non-negative finite number, weight a non-negative finite number. Any
/// violation is fatal — the strategy is defective, not the engine — and
/// aborts before any ledger state is touched.
///
/// Side effect: if the weights sum to more than 1 they are rescaled by
/// `1 / sum` in place, preserving their proportions. Never an error.
pub fn validate_orders(orders: &mut OrderTable, date: NaiveDate) -> Result<(), EngineError> {
    for (symbol, rec) in orders.iter() {
        if !matches!(rec.signal, -1 | 0 | 1) {
            return Err(EngineError::InvalidSignal {
                date,
                symbol: symbol.clone(),
                signal: rec.signal,
            });
        }
        if !rec.limit_price.is_finite() || rec.limit_price < 0.0 {
            return Err(EngineError::InvalidPrice {
                date,
                symbol: symbol.clone(),
                price: rec.limit_price,
            });
        }
        if !rec.weight.is_finite() || rec.weight < 0.0 {
            return Err(EngineError::InvalidWeight {
                date,
                symbol: symbol.clone(),
                weight: rec.weight,
            });
        }
    }

    let total = weight_sum(orders);
    if total > 1.0 {
        for rec in orders.values_mut() {
            rec.weight /= total;
        }
    }
    Ok(())
}

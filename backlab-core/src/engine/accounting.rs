//! Accounting — daily pnl split and mark-to-market portfolio value.

use std::collections::BTreeMap;

use crate::domain::PositionBook;

/// Per-instrument pnl for one day, net of trading costs.
///
/// Splits into the leg attributable to today's position (close minus open)
/// and the leg attributable to yesterday's carried position (yesterday's
/// close to today's open). Instruments whose prices are not finite
/// contribute nothing.
pub fn daily_pnl(
    positions_after: &PositionBook,
    positions_before: &PositionBook,
    open_today: &BTreeMap<String, f64>,
    close_today: &BTreeMap<String, f64>,
    close_yesterday: &BTreeMap<String, f64>,
    cost_to_trade: &BTreeMap<String, f64>,
) -> BTreeMap<String, f64> {
    let mut symbols: Vec<&String> = positions_after.keys().collect();
    for symbol in positions_before.keys() {
        if !positions_after.contains_key(symbol) {
            symbols.push(symbol);
        }
    }

    let mut pnl = BTreeMap::new();
    for symbol in symbols {
        let after = positions_after.get(symbol).copied().unwrap_or(0) as f64;
        let before = positions_before.get(symbol).copied().unwrap_or(0) as f64;
        let open = finite(open_today, symbol);
        let close = finite(close_today, symbol);
        let close_prev = finite(close_yesterday, symbol);
        let cost = cost_to_trade.get(symbol).copied().unwrap_or(0.0);
        let value = after * (close - open) + before * (open - close_prev) - cost;
        pnl.insert(symbol.clone(), value);
    }
    pnl
}

/// Mark-to-market portfolio value at the close.
///
/// Short exposure is already represented by the reserved margin, so only
/// long positions are added on top of funds + margin. Recomputed fully
/// every day, never incremented deltawise.
pub fn portfolio_value(
    funds: f64,
    margin: f64,
    positions: &PositionBook,
    close_today: &BTreeMap<String, f64>,
) -> f64 {
    let longs: f64 = positions
        .iter()
        .filter(|(_, &qty)| qty > 0)
        .map(|(symbol, &qty)| qty as f64 * finite(close_today, symbol))
        .sum();
    funds + margin + longs
}

fn finite(prices: &BTreeMap<String, f64>, symbol: &str) -> f64 {
    prices
        .get(symbol)
        .copied()
        .filter(|p| p.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prices(symbol: &str, value: f64) -> BTreeMap<String, f64> {
        BTreeMap::from([(symbol.to_string(), value)])
    }

    #[test]
    fn pnl_splits_new_and_carried_legs() {
        // Carried 10 shares from yesterday's 98 close, bought 5 more at
        // today's 100 open, closed at 102.
        let before = PositionBook::from([("AAA".to_string(), 10)]);
        let after = PositionBook::from([("AAA".to_string(), 15)]);
        let pnl = daily_pnl(
            &after,
            &before,
            &prices("AAA", 100.0),
            &prices("AAA", 102.0),
            &prices("AAA", 98.0),
            &BTreeMap::new(),
        );
        // 15 * (102 - 100) + 10 * (100 - 98) = 30 + 20.
        assert!((pnl["AAA"] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn pnl_subtracts_trading_costs() {
        let after = PositionBook::from([("AAA".to_string(), 99)]);
        let costs = BTreeMap::from([("AAA".to_string(), 59.4)]);
        let pnl = daily_pnl(
            &after,
            &PositionBook::new(),
            &prices("AAA", 100.0),
            &prices("AAA", 102.0),
            &prices("AAA", 100.0),
            &costs,
        );
        assert!((pnl["AAA"] - 138.6).abs() < 1e-9);
    }

    #[test]
    fn pnl_covers_positions_closed_today() {
        // Position existed yesterday, fully closed today: the carried leg
        // still accrues.
        let before = PositionBook::from([("AAA".to_string(), 10)]);
        let after = PositionBook::from([("AAA".to_string(), 0)]);
        let pnl = daily_pnl(
            &after,
            &before,
            &prices("AAA", 101.0),
            &prices("AAA", 105.0),
            &prices("AAA", 100.0),
            &BTreeMap::new(),
        );
        assert!((pnl["AAA"] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn value_counts_longs_only() {
        let positions =
            PositionBook::from([("AAA".to_string(), 10), ("BBB".to_string(), -5)]);
        let closes =
            BTreeMap::from([("AAA".to_string(), 100.0), ("BBB".to_string(), 40.0)]);
        // Shorts live in the margin term, not in the sum.
        let value = portfolio_value(500.0, 200.0, &positions, &closes);
        assert_eq!(value, 1_700.0);
    }
}

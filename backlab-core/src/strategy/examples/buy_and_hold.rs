//! Equal-weight buy and hold.

use crate::domain::{OrderRecord, OrderTable};
use crate::strategy::{LookbackWindow, Strategy};

/// Go long every instrument with equal weight, at market, every day.
///
/// The sizer converts the unchanged weights into small top-up trades as
/// prices drift, so after the first day this mostly holds.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuyAndHold;

impl Strategy for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn on_day(&self, window: &LookbackWindow<'_>) -> OrderTable {
        let symbols = window.symbols();
        let weight = if symbols.is_empty() {
            0.0
        } else {
            1.0 / symbols.len() as f64
        };
        symbols
            .iter()
            .map(|symbol| (symbol.clone(), OrderRecord::market(1, weight)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{MarketData, SymbolSeries};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    #[test]
    fn equal_weights_across_universe() {
        let dates = vec![
            NaiveDate::from_ymd_opt(2016, 5, 2).unwrap(),
            NaiveDate::from_ymd_opt(2016, 5, 3).unwrap(),
        ];
        let series_for = |price: f64| SymbolSeries {
            open: vec![price; 2],
            high: vec![price; 2],
            low: vec![price; 2],
            close: vec![price; 2],
            volume: vec![0.0; 2],
        };
        let mut series = BTreeMap::new();
        series.insert("AAA".to_string(), series_for(10.0));
        series.insert("BBB".to_string(), series_for(20.0));
        let data = MarketData::new(dates, series).unwrap();

        let window = crate::strategy::LookbackWindow::new(&data, 0, 1, &[]);
        let orders = BuyAndHold.on_day(&window);
        assert_eq!(orders.len(), 2);
        for rec in orders.values() {
            assert_eq!(rec.signal, 1);
            assert!((rec.weight - 0.5).abs() < 1e-12);
            assert_eq!(rec.limit_price, 0.0);
        }
    }
}

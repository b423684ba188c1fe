//! Immutable aligned market snapshot.
//!
//! `MarketData` is built once by the caller (the runner's CSV loader, a
//! synthetic generator, a test fixture) and passed by shared reference into
//! the simulation loop. Every series is aligned to the common date axis;
//! a gap the loader could not fill shows up as NaN and is handled by the
//! engine's missing-price policy, never by mutating the snapshot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Structured errors raised while assembling a snapshot.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("snapshot has no dates")]
    EmptyDates,

    #[error("snapshot has no instruments")]
    EmptySymbols,

    #[error("dates are not strictly ascending at index {index}")]
    UnsortedDates { index: usize },

    #[error("{symbol}: {field} has {got} values, expected {expected}")]
    LengthMismatch {
        symbol: String,
        field: &'static str,
        expected: usize,
        got: usize,
    },
}

/// Daily OHLCV series for one instrument, aligned to the snapshot's dates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolSeries {
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    /// Carried for completeness; the core engine never reads it.
    pub volume: Vec<f64>,
}

/// Aligned daily bars for a fixed universe of instruments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketData {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    series: BTreeMap<String, SymbolSeries>,
}

impl MarketData {
    /// Build a snapshot, checking that every series spans the date axis.
    pub fn new(
        dates: Vec<NaiveDate>,
        series: BTreeMap<String, SymbolSeries>,
    ) -> Result<Self, FeedError> {
        if dates.is_empty() {
            return Err(FeedError::EmptyDates);
        }
        if series.is_empty() {
            return Err(FeedError::EmptySymbols);
        }
        for (index, pair) in dates.windows(2).enumerate() {
            if pair[0] >= pair[1] {
                return Err(FeedError::UnsortedDates { index: index + 1 });
            }
        }
        let expected = dates.len();
        for (symbol, s) in &series {
            for (field, len) in [
                ("open", s.open.len()),
                ("high", s.high.len()),
                ("low", s.low.len()),
                ("close", s.close.len()),
                ("volume", s.volume.len()),
            ] {
                if len != expected {
                    return Err(FeedError::LengthMismatch {
                        symbol: symbol.clone(),
                        field,
                        expected,
                        got: len,
                    });
                }
            }
        }
        let symbols = series.keys().cloned().collect();
        Ok(Self {
            dates,
            symbols,
            series,
        })
    }

    /// Number of trading days in the snapshot.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Fixed instrument universe, in symbol order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn open(&self, symbol: &str) -> Option<&[f64]> {
        self.series.get(symbol).map(|s| s.open.as_slice())
    }

    pub fn high(&self, symbol: &str) -> Option<&[f64]> {
        self.series.get(symbol).map(|s| s.high.as_slice())
    }

    pub fn low(&self, symbol: &str) -> Option<&[f64]> {
        self.series.get(symbol).map(|s| s.low.as_slice())
    }

    pub fn close(&self, symbol: &str) -> Option<&[f64]> {
        self.series.get(symbol).map(|s| s.close.as_slice())
    }

    pub fn volume(&self, symbol: &str) -> Option<&[f64]> {
        self.series.get(symbol).map(|s| s.volume.as_slice())
    }

    /// Open prices for every instrument at day `t`.
    pub fn open_row(&self, t: usize) -> BTreeMap<String, f64> {
        self.row(t, |s| &s.open)
    }

    /// Close prices for every instrument at day `t`.
    pub fn close_row(&self, t: usize) -> BTreeMap<String, f64> {
        self.row(t, |s| &s.close)
    }

    /// Per-instrument slippage estimate from day `t`'s high-low range.
    pub fn slippage_row(&self, t: usize, factor: f64) -> BTreeMap<String, f64> {
        self.series
            .iter()
            .map(|(symbol, s)| {
                let estimate = (s.high[t] - s.low[t]) * factor;
                (symbol.clone(), estimate)
            })
            .collect()
    }

    fn row(&self, t: usize, pick: impl Fn(&SymbolSeries) -> &Vec<f64>) -> BTreeMap<String, f64> {
        self.series
            .iter()
            .map(|(symbol, s)| (symbol.clone(), pick(s)[t]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(n: usize) -> Vec<NaiveDate> {
        (0..n)
            .map(|i| NaiveDate::from_ymd_opt(2016, 1, 4).unwrap() + chrono::Days::new(i as u64))
            .collect()
    }

    fn flat_series(n: usize, price: f64) -> SymbolSeries {
        SymbolSeries {
            open: vec![price; n],
            high: vec![price + 1.0; n],
            low: vec![price - 1.0; n],
            close: vec![price; n],
            volume: vec![1_000.0; n],
        }
    }

    #[test]
    fn snapshot_accepts_aligned_series() {
        let mut series = BTreeMap::new();
        series.insert("AAA".to_string(), flat_series(5, 100.0));
        let data = MarketData::new(dates(5), series).unwrap();
        assert_eq!(data.len(), 5);
        assert_eq!(data.symbols(), ["AAA".to_string()]);
        assert_eq!(data.open("AAA").unwrap()[0], 100.0);
    }

    #[test]
    fn snapshot_rejects_length_mismatch() {
        let mut series = BTreeMap::new();
        series.insert("AAA".to_string(), flat_series(4, 100.0));
        let err = MarketData::new(dates(5), series).unwrap_err();
        assert!(matches!(err, FeedError::LengthMismatch { field: "open", .. }));
    }

    #[test]
    fn snapshot_rejects_unsorted_dates() {
        let mut ds = dates(3);
        ds.swap(1, 2);
        let mut series = BTreeMap::new();
        series.insert("AAA".to_string(), flat_series(3, 100.0));
        let err = MarketData::new(ds, series).unwrap_err();
        assert!(matches!(err, FeedError::UnsortedDates { .. }));
    }

    #[test]
    fn slippage_row_uses_high_low_range() {
        let mut series = BTreeMap::new();
        series.insert(
            "AAA".to_string(),
            SymbolSeries {
                open: vec![100.0],
                high: vec![105.0],
                low: vec![95.0],
                close: vec![102.0],
                volume: vec![0.0],
            },
        );
        let data = MarketData::new(dates(1), series).unwrap();
        let slippage = data.slippage_row(0, 0.05);
        assert!((slippage["AAA"] - 0.5).abs() < 1e-12);
    }
}

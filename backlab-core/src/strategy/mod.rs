//! Strategy callback seam.
//!
//! A strategy is a synchronous function of the trailing lookback window.
//! It never sees today's bar, and it cannot reach the ledger being built —
//! only the rows already appended for past days.

pub mod examples;

use chrono::NaiveDate;

use crate::domain::{LedgerRow, OrderTable};
use crate::feed::MarketData;

/// Bounded trailing slice of history visible to a strategy when deciding
/// today's order.
///
/// Market series accessors return the `[start, today)` slice for one
/// instrument; `prior_rows` exposes the strategy's own past positions,
/// orders, and pnl over the same horizon for strategies that condition on
/// their own behavior.
pub struct LookbackWindow<'a> {
    data: &'a MarketData,
    start: usize,
    end: usize,
    prior_rows: &'a [LedgerRow],
}

impl<'a> LookbackWindow<'a> {
    pub(crate) fn new(
        data: &'a MarketData,
        start: usize,
        end: usize,
        prior_rows: &'a [LedgerRow],
    ) -> Self {
        debug_assert!(start <= end && end <= data.len());
        Self {
            data,
            start,
            end,
            prior_rows,
        }
    }

    /// Number of days in the window. At least 1 once the loop is running.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dates(&self) -> &'a [NaiveDate] {
        &self.data.dates()[self.start..self.end]
    }

    /// Instrument universe in scope for this run.
    pub fn symbols(&self) -> &'a [String] {
        self.data.symbols()
    }

    pub fn open(&self, symbol: &str) -> Option<&'a [f64]> {
        self.data.open(symbol).map(|s| &s[self.start..self.end])
    }

    pub fn high(&self, symbol: &str) -> Option<&'a [f64]> {
        self.data.high(symbol).map(|s| &s[self.start..self.end])
    }

    pub fn low(&self, symbol: &str) -> Option<&'a [f64]> {
        self.data.low(symbol).map(|s| &s[self.start..self.end])
    }

    pub fn close(&self, symbol: &str) -> Option<&'a [f64]> {
        self.data.close(symbol).map(|s| &s[self.start..self.end])
    }

    pub fn volume(&self, symbol: &str) -> Option<&'a [f64]> {
        self.data.volume(symbol).map(|s| &s[self.start..self.end])
    }

    /// Ledger rows for the days already simulated, oldest first, bounded
    /// by the same lookback horizon as the market series.
    pub fn prior_rows(&self) -> &'a [LedgerRow] {
        self.prior_rows
    }
}

/// A trading strategy: history in, desired exposure out.
///
/// Implementations must cover every instrument in `window.symbols()` they
/// care about; instruments left out of the table are treated as flat. The
/// engine validates the returned table before using it, so a defective
/// strategy aborts the run rather than corrupting the ledger.
pub trait Strategy: Send + Sync {
    /// Human-readable name, used in batch reports and CLI output.
    fn name(&self) -> &str;

    /// Decide today's order table from the trailing window.
    fn on_day(&self, window: &LookbackWindow<'_>) -> OrderTable;
}

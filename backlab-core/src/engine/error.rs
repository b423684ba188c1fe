//! Structured engine errors.
//!
//! Two fatal families: configuration errors raised before the first
//! simulated day, and strategy contract violations that abort a run
//! mid-flight. Recoverable data conditions (a missing price on a traded
//! day) are not errors — they become warnings on the run result.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("lookback must be a positive number of days")]
    InvalidLookback,

    #[error("starting budget must be positive (got {0})")]
    InvalidBudget(f64),

    #[error("end date {end} is before start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("no simulatable trading days in the requested range")]
    EmptyDateRange,

    #[error("{date} {symbol}: signal must be -1, 0 or 1 (got {signal})")]
    InvalidSignal {
        date: NaiveDate,
        symbol: String,
        signal: i32,
    },

    #[error("{date} {symbol}: limit price must be a non-negative number (got {price})")]
    InvalidPrice {
        date: NaiveDate,
        symbol: String,
        price: f64,
    },

    #[error("{date} {symbol}: weight must be a non-negative number (got {weight})")]
    InvalidWeight {
        date: NaiveDate,
        symbol: String,
        weight: f64,
    },

    #[error("{date} {symbol}: open price is not positive, cannot size order")]
    ZeroPrice { date: NaiveDate, symbol: String },

    #[error("{date} {symbol}: strategy ordered an instrument outside the feed universe")]
    UnknownInstrument { date: NaiveDate, symbol: String },
}

//! Bar loading for the runner.
//!
//! Reads per-symbol CSV files (one file per instrument, daily OHLCV rows)
//! and aligns them onto a shared trading calendar:
//! 1. Symbols whose history starts after the calendar does are dropped —
//!    the replay needs every instrument priced from the first day.
//! 2. A symbol that stops trading before the calendar ends has its last
//!    known bar carried forward over the trailing gap.
//! 3. Calendar dates still missing a bar for any surviving symbol
//!    (exchange holiday mismatches) are dropped outright.
//!
//! A synthetic random-walk generator covers demos and tests where no CSV
//! data exists. Synthetic feeds are deterministic per (symbol, seed).

use backlab_core::feed::{FeedError, MarketData, SymbolSeries};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read data directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read '{path}': {source}")]
    Csv {
        path: PathBuf,
        source: csv::Error,
    },

    #[error("no CSV files found in '{path}'")]
    NoSymbols { path: PathBuf },

    #[error("every symbol was dropped during alignment")]
    NoUsableSymbols,

    #[error("invalid date range: {start} to {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error(transparent)]
    Feed(#[from] FeedError),
}

/// One CSV row. Column names follow the historical-data convention of
/// uppercase headers; lowercase is accepted too.
#[derive(Debug, Deserialize)]
struct BarRow {
    #[serde(alias = "DATE", alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "OPEN", alias = "Open")]
    open: f64,
    #[serde(alias = "HIGH", alias = "High")]
    high: f64,
    #[serde(alias = "LOW", alias = "Low")]
    low: f64,
    #[serde(alias = "CLOSE", alias = "Close")]
    close: f64,
    #[serde(alias = "VOLUME", alias = "Volume")]
    volume: f64,
}

/// Result of loading and aligning a set of symbols.
#[derive(Debug)]
pub struct LoadedData {
    /// The aligned, validated feed.
    pub data: MarketData,
    /// Symbols dropped for insufficient history.
    pub dropped: Vec<String>,
    /// Human-readable notes about alignment decisions.
    pub warnings: Vec<String>,
}

/// Load bars for a universe of symbols from a directory of CSV files.
///
/// With an empty universe, every `*.csv` in the directory is loaded and
/// the file stem (uppercased) becomes the symbol name. Files may list rows
/// newest-first or oldest-first; rows are sorted by date either way.
pub fn load_csv_dir(dir: &Path, universe: &[String]) -> Result<LoadedData, LoadError> {
    let symbols = if universe.is_empty() {
        discover_symbols(dir)?
    } else {
        universe.to_vec()
    };
    if symbols.is_empty() {
        return Err(LoadError::NoSymbols {
            path: dir.to_path_buf(),
        });
    }

    let mut raw: BTreeMap<String, BTreeMap<NaiveDate, BarRow>> = BTreeMap::new();
    for symbol in &symbols {
        let path = dir.join(format!("{}.csv", symbol.to_lowercase()));
        let bars = read_csv(&path)?;
        raw.insert(symbol.to_uppercase(), bars);
    }

    align(raw)
}

/// Align per-symbol bar maps onto a shared calendar.
fn align(raw: BTreeMap<String, BTreeMap<NaiveDate, BarRow>>) -> Result<LoadedData, LoadError> {
    let mut warnings = Vec::new();

    // Shared calendar: the union of every symbol's dates.
    let calendar: BTreeSet<NaiveDate> = raw.values().flat_map(|bars| bars.keys().copied()).collect();
    let (first, last) = match (calendar.iter().next(), calendar.iter().next_back()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return Err(LoadError::NoUsableSymbols),
    };

    // Rule 1: drop symbols that start trading after the calendar does.
    let mut dropped = Vec::new();
    let mut kept: BTreeMap<String, BTreeMap<NaiveDate, BarRow>> = BTreeMap::new();
    for (symbol, bars) in raw {
        match bars.keys().next() {
            Some(&symbol_first) if symbol_first <= first => {
                kept.insert(symbol, bars);
            }
            _ => {
                warnings.push(format!(
                    "dropping {symbol}: history starts after the calendar ({first})"
                ));
                dropped.push(symbol);
            }
        }
    }
    if kept.is_empty() {
        return Err(LoadError::NoUsableSymbols);
    }

    // Rule 2: carry the last known bar over a trailing gap.
    for (symbol, bars) in &mut kept {
        let symbol_last = match bars.keys().next_back() {
            Some(&d) => d,
            None => continue,
        };
        if symbol_last < last {
            warnings.push(format!(
                "{symbol} stops at {symbol_last}; carrying its last bar forward to {last}"
            ));
            let held = flat_bar(&bars[&symbol_last]);
            for &date in calendar.range(symbol_last..).skip(1) {
                bars.insert(date, flat_bar(&held));
            }
        }
    }

    // Rule 3: drop dates any surviving symbol still misses.
    let mut complete_dates = Vec::new();
    let mut holes = 0usize;
    for &date in &calendar {
        if kept.values().all(|bars| bars.contains_key(&date)) {
            complete_dates.push(date);
        } else {
            holes += 1;
        }
    }
    if holes > 0 {
        warnings.push(format!("dropped {holes} calendar dates with incomplete data"));
    }

    let mut series = BTreeMap::new();
    for (symbol, bars) in &kept {
        let mut s = SymbolSeries {
            open: Vec::with_capacity(complete_dates.len()),
            high: Vec::with_capacity(complete_dates.len()),
            low: Vec::with_capacity(complete_dates.len()),
            close: Vec::with_capacity(complete_dates.len()),
            volume: Vec::with_capacity(complete_dates.len()),
        };
        for date in &complete_dates {
            let bar = &bars[date];
            s.open.push(bar.open);
            s.high.push(bar.high);
            s.low.push(bar.low);
            s.close.push(bar.close);
            s.volume.push(bar.volume);
        }
        series.insert(symbol.clone(), s);
    }

    let data = MarketData::new(complete_dates, series)?;
    Ok(LoadedData {
        data,
        dropped,
        warnings,
    })
}

/// A carried-forward bar: every price collapses to the last known close,
/// volume to zero. High equals low, so the slippage estimate is zero.
fn flat_bar(bar: &BarRow) -> BarRow {
    BarRow {
        date: bar.date,
        open: bar.close,
        high: bar.close,
        low: bar.close,
        close: bar.close,
        volume: 0.0,
    }
}

fn discover_symbols(dir: &Path) -> Result<Vec<String>, LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LoadError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut symbols = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "csv") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                symbols.push(stem.to_uppercase());
            }
        }
    }
    symbols.sort();
    Ok(symbols)
}

fn read_csv(path: &Path) -> Result<BTreeMap<NaiveDate, BarRow>, LoadError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    let mut bars = BTreeMap::new();
    for row in reader.deserialize::<BarRow>() {
        let bar = row.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        bars.insert(bar.date, bar);
    }
    Ok(bars)
}

/// Generate a synthetic random-walk feed for demos and tests.
///
/// Weekends are skipped. Each symbol walks independently, seeded from
/// (seed, symbol name), so the same inputs always produce the same feed.
pub fn generate_synthetic_feed(
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
    seed: u64,
) -> Result<MarketData, LoadError> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    if end < start {
        return Err(LoadError::InvalidRange { start, end });
    }

    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        let weekday = current.weekday();
        if weekday != chrono::Weekday::Sat && weekday != chrono::Weekday::Sun {
            dates.push(current);
        }
        current += chrono::Duration::days(1);
    }

    let mut series = BTreeMap::new();
    for symbol in symbols {
        let mut rng = StdRng::seed_from_u64(seed ^ fold_symbol(symbol));
        let mut price = 100.0_f64;
        let mut s = SymbolSeries {
            open: Vec::with_capacity(dates.len()),
            high: Vec::with_capacity(dates.len()),
            low: Vec::with_capacity(dates.len()),
            close: Vec::with_capacity(dates.len()),
            volume: Vec::with_capacity(dates.len()),
        };
        for _ in &dates {
            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            s.open.push(open);
            s.high.push(high);
            s.low.push(low);
            s.close.push(close);
            s.volume.push(rng.gen_range(500_000.0..5_000_000.0));
            price = close;
        }
        series.insert(symbol.to_uppercase(), s);
    }

    Ok(MarketData::new(dates, series)?)
}

/// FNV-1a over the symbol name, so each symbol gets its own walk.
fn fold_symbol(symbol: &str) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    for byte in symbol.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

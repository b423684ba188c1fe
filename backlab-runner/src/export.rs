//! Result export — JSON artifacts and the run-log CSV.
//!
//! The CSV mirrors the classic run-log layout: one row per simulated day,
//! newest first, with portfolio-level columns followed by six per-symbol
//! columns (position, order, filled order, trade price, cost to trade,
//! pnl). Returns are expressed as percentages of the starting budget.
//!
//! JSON artifacts carry a `schema_version` field; versions newer than
//! this build are rejected on load.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use backlab_core::feed::MarketData;
use chrono::NaiveDate;

use crate::runner::{BacktestResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema
/// versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Render the run log as CSV, newest day first.
///
/// The feed supplies each day's open as the "trade price" column; days
/// whose date is missing from the feed (never the case for a ledger the
/// engine produced from that feed) get an empty cell.
pub fn export_ledger_csv(result: &BacktestResult, data: &MarketData) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec![
        "Date".to_string(),
        "Daily Returns".to_string(),
        "Total Returns".to_string(),
        "Funds".to_string(),
        "Margin".to_string(),
        "Portfolio Value".to_string(),
    ];
    for symbol in &result.symbols {
        header.push(format!("{symbol} Position"));
        header.push(format!("{symbol} Order"));
        header.push(format!("{symbol} Filled Order"));
        header.push(format!("{symbol} Trade Price"));
        header.push(format!("{symbol} Cost to Trade"));
        header.push(format!("{symbol} PnL"));
    }
    wtr.write_record(&header)
        .context("failed to write CSV header")?;

    let index_by_date: BTreeMap<NaiveDate, usize> = data
        .dates()
        .iter()
        .enumerate()
        .map(|(i, &d)| (d, i))
        .collect();

    for row in result.rows.iter().rev() {
        let mut record = vec![
            row.date.to_string(),
            format!("{:.6}", row.daily_pnl_total * 100.0 / result.budget),
            format!("{:.6}", row.total_pnl * 100.0 / result.budget),
            format!("{:.2}", row.funds),
            format!("{:.2}", row.margin),
            format!("{:.2}", row.value),
        ];
        let feed_index = index_by_date.get(&row.date).copied();
        for symbol in &result.symbols {
            record.push(row.position.get(symbol).copied().unwrap_or(0).to_string());
            record.push(row.order.get(symbol).copied().unwrap_or(0).to_string());
            record.push(row.filled.get(symbol).copied().unwrap_or(0).to_string());
            let trade_price = feed_index
                .and_then(|t| data.open(symbol).and_then(|open| open.get(t).copied()))
                .map(|px| format!("{px:.4}"))
                .unwrap_or_default();
            record.push(trade_price);
            record.push(format!(
                "{:.4}",
                row.cost_to_trade.get(symbol).copied().unwrap_or(0.0)
            ));
            record.push(format!(
                "{:.4}",
                row.daily_pnl.get(symbol).copied().unwrap_or(0.0)
            ));
        }
        wtr.write_record(&record)
            .with_context(|| format!("failed to write CSV row for {}", row.date))?;
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::generate_synthetic_feed;
    use crate::runner::run_backtest_from_data;
    use backlab_core::engine::SimConfig;
    use backlab_core::strategy::examples::BuyAndHold;

    fn sample() -> (MarketData, BacktestResult) {
        let data = generate_synthetic_feed(
            &["AAA".to_string(), "BBB".to_string()],
            NaiveDate::from_ymd_opt(2016, 1, 4).unwrap(),
            NaiveDate::from_ymd_opt(2016, 3, 31).unwrap(),
            5,
        )
        .unwrap();
        let result =
            run_backtest_from_data(&data, &BuyAndHold, SimConfig::new(1_000_000.0, 10)).unwrap();
        (data, result)
    }

    #[test]
    fn csv_has_one_row_per_day_newest_first() {
        let (data, result) = sample();
        let csv_text = export_ledger_csv(&result, &data).unwrap();
        let lines: Vec<&str> = csv_text.lines().collect();
        assert_eq!(lines.len(), result.rows.len() + 1);

        // Newest day first, right after the header.
        let last_date = result.rows.last().unwrap().date.to_string();
        assert!(lines[1].starts_with(&last_date));
        let first_date = result.rows.first().unwrap().date.to_string();
        assert!(lines.last().unwrap().starts_with(&first_date));
    }

    #[test]
    fn csv_header_lists_six_columns_per_symbol() {
        let (data, result) = sample();
        let csv_text = export_ledger_csv(&result, &data).unwrap();
        let header = csv_text.lines().next().unwrap();
        assert_eq!(header.split(',').count(), 6 + 6 * result.symbols.len());
        assert!(header.contains("AAA Position"));
        assert!(header.contains("BBB Filled Order"));
        assert!(header.contains("BBB Trade Price"));
    }

    #[test]
    fn json_round_trip_preserves_schema_version() {
        let (_, result) = sample();
        let json = export_json(&result).unwrap();
        let back = import_json(&json).unwrap();
        assert_eq!(back.schema_version, SCHEMA_VERSION);
        assert_eq!(back.rows.len(), result.rows.len());
    }

    #[test]
    fn future_schema_version_is_rejected() {
        let (_, result) = sample();
        let mut value: serde_json::Value =
            serde_json::from_str(&export_json(&result).unwrap()).unwrap();
        value["schema_version"] = serde_json::json!(SCHEMA_VERSION + 1);
        let err = import_json(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }
}

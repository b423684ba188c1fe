//! SMA mean reversion across the universe.

use crate::domain::{OrderRecord, OrderTable};
use crate::strategy::{LookbackWindow, Strategy};

/// Trade the gap between a long and a short simple moving average.
///
/// For each instrument the deviation is `sma(long) - sma(short)`; weights
/// are the absolute deviations normalized across the universe, and the
/// signal follows the deviation's sign (short-term strength gets sold,
/// short-term weakness gets bought). All orders are market orders.
#[derive(Debug, Clone, Copy)]
pub struct MeanReversion {
    pub long_period: usize,
    pub short_period: usize,
}

impl Default for MeanReversion {
    fn default() -> Self {
        Self {
            long_period: 90,
            short_period: 30,
        }
    }
}

fn trailing_mean(values: &[f64], period: usize) -> f64 {
    let n = period.min(values.len());
    if n == 0 {
        return 0.0;
    }
    values[values.len() - n..].iter().sum::<f64>() / n as f64
}

impl Strategy for MeanReversion {
    fn name(&self) -> &str {
        "mean_reversion"
    }

    fn on_day(&self, window: &LookbackWindow<'_>) -> OrderTable {
        let mut deviations: Vec<(String, f64)> = Vec::new();
        for symbol in window.symbols() {
            let Some(closes) = window.close(symbol) else {
                continue;
            };
            let deviation = trailing_mean(closes, self.long_period)
                - trailing_mean(closes, self.short_period);
            deviations.push((symbol.clone(), deviation));
        }

        let total: f64 = deviations.iter().map(|(_, d)| d.abs()).sum();
        if total == 0.0 {
            // No dispersion to trade: stay flat everywhere.
            return deviations
                .into_iter()
                .map(|(symbol, _)| (symbol, OrderRecord::hold()))
                .collect();
        }

        deviations
            .into_iter()
            .map(|(symbol, deviation)| {
                let signal = if deviation > 0.0 {
                    1
                } else if deviation < 0.0 {
                    -1
                } else {
                    0
                };
                let weight = deviation.abs() / total;
                (symbol, OrderRecord::market(signal, weight))
            })
            .collect()
    }
}

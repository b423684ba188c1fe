//! Performance metrics — pure functions over the daily-return series.
//!
//! Every metric takes the run's daily returns (daily pnl as a fraction of
//! the starting budget) and produces a scalar. No dependencies on the
//! runner, data pipeline, or engine.
//!
//! Conventions:
//! - 252 trading days per year
//! - Returns are additive fractions of the starting budget, not
//!   compounded equity ratios
//! - Ratios with a zero denominator come back as 0.0

use serde::{Deserialize, Serialize};

/// Aggregate performance metrics for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Cumulative pnl as a fraction of the starting budget.
    pub total_return: f64,
    pub annual_return: f64,
    pub annual_vol: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub max_drawdown: f64,
    pub profit_factor: f64,
    /// Fraction of non-flat days that were profitable.
    pub profitability: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics from a daily-return series.
    pub fn compute(daily_returns: &[f64]) -> Self {
        Self {
            total_return: daily_returns.iter().sum(),
            annual_return: annualized_return(daily_returns),
            annual_vol: annual_vol(daily_returns),
            sharpe: sharpe_ratio(daily_returns),
            sortino: sortino_ratio(daily_returns),
            max_drawdown: max_drawdown(daily_returns),
            profit_factor: profit_factor(daily_returns),
            profitability: profitability(daily_returns),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Annualized return: `(1 + total)^(252 / days) - 1`.
///
/// Total return is floored at -1 so a busted run annualizes to -100%
/// instead of producing a complex power.
pub fn annualized_return(daily_returns: &[f64]) -> f64 {
    if daily_returns.is_empty() {
        return 0.0;
    }
    let total: f64 = daily_returns.iter().sum::<f64>().max(-1.0);
    (1.0 + total).powf(252.0 / daily_returns.len() as f64) - 1.0
}

/// Annualized volatility: `sqrt(252) * std(daily returns)`.
pub fn annual_vol(daily_returns: &[f64]) -> f64 {
    (252.0_f64).sqrt() * population_std(daily_returns)
}

/// Sharpe ratio: annualized return over annualized volatility.
pub fn sharpe_ratio(daily_returns: &[f64]) -> f64 {
    let vol = annual_vol(daily_returns);
    if vol < 1e-15 {
        return 0.0;
    }
    annualized_return(daily_returns) / vol
}

/// Sortino ratio: annualized return over annualized downside deviation.
///
/// Downside deviation clamps gains to zero (MAR of 0) and takes the
/// standard deviation over the full clamped series.
pub fn sortino_ratio(daily_returns: &[f64]) -> f64 {
    let clamped: Vec<f64> = daily_returns.iter().map(|r| r.min(0.0)).collect();
    let downside = (252.0_f64).sqrt() * population_std(&clamped);
    if downside < 1e-15 {
        return 0.0;
    }
    annualized_return(daily_returns) / downside
}

/// Maximum drawdown of the daily-return series: the largest gap between
/// the running maximum and the current value. Non-negative.
pub fn max_drawdown(daily_returns: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &r in daily_returns {
        if r > peak {
            peak = r;
        }
        let dd = peak - r;
        if dd > max_dd {
            max_dd = dd;
        }
    }
    max_dd
}

/// Profit factor: gross gains over gross losses. Zero when there are no
/// losing days.
pub fn profit_factor(daily_returns: &[f64]) -> f64 {
    let gains: f64 = daily_returns.iter().filter(|r| **r > 0.0).sum();
    let losses: f64 = daily_returns.iter().filter(|r| **r < 0.0).sum();
    if losses == 0.0 {
        return 0.0;
    }
    -gains / losses
}

/// Fraction of non-flat days that came out positive. Zero when every day
/// is flat.
pub fn profitability(daily_returns: &[f64]) -> f64 {
    let active = daily_returns.iter().filter(|r| **r != 0.0).count();
    if active == 0 {
        return 0.0;
    }
    let winners = daily_returns.iter().filter(|r| **r > 0.0).count();
    winners as f64 / active as f64
}

// ─── Helpers ────────────────────────────────────────────────────────

fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Annualized return ──

    #[test]
    fn annualized_return_one_year() {
        // 252 days summing to +10% annualizes to exactly +10%.
        let r = vec![0.1 / 252.0; 252];
        assert!((annualized_return(&r) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn annualized_return_half_year_compounds() {
        // 126 days summing to +10% annualizes to 1.1^2 - 1 = 21%.
        let r = vec![0.1 / 126.0; 126];
        assert!((annualized_return(&r) - 0.21).abs() < 1e-9);
    }

    #[test]
    fn annualized_return_floors_total_at_minus_one() {
        let r = vec![-0.5, -0.6, -0.7];
        assert!((annualized_return(&r) - (-1.0)).abs() < 1e-12);
    }

    #[test]
    fn annualized_return_empty() {
        assert_eq!(annualized_return(&[]), 0.0);
    }

    // ── Volatility ──

    #[test]
    fn annual_vol_known_series() {
        // Population std of [0.01, -0.01] is 0.01.
        let r = vec![0.01, -0.01];
        let expected = 0.01 * 252.0_f64.sqrt();
        assert!((annual_vol(&r) - expected).abs() < 1e-12);
    }

    #[test]
    fn annual_vol_constant_is_zero() {
        let r = vec![0.005; 100];
        assert!(annual_vol(&r) < 1e-12);
    }

    // ── Sharpe ──

    #[test]
    fn sharpe_is_return_over_vol() {
        let r = vec![0.02, 0.0, 0.01, -0.005];
        let expected = annualized_return(&r) / annual_vol(&r);
        assert!((sharpe_ratio(&r) - expected).abs() < 1e-12);
    }

    #[test]
    fn sharpe_zero_vol_is_zero() {
        let r = vec![0.001; 50];
        assert_eq!(sharpe_ratio(&r), 0.0);
    }

    // ── Sortino ──

    #[test]
    fn sortino_no_downside_is_zero() {
        let r = vec![0.01, 0.02, 0.0, 0.03];
        assert_eq!(sortino_ratio(&r), 0.0);
    }

    #[test]
    fn sortino_exceeds_sharpe_for_mostly_up_series() {
        // Downside deviation over the clamped series is smaller than the
        // full std when most days are up, so Sortino >= Sharpe here.
        let r = vec![0.02, 0.015, -0.005, 0.02, 0.01, -0.002, 0.03];
        assert!(sortino_ratio(&r) > sharpe_ratio(&r));
    }

    // ── Max drawdown ──

    #[test]
    fn max_drawdown_known_series() {
        // Running max is 0.05 throughout; worst gap is 0.05 - (-0.02).
        let r = vec![0.05, -0.02, 0.01];
        assert!((max_drawdown(&r) - 0.07).abs() < 1e-12);
    }

    #[test]
    fn max_drawdown_monotonic_increase_is_zero() {
        let r = vec![0.01, 0.02, 0.03];
        assert_eq!(max_drawdown(&r), 0.0);
    }

    #[test]
    fn max_drawdown_empty() {
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    // ── Profit factor ──

    #[test]
    fn profit_factor_known_series() {
        // Gains 0.25 against losses 0.05.
        let r = vec![0.1, -0.05, 0.15, 0.0];
        assert!((profit_factor(&r) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn profit_factor_no_losses_is_zero() {
        let r = vec![0.1, 0.2];
        assert_eq!(profit_factor(&r), 0.0);
    }

    // ── Profitability ──

    #[test]
    fn profitability_ignores_flat_days() {
        // Two winners out of three non-flat days.
        let r = vec![0.1, -0.05, 0.15, 0.0];
        assert!((profitability(&r) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn profitability_all_flat_is_zero() {
        let r = vec![0.0; 10];
        assert_eq!(profitability(&r), 0.0);
    }

    // ── Aggregate ──

    #[test]
    fn compute_all_metrics_finite() {
        let r = vec![0.01, -0.02, 0.015, 0.0, -0.005, 0.02];
        let m = PerformanceMetrics::compute(&r);
        assert!((m.total_return - 0.02).abs() < 1e-12);
        assert!(m.annual_return.is_finite());
        assert!(m.annual_vol > 0.0);
        assert!(m.sharpe.is_finite());
        assert!(m.sortino.is_finite());
        assert!(m.max_drawdown > 0.0);
        assert!(m.profit_factor > 0.0);
        assert!((m.profitability - 3.0 / 5.0).abs() < 1e-12);
    }

    #[test]
    fn compute_empty_series_is_all_zero() {
        let m = PerformanceMetrics::compute(&[]);
        assert_eq!(m.total_return, 0.0);
        assert_eq!(m.annual_return, 0.0);
        assert_eq!(m.annual_vol, 0.0);
        assert_eq!(m.sharpe, 0.0);
        assert_eq!(m.sortino, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
    }
}

//! Criterion benchmarks for the replay hot paths.
//!
//! Benchmarks:
//! 1. Full replay loop (buy-and-hold over growing feeds)
//! 2. Multi-instrument sizing and execution
//! 3. Mean-reversion replay (strategy with real lookback work)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::BTreeMap;

use backlab_core::engine::{run_backtest, SimConfig};
use backlab_core::feed::{MarketData, SymbolSeries};
use backlab_core::strategy::examples::{BuyAndHold, MeanReversion};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_feed(days: usize, num_symbols: usize) -> MarketData {
    let base_date = chrono::NaiveDate::from_ymd_opt(2015, 1, 2).unwrap();
    let dates: Vec<_> = (0..days)
        .map(|i| base_date + chrono::Duration::days(i as i64))
        .collect();
    let mut series = BTreeMap::new();
    for s in 0..num_symbols {
        let close: Vec<f64> = (0..days)
            .map(|i| 100.0 + (s as f64 * 10.0) + (i as f64 * 0.1).sin() * 10.0)
            .collect();
        let open: Vec<f64> = close.iter().map(|c| c - 0.3).collect();
        let high: Vec<f64> = close.iter().map(|c| c + 1.5).collect();
        let low: Vec<f64> = close.iter().map(|c| c - 1.5).collect();
        series.insert(
            format!("SYM{s}"),
            SymbolSeries {
                open,
                high,
                low,
                close,
                volume: vec![1_000_000.0; days],
            },
        );
    }
    MarketData::new(dates, series).unwrap()
}

// ── 1. Full Replay Loop ──────────────────────────────────────────────

fn bench_replay_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay_loop");

    for &days in &[252, 1260, 2520] {
        let feed = make_feed(days, 1);
        group.bench_with_input(BenchmarkId::new("buy_and_hold", days), &days, |b, _| {
            b.iter(|| {
                run_backtest(
                    black_box(&feed),
                    &BuyAndHold,
                    black_box(SimConfig::new(100_000.0, 30)),
                )
            });
        });
    }

    group.finish();
}

// ── 2. Multi-Instrument Sizing and Execution ─────────────────────────

fn bench_multi_instrument(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_instrument");

    for &num_symbols in &[5, 20, 50] {
        let feed = make_feed(1260, num_symbols);
        group.bench_with_input(
            BenchmarkId::new("buy_and_hold_1260_days", num_symbols),
            &num_symbols,
            |b, _| {
                b.iter(|| {
                    run_backtest(
                        black_box(&feed),
                        &BuyAndHold,
                        black_box(SimConfig::new(100_000.0, 30)),
                    )
                });
            },
        );
    }

    group.finish();
}

// ── 3. Mean-Reversion Replay ─────────────────────────────────────────

fn bench_mean_reversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("mean_reversion");

    let feed = make_feed(1260, 10);
    group.bench_function("10_symbols_1260_days", |b| {
        b.iter(|| {
            run_backtest(
                black_box(&feed),
                &MeanReversion::default(),
                black_box(SimConfig::new(100_000.0, 90)),
            )
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_replay_loop,
    bench_multi_instrument,
    bench_mean_reversion,
);
criterion_main!(benches);

//! Backlab CLI — run and demo commands.
//!
//! Commands:
//! - `run` — execute a replay from a TOML config file, then write the
//!   run-log CSV and result JSON artifacts
//! - `demo` — replay a named strategy on a synthetic random-walk feed

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use backlab_runner::config::{BacktestConfig, StrategySection};
use backlab_runner::export::{export_json, export_ledger_csv};
use backlab_runner::runner::{build_strategy, run_single_backtest};
use backlab_runner::{generate_synthetic_feed, load_csv_dir, run_backtest_from_data, BacktestResult};

#[derive(Parser)]
#[command(name = "backlab", about = "Backlab CLI — daily-bar strategy replay engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a replay from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Replay a strategy on a synthetic random-walk feed.
    Demo {
        /// Strategy name: buy_and_hold or mean_reversion.
        #[arg(long, default_value = "mean_reversion")]
        strategy: String,

        /// Symbols to simulate.
        #[arg(long, default_values_t = [String::from("AAA"), String::from("BBB"), String::from("CCC")])]
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD).
        #[arg(long, default_value = "2015-01-02")]
        start: String,

        /// End date (YYYY-MM-DD).
        #[arg(long, default_value = "2016-12-30")]
        end: String,

        /// Starting budget.
        #[arg(long, default_value_t = 1_000_000.0)]
        budget: f64,

        /// Lookback window in trading days.
        #[arg(long, default_value_t = 90)]
        lookback: usize,

        /// Seed for the synthetic feed.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output_dir } => cmd_run(&config, &output_dir),
        Commands::Demo {
            strategy,
            symbols,
            start,
            end,
            budget,
            lookback,
            seed,
        } => cmd_demo(&strategy, &symbols, &start, &end, budget, lookback, seed),
    }
}

fn cmd_run(config_path: &PathBuf, output_dir: &PathBuf) -> Result<()> {
    let config = BacktestConfig::from_path(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let result = run_single_backtest(&config)?;
    for warning in &result.warnings {
        eprintln!("warning: {warning}");
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let json_path = output_dir.join("result.json");
    std::fs::write(&json_path, export_json(&result)?)
        .with_context(|| format!("writing {}", json_path.display()))?;

    // The run log needs the feed for trade prices; synthetic configs
    // regenerate it deterministically from the same seed.
    let data = if config.data.synthetic {
        let (Some(start), Some(end)) = (config.backtest.start, config.backtest.end) else {
            bail!("synthetic config is missing its date range");
        };
        generate_synthetic_feed(&config.backtest.universe, start, end, config.data.seed)?
    } else {
        load_csv_dir(&config.data.dir, &config.backtest.universe)?.data
    };
    let csv_path = output_dir.join("run.csv");
    std::fs::write(&csv_path, export_ledger_csv(&result, &data)?)
        .with_context(|| format!("writing {}", csv_path.display()))?;

    print_summary(&result);
    println!();
    println!("Artifacts saved to: {}", output_dir.display());
    Ok(())
}

fn cmd_demo(
    strategy_name: &str,
    symbols: &[String],
    start: &str,
    end: &str,
    budget: f64,
    lookback: usize,
    seed: u64,
) -> Result<()> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").context("invalid --start date")?;
    let end = NaiveDate::parse_from_str(end, "%Y-%m-%d").context("invalid --end date")?;

    let section = StrategySection {
        name: strategy_name.to_string(),
        long_period: None,
        short_period: None,
    };
    let strategy = build_strategy(&section)?;

    let data = generate_synthetic_feed(symbols, start, end, seed)?;
    let sim = backlab_core::engine::SimConfig::new(budget, lookback);
    let result = run_backtest_from_data(&data, strategy.as_ref(), sim)?;

    for warning in &result.warnings {
        eprintln!("warning: {warning}");
    }
    print_summary(&result);
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    println!();
    println!("=== Replay Result ===");
    println!("Strategy:       {}", result.strategy);
    println!("Status:         {:?}", result.status);
    println!("Universe:       {}", result.symbols.join(", "));
    if let (Some(start), Some(end)) = (result.start_date, result.end_date) {
        println!("Period:         {start} to {end} ({} days)", result.rows.len());
    }
    println!("Budget:         {:.2}", result.budget);
    println!("Final Value:    {:.2}", result.final_value);
    println!();
    println!("--- Performance ---");
    println!("Total Return:   {:.2}%", result.metrics.total_return * 100.0);
    println!("Annual Return:  {:.2}%", result.metrics.annual_return * 100.0);
    println!("Annual Vol:     {:.2}%", result.metrics.annual_vol * 100.0);
    println!("Sharpe:         {:.3}", result.metrics.sharpe);
    println!("Sortino:        {:.3}", result.metrics.sortino);
    println!("Max Drawdown:   {:.4}", result.metrics.max_drawdown);
    println!("Profit Factor:  {:.2}", result.metrics.profit_factor);
    println!("Profitability:  {:.1}%", result.metrics.profitability * 100.0);
    if !result.dropped_symbols.is_empty() {
        println!();
        println!("Dropped symbols: {}", result.dropped_symbols.join(", "));
    }
}

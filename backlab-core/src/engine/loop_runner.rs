//! Day-by-day simulation loop — an explicit state machine.
//!
//! `Initializing → Running → {Completed, Insolvent, Aborted}`. Day *t*
//! depends only on state as of day *t−1* and the feed's data for day *t*:
//! no lookahead, no retroactive correction, no concurrency within a run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::portfolio::mark_to_market;
use crate::domain::{LedgerRow, OrderTable, PositionBook, QuantityMap};
use crate::engine::accounting::{daily_pnl, portfolio_value};
use crate::engine::execution::{execute_orders, CostModel};
use crate::engine::sizing::size_orders;
use crate::engine::validate::validate_orders;
use crate::engine::EngineError;
use crate::feed::MarketData;
use crate::strategy::{LookbackWindow, Strategy};

use std::collections::BTreeMap;

/// Configuration surface consumed by the core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Starting budget, in currency units. Must be positive.
    pub budget: f64,
    /// Trailing window length handed to the strategy. Must be positive.
    pub lookback: usize,
    /// Enables commission + slippage modeling.
    pub trading_costs: bool,
    /// Flat commission per share traded.
    pub commission_per_share: f64,
    /// Fraction of the prior day's high-low range used as the slippage
    /// estimate.
    pub slippage_factor: f64,
    /// First date to simulate (inclusive). `None` starts right after the
    /// lookback history.
    pub start: Option<NaiveDate>,
    /// Last date to simulate (inclusive). `None` runs to the end of the
    /// feed.
    pub end: Option<NaiveDate>,
}

impl SimConfig {
    /// Defaults matching the classic setup: costs on, 0.1 commission per
    /// share, slippage at 5% of the prior day's range.
    pub fn new(budget: f64, lookback: usize) -> Self {
        Self {
            budget,
            lookback,
            trading_costs: true,
            commission_per_share: 0.1,
            slippage_factor: 0.05,
            start: None,
            end: None,
        }
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.lookback == 0 {
            return Err(EngineError::InvalidLookback);
        }
        if !self.budget.is_finite() || self.budget <= 0.0 {
            return Err(EngineError::InvalidBudget(self.budget));
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end < start {
                return Err(EngineError::InvalidDateRange { start, end });
            }
        }
        Ok(())
    }
}

/// Loop phase. Terminal phases are `Completed`, `Insolvent`, `Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimPhase {
    Initializing,
    Running,
    Completed,
    Insolvent,
    Aborted,
}

/// How a run ended. Insolvency is an expected terminal condition, not an
/// error; an aborted run surfaces as `Err(EngineError)` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Date range exhausted.
    Completed,
    /// Portfolio value dropped to zero or below; the ledger is partial.
    Insolvent,
}

/// Full output of a run: the historical ledger plus run metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub status: RunStatus,
    /// One row per simulated day, oldest first.
    pub rows: Vec<LedgerRow>,
    /// Recoverable data conditions hit during the run (skipped orders).
    pub warnings: Vec<String>,
    pub budget: f64,
    pub symbols: Vec<String>,
}

impl RunResult {
    pub fn final_value(&self) -> f64 {
        self.rows.last().map(|r| r.value).unwrap_or(self.budget)
    }

    /// Daily pnl normalized by the starting budget.
    pub fn daily_returns(&self) -> Vec<f64> {
        self.rows
            .iter()
            .map(|r| r.daily_pnl_total / self.budget)
            .collect()
    }

    /// Cumulative pnl over the whole run, normalized by the budget.
    pub fn total_return(&self) -> f64 {
        self.rows
            .last()
            .map(|r| r.total_pnl / self.budget)
            .unwrap_or(0.0)
    }
}

/// The sequential simulation loop.
///
/// `new` performs the `Initializing` phase (config checks, seed state);
/// `step` simulates one day; `run` drives to a terminal phase. Position,
/// funds, and margin are owned here and mutated exactly once per day via
/// the execution engine's outcome.
pub struct SimulationLoop<'a> {
    data: &'a MarketData,
    strategy: &'a dyn Strategy,
    config: SimConfig,
    day_indices: Vec<usize>,
    cursor: usize,
    phase: SimPhase,
    positions: PositionBook,
    funds: f64,
    margin: f64,
    total_pnl: f64,
    rows: Vec<LedgerRow>,
    warnings: Vec<String>,
}

impl<'a> SimulationLoop<'a> {
    pub fn new(
        data: &'a MarketData,
        strategy: &'a dyn Strategy,
        config: SimConfig,
    ) -> Result<Self, EngineError> {
        // This constructor is the Initializing phase: anything wrong with
        // the config or the range surfaces here, before any simulation.
        config.validate()?;

        // Simulated days: feed days inside the requested range. The first
        // simulatable index is 1 (day 0 has no prior bar for the slippage
        // estimate); without an explicit start the lookback history is
        // left out entirely.
        let default_first = config.lookback.max(1);
        let day_indices: Vec<usize> = data
            .dates()
            .iter()
            .enumerate()
            .filter(|(t, date)| {
                let after_start = match config.start {
                    Some(start) => **date >= start,
                    None => *t >= default_first,
                };
                let before_end = config.end.map_or(true, |end| **date <= end);
                *t >= 1 && after_start && before_end
            })
            .map(|(t, _)| t)
            .collect();
        if day_indices.is_empty() {
            return Err(EngineError::EmptyDateRange);
        }

        // Seed state at lookback - 1: flat everywhere, all cash.
        let positions: PositionBook = data.symbols().iter().map(|s| (s.clone(), 0)).collect();

        Ok(Self {
            data,
            strategy,
            config,
            day_indices,
            cursor: 0,
            phase: SimPhase::Running,
            positions,
            funds: config.budget,
            margin: 0.0,
            total_pnl: 0.0,
            rows: Vec::new(),
            warnings: Vec::new(),
        })
    }

    pub fn phase(&self) -> SimPhase {
        self.phase
    }

    /// Ledger rows appended so far.
    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    /// Simulate the next day. Returns `Ok(true)` while the loop is still
    /// running, `Ok(false)` once a terminal phase is reached. A strategy
    /// contract violation moves the loop to `Aborted` and propagates.
    pub fn step(&mut self) -> Result<bool, EngineError> {
        if self.phase != SimPhase::Running {
            return Ok(false);
        }
        let t = self.day_indices[self.cursor];
        let date = self.data.dates()[t];

        let window_start = t.saturating_sub(self.config.lookback);
        let rows_start = self.rows.len().saturating_sub(self.config.lookback);
        let window = LookbackWindow::new(self.data, window_start, t, &self.rows[rows_start..]);
        let mut orders = self.strategy.on_day(&window);
        if let Err(err) = validate_orders(&mut orders, date) {
            self.phase = SimPhase::Aborted;
            return Err(err);
        }

        let open_today = self.data.open_row(t);
        let close_today = self.data.close_row(t);
        let close_yesterday = self.data.close_row(t - 1);
        let slippage = self
            .data
            .slippage_row(t - 1, self.config.slippage_factor);

        // A weighted instrument without a usable open price rejects the
        // whole day before the sizer can divide by it. State carries
        // through unchanged and the run continues.
        if let Some(symbol) = unusable_price(&orders, &open_today) {
            self.warnings.push(format!(
                "{date}: price unavailable for {symbol}, day's order rejected"
            ));
            self.push_carry_forward_row(date, &open_today, &close_today, &close_yesterday);
            // Carried positions can still sink the book on a rejected day;
            // advancing would let the terminal cursor overwrite the phase.
            if self.phase == SimPhase::Insolvent {
                return Ok(false);
            }
            return Ok(self.advance());
        }

        let value = mark_to_market(&self.positions, &open_today, self.funds, self.margin);
        let quantities = match size_orders(
            &orders,
            &open_today,
            &slippage,
            self.config.commission_per_share,
            value,
            &self.positions,
            date,
        ) {
            Ok(quantities) => quantities,
            Err(err) => {
                self.phase = SimPhase::Aborted;
                return Err(err);
            }
        };

        let outcome = execute_orders(
            &orders,
            &quantities,
            &self.positions,
            &open_today,
            &slippage,
            self.funds,
            self.margin,
            CostModel {
                enabled: self.config.trading_costs,
                commission_per_share: self.config.commission_per_share,
            },
        );
        if let Some(symbol) = &outcome.rejected {
            self.warnings.push(format!(
                "{date}: price unavailable for {symbol}, day's order rejected"
            ));
        }

        let before = std::mem::replace(&mut self.positions, outcome.positions);
        self.funds = outcome.funds;
        self.margin = outcome.margin;

        let pnl = daily_pnl(
            &self.positions,
            &before,
            &open_today,
            &close_today,
            &close_yesterday,
            &outcome.cost_to_trade,
        );
        let pnl_total: f64 = pnl.values().sum();
        self.total_pnl += pnl_total;
        let value_close =
            portfolio_value(self.funds, self.margin, &self.positions, &close_today);

        self.rows.push(LedgerRow {
            date,
            position: self.positions.clone(),
            order: quantities,
            filled: outcome.filled,
            daily_pnl: pnl,
            daily_pnl_total: pnl_total,
            total_pnl: self.total_pnl,
            cost_to_trade: outcome.cost_to_trade,
            funds: self.funds,
            margin: self.margin,
            value: value_close,
        });

        if value_close <= 0.0 {
            self.phase = SimPhase::Insolvent;
            return Ok(false);
        }
        Ok(self.advance())
    }

    /// Drive the loop to a terminal phase and hand over the ledger.
    pub fn run(mut self) -> Result<RunResult, EngineError> {
        while self.step()? {}
        let status = match self.phase {
            SimPhase::Insolvent => RunStatus::Insolvent,
            _ => RunStatus::Completed,
        };
        Ok(RunResult {
            status,
            rows: self.rows,
            warnings: self.warnings,
            budget: self.config.budget,
            symbols: self.data.symbols().to_vec(),
        })
    }

    fn advance(&mut self) -> bool {
        self.cursor += 1;
        if self.cursor == self.day_indices.len() {
            self.phase = SimPhase::Completed;
            return false;
        }
        true
    }

    /// Append a no-trade row for a rejected day: positions, funds, and
    /// margin unchanged; pnl still accrues on carried positions.
    fn push_carry_forward_row(
        &mut self,
        date: NaiveDate,
        open_today: &BTreeMap<String, f64>,
        close_today: &BTreeMap<String, f64>,
        close_yesterday: &BTreeMap<String, f64>,
    ) {
        let zero_quantities: QuantityMap = self
            .positions
            .keys()
            .map(|symbol| (symbol.clone(), 0))
            .collect();
        let zero_costs: BTreeMap<String, f64> = self
            .positions
            .keys()
            .map(|symbol| (symbol.clone(), 0.0))
            .collect();
        let pnl = daily_pnl(
            &self.positions,
            &self.positions,
            open_today,
            close_today,
            close_yesterday,
            &zero_costs,
        );
        let pnl_total: f64 = pnl.values().sum();
        self.total_pnl += pnl_total;
        let value_close = portfolio_value(self.funds, self.margin, &self.positions, close_today);
        self.rows.push(LedgerRow {
            date,
            position: self.positions.clone(),
            order: zero_quantities.clone(),
            filled: zero_quantities,
            daily_pnl: pnl,
            daily_pnl_total: pnl_total,
            total_pnl: self.total_pnl,
            cost_to_trade: zero_costs,
            funds: self.funds,
            margin: self.margin,
            value: value_close,
        });
        if value_close <= 0.0 {
            self.phase = SimPhase::Insolvent;
        }
    }
}

/// First weighted instrument whose open price today is not usable.
fn unusable_price(orders: &OrderTable, open_today: &BTreeMap<String, f64>) -> Option<String> {
    orders
        .iter()
        .filter(|(_, rec)| rec.weight > 0.0)
        .find(|(symbol, _)| {
            !open_today
                .get(symbol.as_str())
                .copied()
                .unwrap_or(f64::NAN)
                .is_finite()
        })
        .map(|(symbol, _)| symbol.clone())
}

/// Run a full backtest over the snapshot with the given strategy.
///
/// Convenience wrapper over [`SimulationLoop`].
pub fn run_backtest(
    data: &MarketData,
    strategy: &dyn Strategy,
    config: SimConfig,
) -> Result<RunResult, EngineError> {
    SimulationLoop::new(data, strategy, config)?.run()
}

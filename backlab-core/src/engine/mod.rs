//! The order-sizing and execution accounting engine.
//!
//! One simulated day flows through four stages, each a pure function of
//! its inputs: validate the strategy's order table, size it into integer
//! share quantities, execute fills against today's open, and append the
//! day's accounting to the ledger. The simulation loop in `loop_runner`
//! drives the stages in strict day order.

pub mod accounting;
pub mod error;
pub mod execution;
pub mod loop_runner;
pub mod sizing;
pub mod validate;

pub use accounting::{daily_pnl, portfolio_value};
pub use error::EngineError;
pub use execution::{execute_orders, CostModel, ExecutionOutcome};
pub use loop_runner::{run_backtest, RunResult, RunStatus, SimConfig, SimPhase, SimulationLoop};
pub use sizing::size_orders;
pub use validate::validate_orders;

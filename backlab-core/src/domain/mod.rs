//! Domain types shared across the engine.

pub mod ledger;
pub mod order;
pub mod portfolio;

pub use ledger::LedgerRow;
pub use order::{weight_sum, OrderRecord, OrderTable, QuantityMap};
pub use portfolio::{PortfolioState, PositionBook};

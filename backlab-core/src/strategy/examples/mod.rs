//! Reference strategies.
//!
//! Small, self-contained implementations used by the CLI demo, the batch
//! runner, and the integration tests. They are examples of the callback
//! contract, not investment advice.

mod buy_and_hold;
mod mean_reversion;

pub use buy_and_hold::BuyAndHold;
pub use mean_reversion::MeanReversion;

//! Backlab Core — the day-by-day strategy replay engine.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (order table, positions, portfolio state, ledger rows)
//! - Immutable aligned market snapshot (`feed::MarketData`)
//! - Order validation, sizing, and execution with slippage + commission
//! - Per-day accounting (pnl split, margin, mark-to-market value)
//! - The sequential simulation loop with its explicit terminal states
//! - The `Strategy` trait and a couple of reference strategies
//!
//! Everything here is synchronous and single-threaded within one run.
//! Independent runs own their entire state and may execute in parallel
//! (see `backlab-runner`'s batch mode).

pub mod domain;
pub mod engine;
pub mod feed;
pub mod strategy;

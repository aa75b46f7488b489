//! Pool ledger module.
//!
//! This module handles:
//! - Wager records and their identities
//! - Aggregation into per-option totals and per-player positions
//! - Appending through the persistence collaborator

pub mod pool;
pub mod types;

pub use pool::PoolLedger;
pub use types::{LedgerSnapshot, NewWager, OptionTotals, Position, Wager, WagerId};

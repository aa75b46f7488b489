//! Frenbet: pari-mutuel wagering on two-outcome friendly bets.
//!
//! Players back one of two options; when the event resolves, the winning side
//! splits the losing side's pool in proportion to stake.
//!
//! # Pool math
//!
//! ```text
//! Option A pool: $100   (alice)
//! Option B pool:  $60   (bob)
//! ─────────────────────
//! Odds A: 60/100 = 0.60x
//! Odds B: 100/60 = 1.67x
//! bob wins $100 if B resolves; alice wins $60 if A resolves
//! ```
//!
//! Bet sizes are kept comparable by limits expressed as percentages of the
//! first wager placed (50% to 200% by default).
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`session`]: Sessions, drafts, and option sides
//! - [`ledger`]: Append-only wager ledger and snapshots
//! - [`payout`]: Odds and payout calculations
//! - [`limits`]: Bet size limits
//! - [`store`]: Persistence port and in-memory adapter
//! - [`coordinator`]: Session lifecycle and live views
//! - [`feed`]: Change-feed reconciliation
//! - [`share`]: Share links and preview metadata
//! - [`api`]: HTTP API
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod feed;
pub mod ledger;
pub mod limits;
pub mod metrics;
pub mod payout;
pub mod session;
pub mod share;
pub mod store;
pub mod utils;

pub use config::Config;
pub use coordinator::{AppCoordinator, DerivedView, SessionCoordinator};
pub use error::{Result, WagerError};

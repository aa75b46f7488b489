//! Reconciliation feed module.
//!
//! Turns store change notifications into coordinator refreshes so that
//! every local observer converges on the store's state.

pub mod adapter;
pub mod retry;

pub use adapter::ReconciliationFeed;
pub use retry::RetryPolicy;

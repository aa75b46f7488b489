//! Session coordinator module.

pub mod service;
pub mod view;

pub use service::SessionCoordinator;
pub use view::{DerivedView, OptionView};

use crate::store::MemoryStore;

/// Coordinator wired to the in-process store, as served by the binary.
pub type AppCoordinator = SessionCoordinator<MemoryStore>;

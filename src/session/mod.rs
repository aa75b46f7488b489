//! Session module for two-outcome betting events.
//!
//! This module handles:
//! - Session identity, options, and limit percentages
//! - Drafts and the one-way promotion to a live session

pub mod types;

pub use types::{
    BetPercentages, OptionSide, Session, SessionDraft, SessionId, DEFAULT_MAX_BET_PERCENTAGE,
    DEFAULT_MIN_BET_PERCENTAGE,
};

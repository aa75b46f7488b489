//! Bet limit policy module.

pub mod policy;

pub use policy::{
    check_amount, limits, limits_for, validate, BetLimits, MAX_WAGER_AMOUNT, MIN_WAGER_AMOUNT,
};

//! Odds and payout module.

pub mod calculator;

pub use calculator::{
    current_winnings, odds, odds_pair, potential_win, round_money, winnings_by_side, Odds,
};

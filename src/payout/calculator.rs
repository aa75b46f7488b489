//! Pari-mutuel odds and payout calculations.
//!
//! Every function here is a pure function of a [`LedgerSnapshot`].

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};

use crate::ledger::LedgerSnapshot;
use crate::session::OptionSide;

/// Round a money value to cents, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Payout multiplier of one option against the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Odds {
    /// At least one side has no stake yet.
    Undefined,
    /// Opposing total divided by this option's total, rounded to cents.
    Multiplier(Decimal),
}

impl Odds {
    /// The multiplier, if defined.
    pub fn value(&self) -> Option<Decimal> {
        match self {
            Odds::Undefined => None,
            Odds::Multiplier(m) => Some(*m),
        }
    }

    /// Whether odds exist yet.
    pub fn is_defined(&self) -> bool {
        matches!(self, Odds::Multiplier(_))
    }
}

impl fmt::Display for Odds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Odds::Undefined => write!(f, "---"),
            Odds::Multiplier(m) => write!(f, "{:.2}x", m),
        }
    }
}

impl Serialize for Odds {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Odds for `side`: `opposing / this`, undefined unless both sides have stake.
///
/// A ratio outside the `Decimal` range is reported as undefined.
pub fn odds(snapshot: &LedgerSnapshot, side: OptionSide) -> Odds {
    let this = snapshot.total(side);
    let opposing = snapshot.opposing_total(side);

    if this.is_zero() || opposing.is_zero() {
        return Odds::Undefined;
    }

    match opposing.checked_div(this) {
        Some(ratio) => Odds::Multiplier(round_money(ratio)),
        None => Odds::Undefined,
    }
}

/// Odds for both options in index order.
pub fn odds_pair(snapshot: &LedgerSnapshot) -> [Odds; 2] {
    OptionSide::BOTH.map(|side| odds(snapshot, side))
}

/// Live estimate of what a new wager of `candidate` on `side` would earn.
///
/// `candidate / (this + candidate) * opposing`, rounded to cents. Zero for a
/// non-positive candidate or an empty opposing pool.
pub fn potential_win(snapshot: &LedgerSnapshot, side: OptionSide, candidate: Decimal) -> Decimal {
    let opposing = snapshot.opposing_total(side);
    if candidate <= Decimal::ZERO || opposing.is_zero() {
        return Decimal::ZERO;
    }

    let this = snapshot.total(side);
    // A pool past the Decimal range saturates
    let pool = this.checked_add(candidate).unwrap_or(Decimal::MAX);
    round_money(pro_rata(candidate, pool, opposing))
}

/// `stake / pool * prize` for `0 < stake <= pool`. Never exceeds `prize`.
fn pro_rata(stake: Decimal, pool: Decimal, prize: Decimal) -> Decimal {
    match stake.checked_mul(prize) {
        Some(product) => product / pool,
        None => stake / pool * prize,
    }
}

/// A player's payout term for each option, each rounded to cents.
pub fn winnings_by_side(snapshot: &LedgerSnapshot, player_name: &str) -> [Decimal; 2] {
    OptionSide::BOTH.map(|side| {
        let mine = snapshot.position(player_name, side);
        let this = snapshot.total(side);
        let opposing = snapshot.opposing_total(side);

        if mine.is_zero() || this.is_zero() || opposing.is_zero() {
            Decimal::ZERO
        } else {
            round_money(pro_rata(mine, this, opposing))
        }
    })
}

/// Sum of a player's payout terms across both options.
///
/// A player backing both sides gets a term for each; hedges are not netted.
pub fn current_winnings(snapshot: &LedgerSnapshot, player_name: &str) -> Decimal {
    winnings_by_side(snapshot, player_name)
        .iter()
        .fold(Decimal::ZERO, |sum, term| {
            sum.checked_add(*term).unwrap_or(Decimal::MAX)
        })
}

//! Wager records and the aggregated ledger snapshot.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::{OptionSide, SessionId};

/// Opaque wager identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WagerId(Uuid);

impl WagerId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WagerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WagerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Wager to be appended; identity and sequence are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWager {
    /// Owning session.
    pub session_id: SessionId,
    /// Self-asserted display name.
    pub player_name: String,
    /// Chosen option.
    pub side: OptionSide,
    /// Stake, strictly positive.
    pub amount: Decimal,
}

/// A recorded wager. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wager {
    /// Wager identity.
    pub id: WagerId,
    /// Owning session.
    pub session_id: SessionId,
    /// Monotonic insertion sequence assigned by the store.
    pub sequence: u64,
    /// Self-asserted display name.
    pub player_name: String,
    /// Chosen option.
    #[serde(rename = "option_index")]
    pub side: OptionSide,
    /// Stake.
    pub amount: Decimal,
    /// Unix timestamp of insertion.
    pub placed_at: i64,
}

/// One player's summed stake on one option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    /// Display name.
    pub player_name: String,
    /// Sum of this player's wagers on the option.
    pub amount: Decimal,
}

/// Per-option aggregate derived from the wager set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptionTotals {
    /// Sum of all wager amounts on the option.
    pub total_amount: Decimal,
    /// Aggregated positions in first-appearance order.
    pub positions: Vec<Position>,
}

impl OptionTotals {
    fn add(&mut self, player_name: &str, amount: Decimal) {
        self.total_amount = saturating_add(self.total_amount, amount);
        match self
            .positions
            .iter_mut()
            .find(|p| p.player_name == player_name)
        {
            Some(position) => position.amount = saturating_add(position.amount, amount),
            None => self.positions.push(Position {
                player_name: player_name.to_string(),
                amount,
            }),
        }
    }

    /// Aggregated stake for a player, zero if absent.
    pub fn position(&self, player_name: &str) -> Decimal {
        self.positions
            .iter()
            .find(|p| p.player_name == player_name)
            .map(|p| p.amount)
            .unwrap_or(Decimal::ZERO)
    }
}

// Stored rows written by another writer are not bound by the append checks
fn saturating_add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or(Decimal::MAX)
}

/// Read-only, internally consistent view of one session's ledger.
///
/// Every figure here is re-derived from the wager list in one pass; nothing
/// is patched incrementally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerSnapshot {
    /// Session the wagers belong to.
    pub session_id: SessionId,
    /// Totals for option 0 and option 1.
    pub options: [OptionTotals; 2],
    /// Sum of both options' totals.
    pub total_pool: Decimal,
    /// Amount of the wager with the lowest sequence number, if any.
    pub first_wager_amount: Option<Decimal>,
    /// Number of wagers recorded.
    pub wager_count: usize,
    /// Highest sequence number observed.
    pub last_sequence: Option<u64>,
}

impl LedgerSnapshot {
    /// Snapshot of a session with no wagers.
    pub fn empty(session_id: SessionId) -> Self {
        Self {
            session_id,
            options: Default::default(),
            total_pool: Decimal::ZERO,
            first_wager_amount: None,
            wager_count: 0,
            last_sequence: None,
        }
    }

    /// Aggregate a wager list. Order of `wagers` does not matter; the
    /// baseline is always the lowest sequence number.
    pub fn from_wagers(session_id: SessionId, wagers: &[Wager]) -> Self {
        let mut ordered: Vec<&Wager> = wagers
            .iter()
            .filter(|w| w.session_id == session_id)
            .collect();
        ordered.sort_by_key(|w| w.sequence);

        let mut snapshot = Self::empty(session_id);
        for wager in &ordered {
            snapshot.options[wager.side.index()].add(&wager.player_name, wager.amount);
        }

        snapshot.total_pool = snapshot
            .options
            .iter()
            .fold(Decimal::ZERO, |sum, o| saturating_add(sum, o.total_amount));
        snapshot.first_wager_amount = ordered.first().map(|w| w.amount);
        snapshot.wager_count = ordered.len();
        snapshot.last_sequence = ordered.last().map(|w| w.sequence);
        snapshot
    }

    /// Total staked on `side`.
    pub fn total(&self, side: OptionSide) -> Decimal {
        self.options[side.index()].total_amount
    }

    /// Total staked on the other side.
    pub fn opposing_total(&self, side: OptionSide) -> Decimal {
        self.total(side.opposite())
    }

    /// A player's aggregated stake on `side`.
    pub fn position(&self, player_name: &str, side: OptionSide) -> Decimal {
        self.options[side.index()].position(player_name)
    }

    /// Whether no wager has been recorded.
    pub fn is_empty(&self) -> bool {
        self.wager_count == 0
    }
}

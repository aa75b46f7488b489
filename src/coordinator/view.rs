//! Derived view presented to clients, recomputed wholesale from the ledger.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ValidationError;
use crate::ledger::{LedgerSnapshot, Position};
use crate::limits::{self, BetLimits};
use crate::payout::{self, Odds};
use crate::session::{OptionSide, Session};

/// One option as clients see it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionView {
    /// Option index.
    #[serde(rename = "option_index")]
    pub side: OptionSide,
    /// Display name.
    pub name: String,
    /// Sum of wagers on this option.
    pub total_amount: Decimal,
    /// Current odds, `"---"` until both sides have stake.
    pub odds: Odds,
    /// Aggregated player positions.
    pub positions: Vec<Position>,
}

/// Everything the presentation layer needs for one session.
///
/// Built from a single ledger snapshot; never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedView {
    /// Session record.
    pub session: Session,
    /// Option 0 and option 1.
    pub options: [OptionView; 2],
    /// Sum of both options' totals.
    pub total_pool: Decimal,
    /// Baseline for the bet limits.
    pub first_wager_amount: Option<Decimal>,
    /// Current admissible range.
    pub limits: BetLimits,
    /// Number of wagers recorded.
    pub wager_count: usize,
    /// Highest wager sequence reflected in this view.
    pub revision: Option<u64>,
    #[serde(skip)]
    ledger: LedgerSnapshot,
}

impl DerivedView {
    /// Compute the view for a session from a snapshot of its ledger.
    pub fn build(session: Session, ledger: LedgerSnapshot) -> Self {
        let odds = payout::odds_pair(&ledger);
        let options = OptionSide::BOTH.map(|side| OptionView {
            side,
            name: session.option_name(side).to_string(),
            total_amount: ledger.total(side),
            odds: odds[side.index()],
            positions: ledger.options[side.index()].positions.clone(),
        });
        let limits = limits::limits(&session, &ledger);

        Self {
            options,
            total_pool: ledger.total_pool,
            first_wager_amount: ledger.first_wager_amount,
            limits,
            wager_count: ledger.wager_count,
            revision: ledger.last_sequence,
            session,
            ledger,
        }
    }

    /// Whether this view reflects everything `other` does.
    ///
    /// Session versions and wager sequences only grow, so a view is at least
    /// as new as another when neither counter is behind.
    pub fn supersedes(&self, other: &DerivedView) -> bool {
        self.session.version >= other.session.version && self.revision >= other.revision
    }

    /// Snapshot this view was built from.
    pub fn ledger(&self) -> &LedgerSnapshot {
        &self.ledger
    }

    /// Odds of one option.
    pub fn odds(&self, side: OptionSide) -> Odds {
        self.options[side.index()].odds
    }

    /// Live estimate for a hypothetical new wager.
    pub fn potential_win(&self, side: OptionSide, candidate: Decimal) -> Decimal {
        payout::potential_win(&self.ledger, side, candidate)
    }

    /// A player's payout if the pool closed now, summed over both options.
    pub fn current_winnings(&self, player_name: &str) -> Decimal {
        payout::current_winnings(&self.ledger, player_name)
    }

    /// Advisory check of an amount against the current limits.
    pub fn validate(&self, amount: Decimal) -> Result<(), ValidationError> {
        limits::validate(amount, &self.limits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Wager, WagerId};
    use crate::session::{BetPercentages, SessionDraft};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn session() -> Session {
        SessionDraft::new("Who wins?", "A", "B", "alice")
            .into_session("view".to_string(), BetPercentages::default())
    }

    fn wager(session: &Session, seq: u64, player: &str, side: OptionSide, amount: Decimal) -> Wager {
        Wager {
            id: WagerId::new(),
            session_id: session.id,
            sequence: seq,
            player_name: player.to_string(),
            side,
            amount,
            placed_at: 0,
        }
    }

    #[test]
    fn fresh_session_view() {
        let session = session();
        let view = DerivedView::build(session.clone(), LedgerSnapshot::empty(session.id));

        assert_eq!(view.total_pool, Decimal::ZERO);
        assert_eq!(view.limits, BetLimits::UNBOUNDED);
        assert_eq!(view.odds(OptionSide::First), Odds::Undefined);
        assert_eq!(view.revision, None);
        assert_eq!(view.options[1].name, "B");
    }

    #[test]
    fn view_carries_totals_odds_and_limits() {
        let session = session();
        let wagers = vec![
            wager(&session, 1, "alice", OptionSide::First, dec!(100)),
            wager(&session, 2, "bob", OptionSide::Second, dec!(60)),
        ];
        let view = DerivedView::build(
            session.clone(),
            LedgerSnapshot::from_wagers(session.id, &wagers),
        );

        assert_eq!(view.options[0].total_amount, dec!(100));
        assert_eq!(view.options[1].total_amount, dec!(60));
        assert_eq!(view.total_pool, dec!(160));
        assert_eq!(view.odds(OptionSide::Second).to_string(), "1.67x");
        assert_eq!(view.limits.min, dec!(50));
        assert_eq!(view.limits.max, Some(dec!(200)));
        assert_eq!(view.potential_win(OptionSide::First, dec!(10)), dec!(5.45));
        assert_eq!(view.current_winnings("bob"), dec!(100));
        assert_eq!(view.revision, Some(2));
    }

    #[test]
    fn newer_session_version_or_sequence_supersedes() {
        let session = session();
        let wagers = vec![wager(&session, 1, "alice", OptionSide::First, dec!(100))];
        let base = DerivedView::build(session.clone(), LedgerSnapshot::empty(session.id));

        let mut updated_session = session.clone();
        updated_session.percentages = BetPercentages { min: 10, max: 300 };
        updated_session.version = 1;
        let updated = DerivedView::build(updated_session.clone(), LedgerSnapshot::empty(session.id));
        let with_wager = DerivedView::build(
            updated_session,
            LedgerSnapshot::from_wagers(session.id, &wagers),
        );

        assert!(updated.supersedes(&base));
        assert!(!base.supersedes(&updated));
        assert!(with_wager.supersedes(&updated));
        assert!(!updated.supersedes(&with_wager));
        assert!(base.supersedes(&base));
    }

    #[test]
    fn serialized_view_hides_raw_ledger() {
        let session = session();
        let view = DerivedView::build(session.clone(), LedgerSnapshot::empty(session.id));
        let json = serde_json::to_value(&view).unwrap();

        assert!(json.get("ledger").is_none());
        assert_eq!(json["options"][0]["odds"], "---");
        assert_eq!(json["options"][1]["option_index"], 1);
        assert!(json["limits"]["max"].is_null());
    }
}

//! Pool ledger: append-only wager recording and consistent snapshots.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, instrument};

use super::types::{LedgerSnapshot, NewWager, Wager};
use crate::error::Result;
use crate::limits::check_amount;
use crate::session::{OptionSide, SessionId};
use crate::store::WagerStore;

/// Authoritative wager set of every session, backed by a [`WagerStore`].
pub struct PoolLedger<S> {
    store: Arc<S>,
}

impl<S> Clone for PoolLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: WagerStore> PoolLedger<S> {
    /// Create a ledger over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Durably record a wager.
    ///
    /// Fails with a validation error for an amount outside the global bounds
    /// and with not-found when the session is unknown or still a draft.
    /// Never retried.
    #[instrument(skip(self))]
    pub async fn append(
        &self,
        session_id: SessionId,
        player_name: &str,
        side: OptionSide,
        amount: Decimal,
    ) -> Result<Wager> {
        check_amount(amount)?;

        let wager = self
            .store
            .insert_wager(NewWager {
                session_id,
                player_name: player_name.to_string(),
                side,
                amount,
            })
            .await?;

        debug!(wager_id = %wager.id, sequence = wager.sequence, "Wager appended");
        Ok(wager)
    }

    /// Fresh, internally consistent snapshot of a session's wagers.
    pub async fn snapshot(&self, session_id: SessionId) -> Result<LedgerSnapshot> {
        let wagers = self.store.list_wagers(&session_id).await?;
        Ok(LedgerSnapshot::from_wagers(session_id, &wagers))
    }
}

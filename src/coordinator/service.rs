//! Session coordinator: creation, wager placement, and view publication.

use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::view::DerivedView;
use crate::error::{Result, StoreError, ValidationError, WagerError};
use crate::ledger::{PoolLedger, Wager};
use crate::limits::{self, BetLimits};
use crate::metrics;
use crate::session::{BetPercentages, OptionSide, Session, SessionDraft, SessionId};
use crate::store::WagerStore;
use crate::utils::{generate_slug, is_valid_slug};

/// Fresh slugs tried before giving up on a colliding insert.
const SLUG_ATTEMPTS: usize = 3;

/// Orchestrates the lifecycle of sessions and their wagers.
///
/// Every read goes to the store; derived views are rebuilt from a fresh
/// snapshot and installed wholesale into per-session watch channels.
pub struct SessionCoordinator<S> {
    store: Arc<S>,
    ledger: PoolLedger<S>,
    defaults: BetPercentages,
    observers: DashMap<SessionId, watch::Sender<Arc<DerivedView>>>,
}

impl<S: WagerStore> SessionCoordinator<S> {
    /// Create a coordinator over a store.
    pub fn new(store: Arc<S>, defaults: BetPercentages) -> Self {
        Self {
            ledger: PoolLedger::new(Arc::clone(&store)),
            store,
            defaults,
            observers: DashMap::new(),
        }
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Promote a draft to a live session. Happens exactly once per draft.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create_session(&self, draft: SessionDraft) -> Result<Session> {
        draft.validate()?;

        let mut last_err = None;
        for _ in 0..SLUG_ATTEMPTS {
            let session = draft.clone().into_session(generate_slug(), self.defaults);
            match self.store.insert_session(&session).await {
                Ok(()) => {
                    metrics::inc_sessions_created();
                    info!(
                        session_id = %session.id,
                        slug = %session.slug,
                        min_pct = session.percentages.min,
                        max_pct = session.percentages.max,
                        "Session created"
                    );
                    return Ok(session);
                }
                Err(StoreError::ConstraintViolation(reason)) => {
                    debug!(reason = %reason, "Slug collision, regenerating");
                    last_err = Some(StoreError::ConstraintViolation(reason));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_err
            .map(WagerError::from)
            .unwrap_or_else(|| ValidationError::Rejected("could not allocate slug".into()).into()))
    }

    /// Get a live session by id.
    pub async fn session(&self, id: SessionId) -> Result<Session> {
        Ok(self.store.get_session(&id).await?)
    }

    /// Get a live session by its share slug.
    pub async fn session_by_slug(&self, slug: &str) -> Result<Session> {
        if !is_valid_slug(slug) {
            return Err(WagerError::not_found(slug));
        }
        Ok(self.store.get_session_by_slug(slug).await?)
    }

    /// Freshly computed view of a session.
    pub async fn derived_view(&self, id: SessionId) -> Result<DerivedView> {
        let session = self.session(id).await?;
        let snapshot = self.ledger.snapshot(id).await?;
        Ok(DerivedView::build(session, snapshot))
    }

    /// Freshly computed view of a session looked up by slug.
    pub async fn derived_view_by_slug(&self, slug: &str) -> Result<DerivedView> {
        let session = self.session_by_slug(slug).await?;
        let snapshot = self.ledger.snapshot(session.id).await?;
        Ok(DerivedView::build(session, snapshot))
    }

    /// Advisory validation of an amount against the current limits.
    pub async fn validate(&self, id: SessionId, amount: Decimal) -> Result<BetLimits> {
        let view = self.derived_view(id).await?;
        view.validate(amount)?;
        Ok(view.limits)
    }

    /// Validate against current limits, append, then republish.
    ///
    /// Fails fast; a transient append failure is surfaced, not retried, since
    /// its outcome is unknown.
    #[instrument(skip(self), fields(session_id = %id))]
    pub async fn place_wager(
        &self,
        id: SessionId,
        player_name: &str,
        side: OptionSide,
        amount: Decimal,
    ) -> Result<Wager> {
        let _timer = metrics::timer_place_wager();

        let result = self.try_place_wager(id, player_name, side, amount).await;
        match &result {
            Ok(wager) => {
                metrics::inc_wagers_placed();
                info!(
                    wager_id = %wager.id,
                    sequence = wager.sequence,
                    player = %wager.player_name,
                    side = %side,
                    amount = %amount,
                    "Wager placed"
                );
                if let Err(e) = self.refresh(id).await {
                    // The feed will reconcile observers later
                    warn!(error = %e, "Post-append refresh failed");
                }
            }
            Err(e) => {
                metrics::inc_wagers_rejected(e.kind());
                match e {
                    WagerError::TransientStore(_) => warn!(error = %e, "Wager outcome unknown"),
                    _ => debug!(error = %e, "Wager rejected"),
                }
            }
        }
        result
    }

    async fn try_place_wager(
        &self,
        id: SessionId,
        player_name: &str,
        side: OptionSide,
        amount: Decimal,
    ) -> Result<Wager> {
        let player_name = player_name.trim();
        if player_name.is_empty() {
            return Err(ValidationError::MissingPlayerName.into());
        }

        let session = self.session(id).await?;
        if !session.created {
            return Err(WagerError::not_found(id.to_string()));
        }
        let snapshot = self.ledger.snapshot(id).await?;
        limits::validate(amount, &limits::limits(&session, &snapshot))?;

        self.ledger.append(id, player_name, side, amount).await
    }

    /// Change the limit percentages. Owner only, and only before any wager.
    #[instrument(skip(self), fields(session_id = %id))]
    pub async fn update_percentages(
        &self,
        id: SessionId,
        requester: &str,
        min: Option<u32>,
        max: Option<u32>,
    ) -> Result<Session> {
        let current = self.session(id).await?;
        if !current.is_owner(requester) {
            return Err(ValidationError::NotOwner.into());
        }

        // The store refuses the write once a wager exists
        let percentages = BetPercentages::clamped(min, max, current.percentages);
        let session = self.store.update_percentages(&id, percentages).await?;
        info!(
            min_pct = session.percentages.min,
            max_pct = session.percentages.max,
            version = session.version,
            "Bet limits updated"
        );

        if let Err(e) = self.refresh(id).await {
            warn!(error = %e, "Post-update refresh failed");
        }
        Ok(session)
    }

    /// Subscribe to the live view of a session.
    pub async fn watch(&self, id: SessionId) -> Result<watch::Receiver<Arc<DerivedView>>> {
        if let Some(tx) = self.observers.get(&id) {
            return Ok(tx.subscribe());
        }

        let view = Arc::new(self.derived_view(id).await?);
        let rx = self
            .observers
            .entry(id)
            .or_insert_with(|| watch::channel(view).0)
            .subscribe();
        Ok(rx)
    }

    /// Sessions with at least one registered observer channel.
    pub fn observed_sessions(&self) -> Vec<SessionId> {
        self.observers.iter().map(|entry| *entry.key()).collect()
    }

    /// Refetch the ledger and republish the view to local observers.
    ///
    /// Returns `None` when nobody observes the session. A view older than the
    /// one already installed, by session version or by wager sequence, is
    /// dropped, so out-of-order refreshes are harmless.
    pub async fn refresh(&self, id: SessionId) -> Result<Option<Arc<DerivedView>>> {
        self.observers
            .remove_if(&id, |_, tx| tx.receiver_count() == 0);
        if !self.observers.contains_key(&id) {
            debug!(session_id = %id, "No observers, skipping refresh");
            return Ok(None);
        }

        let _timer = metrics::timer_refresh();
        let view = Arc::new(self.derived_view(id).await?);
        metrics::inc_refreshes();

        let installed = self.publish(id, Arc::clone(&view));
        debug!(
            session_id = %id,
            version = view.session.version,
            revision = ?view.revision,
            installed,
            "View refreshed"
        );
        Ok(Some(view))
    }

    /// Install `view` unless the observers already hold a newer one.
    fn publish(&self, id: SessionId, view: Arc<DerivedView>) -> bool {
        match self.observers.get(&id) {
            Some(tx) => tx.send_if_modified(|current| {
                if view.supersedes(current) {
                    *current = Arc::clone(&view);
                    true
                } else {
                    false
                }
            }),
            None => false,
        }
    }
}

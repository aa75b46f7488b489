//! Change-feed consumer that keeps observer views in sync with the store.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::retry::RetryPolicy;
use crate::coordinator::{DerivedView, SessionCoordinator};
use crate::error::Result;
use crate::metrics;
use crate::session::SessionId;
use crate::store::{ChangeEvent, WagerStore};

/// Subscribes to store change notifications and republishes affected views.
///
/// Notifications are hints only: the payload is never applied, the ledger is
/// refetched. Lost or duplicated notifications are harmless because every
/// refresh recomputes the full view.
pub struct ReconciliationFeed<S> {
    coordinator: Arc<SessionCoordinator<S>>,
    events: broadcast::Receiver<ChangeEvent>,
    retry: RetryPolicy,
}

impl<S: WagerStore + 'static> ReconciliationFeed<S> {
    /// Create a feed over an existing subscription.
    pub fn new(
        coordinator: Arc<SessionCoordinator<S>>,
        events: broadcast::Receiver<ChangeEvent>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            coordinator,
            events,
            retry,
        }
    }

    /// Run on a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Consume notifications until the channel closes.
    pub async fn run(mut self) {
        info!("Reconciliation feed started");

        loop {
            match self.events.recv().await {
                Ok(event) => {
                    metrics::inc_feed_events();
                    debug!(session_id = %event.session_id, kind = %event.kind, "Change notification");
                    self.reconcile(event.session_id).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Missed notifications could belong to any session
                    metrics::inc_feed_lagged();
                    warn!(skipped, "Feed lagged, refreshing all observed sessions");
                    for id in self.coordinator.observed_sessions() {
                        self.reconcile(id).await;
                    }
                }
                Err(RecvError::Closed) => {
                    info!("Change feed closed, stopping reconciliation");
                    break;
                }
            }
        }
    }

    async fn reconcile(&self, id: SessionId) {
        if let Err(e) = self.refresh_with_retry(id).await {
            warn!(session_id = %id, error = %e, "Refresh failed, view left stale");
        }
    }

    /// Refresh one session, retrying transient store failures with backoff.
    pub async fn refresh_with_retry(&self, id: SessionId) -> Result<Option<Arc<DerivedView>>> {
        let mut attempt = 0;
        loop {
            match self.coordinator.refresh(id).await {
                Ok(view) => return Ok(view),
                Err(e) if e.is_retryable() && self.retry.should_retry(attempt) => {
                    let delay = self.retry.next_delay(attempt);
                    debug!(
                        session_id = %id,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Refresh failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

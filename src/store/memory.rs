//! In-memory store with change notifications and injectable failures.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use time::OffsetDateTime;
use tokio::sync::broadcast;
use tracing::debug;

use super::{ChangeEvent, ChangeFeed, ChangeKind, WagerStore};
use crate::error::StoreError;
use crate::ledger::{NewWager, Wager, WagerId};
use crate::session::{BetPercentages, Session, SessionId};

/// Configuration for store behavior.
#[derive(Debug, Clone)]
pub struct MemoryStoreConfig {
    /// Buffered change notifications per subscriber.
    pub feed_capacity: usize,
    /// Simulated latency in milliseconds.
    pub latency_ms: u64,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            feed_capacity: 1024,
            latency_ms: 0,
        }
    }
}

/// Sessions and wagers held in process memory.
///
/// A wager append takes the per-session entry lock, so a concurrent
/// `list_wagers` sees either the whole wager or none of it. Percentage
/// updates take the same lock before checking the ledger is empty.
pub struct MemoryStore {
    config: MemoryStoreConfig,
    sessions: DashMap<SessionId, Session>,
    slugs: DashMap<String, SessionId>,
    wagers: DashMap<SessionId, Vec<Wager>>,
    next_sequence: AtomicU64,
    tx: broadcast::Sender<ChangeEvent>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Create a store with default configuration.
    pub fn new() -> Self {
        Self::with_config(MemoryStoreConfig::default())
    }

    /// Create a store with custom configuration.
    pub fn with_config(config: MemoryStoreConfig) -> Self {
        let (tx, _) = broadcast::channel(config.feed_capacity.max(1));
        Self {
            config,
            sessions: DashMap::new(),
            slugs: DashMap::new(),
            wagers: DashMap::new(),
            next_sequence: AtomicU64::new(1),
            tx,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every read fail with a transient error.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write fail with a transient error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of stored sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }
    }

    fn check_read(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Transient("simulated read failure".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Transient("simulated write failure".to_string()));
        }
        Ok(())
    }

    fn notify(&self, session_id: SessionId, kind: ChangeKind) {
        // No subscribers is fine
        let _ = self.tx.send(ChangeEvent { session_id, kind });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WagerStore for MemoryStore {
    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        self.simulate_latency().await;
        self.check_write()?;

        if self.sessions.contains_key(&session.id) {
            return Err(StoreError::ConstraintViolation(format!(
                "session {} already exists",
                session.id
            )));
        }

        match self.slugs.entry(session.slug.clone()) {
            Entry::Occupied(_) => {
                return Err(StoreError::ConstraintViolation(format!(
                    "slug {} already exists",
                    session.slug
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(session.id);
            }
        }

        self.wagers.insert(session.id, Vec::new());
        self.sessions.insert(session.id, session.clone());
        debug!(session_id = %session.id, slug = %session.slug, "Session stored");

        self.notify(session.id, ChangeKind::SessionInserted);
        Ok(())
    }

    async fn update_percentages(
        &self,
        id: &SessionId,
        percentages: BetPercentages,
    ) -> Result<Session, StoreError> {
        self.simulate_latency().await;
        self.check_write()?;

        let updated = {
            // Same per-session lock insert_wager appends under
            let wagers = self
                .wagers
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            if !wagers.is_empty() {
                return Err(StoreError::LedgerNotEmpty(id.to_string()));
            }

            let mut stored = self
                .sessions
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            stored.percentages = percentages;
            stored.version += 1;
            stored.clone()
        };
        debug!(session_id = %id, version = updated.version, "Session percentages stored");

        self.notify(*id, ChangeKind::SessionUpdated);
        Ok(updated)
    }

    async fn get_session(&self, id: &SessionId) -> Result<Session, StoreError> {
        self.simulate_latency().await;
        self.check_read()?;

        self.sessions
            .get(id)
            .map(|s| s.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn get_session_by_slug(&self, slug: &str) -> Result<Session, StoreError> {
        self.simulate_latency().await;
        self.check_read()?;

        let id = self
            .slugs
            .get(slug)
            .map(|id| *id)
            .ok_or_else(|| StoreError::NotFound(slug.to_string()))?;

        self.sessions
            .get(&id)
            .map(|s| s.clone())
            .ok_or_else(|| StoreError::NotFound(slug.to_string()))
    }

    async fn insert_wager(&self, wager: NewWager) -> Result<Wager, StoreError> {
        self.simulate_latency().await;
        self.check_write()?;

        let live = self
            .sessions
            .get(&wager.session_id)
            .map(|s| s.created)
            .unwrap_or(false);
        if !live {
            return Err(StoreError::NotFound(wager.session_id.to_string()));
        }

        let recorded = {
            let mut entry = self.wagers.entry(wager.session_id).or_default();
            // Assigned under the entry lock so per-session order matches sequence order
            let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
            let recorded = Wager {
                id: WagerId::new(),
                session_id: wager.session_id,
                sequence,
                player_name: wager.player_name,
                side: wager.side,
                amount: wager.amount,
                placed_at: OffsetDateTime::now_utc().unix_timestamp(),
            };
            entry.push(recorded.clone());
            recorded
        };

        self.notify(recorded.session_id, ChangeKind::WagerInserted);
        Ok(recorded)
    }

    async fn list_wagers(&self, session_id: &SessionId) -> Result<Vec<Wager>, StoreError> {
        self.simulate_latency().await;
        self.check_read()?;

        self.wagers
            .get(session_id)
            .map(|w| w.clone())
            .ok_or_else(|| StoreError::NotFound(session_id.to_string()))
    }
}

impl ChangeFeed for MemoryStore {
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

//! Persistence collaborator port and change notifications.
//!
//! This module handles:
//! - The storage operations the core requires
//! - The "something changed for session X" notification stream
//! - An in-memory adapter used by the service binary and tests

mod memory;

pub use memory::{MemoryStore, MemoryStoreConfig};

use std::future::Future;

use serde::Serialize;
use strum::Display;
use tokio::sync::broadcast;

use crate::error::StoreError;
use crate::ledger::{NewWager, Wager};
use crate::session::{BetPercentages, Session, SessionId};

/// Storage operations for sessions and their append-only wager tables.
///
/// Each call either succeeds atomically or fails with a classified
/// [`StoreError`].
pub trait WagerStore: Send + Sync {
    /// Persist a new session. Fails with a constraint violation on a duplicate slug.
    fn insert_session(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Replace a session's limit percentages while its ledger is still empty.
    ///
    /// The emptiness check and the write are atomic with respect to
    /// [`insert_wager`](Self::insert_wager). Fails with
    /// [`StoreError::LedgerNotEmpty`] once any wager exists. No other field of
    /// the session can change after insertion.
    fn update_percentages(
        &self,
        id: &SessionId,
        percentages: BetPercentages,
    ) -> impl Future<Output = Result<Session, StoreError>> + Send;

    /// Get a session by id.
    fn get_session(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<Session, StoreError>> + Send;

    /// Get a session by its shareable slug.
    fn get_session_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<Session, StoreError>> + Send;

    /// Append a wager, assigning its id and monotonic sequence number.
    fn insert_wager(
        &self,
        wager: NewWager,
    ) -> impl Future<Output = Result<Wager, StoreError>> + Send;

    /// All wagers of a session in sequence order.
    fn list_wagers(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<Vec<Wager>, StoreError>> + Send;
}

/// What kind of row changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ChangeKind {
    /// A session row was inserted.
    SessionInserted,
    /// A session row was updated.
    SessionUpdated,
    /// A wager row was inserted.
    WagerInserted,
}

/// Notification that something changed for one session.
///
/// Delivery is at-least-once and best-effort ordered; consumers must treat the
/// payload only as a hint to refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    /// Session the change belongs to.
    pub session_id: SessionId,
    /// Kind of change.
    pub kind: ChangeKind,
}

/// Subscription primitive of the change-notification collaborator.
pub trait ChangeFeed: Send + Sync {
    /// Subscribe to change notifications for all sessions.
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}

//! The [`DocumentStore`] trait consumed by the editor state log.

use async_trait::async_trait;
use codepad_types::{Meeting, MeetingId, StateSnapshot, UserId};

use crate::error::DbError;

/// Transactional storage for meetings and editor state snapshots.
///
/// ## Transaction Semantics
///
/// Mutating operations take `&mut Self::Transaction`, a type representing
/// an in-progress unit of work. The lifecycle is:
///
/// 1. `begin()` -- start a transaction
/// 2. Call the in-transaction methods with `&mut tx`
/// 3. `commit(tx)` -- make every staged write visible at once,
///    OR `rollback(tx)` -- discard them
///
/// A transaction that is dropped without being committed MUST be rolled
/// back, so an early return with `?` never leaves a partial write behind.
///
/// ## Writer Serialization
///
/// [`lock_meeting`](DocumentStore::lock_meeting) takes a write lock on the
/// meeting for the rest of the transaction. Two transactions that both lock
/// the same meeting run one after the other, which is what makes the
/// read-latest/compare/insert sequence of an append atomic.
///
/// ## Reads Outside a Transaction
///
/// `find_*` methods read committed data without locking. They must not be
/// called while the same task holds an open transaction on a backend that
/// locks the whole store (see [`MemoryStore`](crate::MemoryStore)).
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// The transaction type used by this backend.
    type Transaction: Send;

    // ── Transaction lifecycle ────────────────────────────────────────────

    /// Begin a new transaction.
    async fn begin(&self) -> Result<Self::Transaction, DbError>;

    /// Commit a transaction, making all staged writes durable.
    async fn commit(&self, tx: Self::Transaction) -> Result<(), DbError>;

    /// Roll back a transaction, discarding all staged writes.
    async fn rollback(&self, tx: Self::Transaction) -> Result<(), DbError>;

    // ── In-transaction operations ────────────────────────────────────────

    /// Read a meeting and hold its write lock until the transaction ends.
    ///
    /// Returns `Ok(None)` if the meeting does not exist.
    async fn lock_meeting(
        &self,
        tx: &mut Self::Transaction,
        meeting_id: MeetingId,
    ) -> Result<Option<Meeting>, DbError>;

    /// Set the meeting's candidate to `candidate`, but only if it is unset.
    ///
    /// Returns `true` if this call bound the candidate and `false` if the
    /// slot was already taken (by anyone, including `candidate` itself).
    ///
    /// Returns `Err(DbError::MeetingNotFound)` if the meeting does not exist.
    async fn claim_candidate_slot(
        &self,
        tx: &mut Self::Transaction,
        meeting_id: MeetingId,
        candidate: &UserId,
    ) -> Result<bool, DbError>;

    /// Read the snapshot with the highest `seq` for a meeting, including
    /// writes staged earlier in this transaction.
    async fn latest_snapshot(
        &self,
        tx: &mut Self::Transaction,
        meeting_id: MeetingId,
    ) -> Result<Option<StateSnapshot>, DbError>;

    /// Insert a new snapshot.
    ///
    /// Returns `Err(DbError::DuplicateSequence)` if `(meeting_id, seq)` is
    /// already taken and `Err(DbError::MeetingNotFound)` if the meeting
    /// does not exist.
    async fn insert_snapshot(
        &self,
        tx: &mut Self::Transaction,
        snapshot: &StateSnapshot,
    ) -> Result<(), DbError>;

    // ── Committed reads and administration ───────────────────────────────

    /// Read a meeting without locking.
    async fn find_meeting(&self, meeting_id: MeetingId) -> Result<Option<Meeting>, DbError>;

    /// Read the latest committed snapshot for a meeting without locking.
    async fn find_latest_snapshot(
        &self,
        meeting_id: MeetingId,
    ) -> Result<Option<StateSnapshot>, DbError>;

    /// Register a meeting record.
    ///
    /// Meetings are normally created by the scheduling system; this exists
    /// for seeding and tests.
    ///
    /// Returns `Err(DbError::MeetingExists)` if the ID is taken.
    async fn insert_meeting(&self, meeting: &Meeting) -> Result<(), DbError>;
}

//! In-process [`DocumentStore`] backend.
//!
//! Everything lives behind one [`tokio::sync::Mutex`]. A transaction owns
//! the lock from `begin` until `commit`/`rollback`/drop, so transactions
//! are fully serialized. Writes are staged inside the transaction and only
//! applied on commit.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use codepad_types::{Meeting, MeetingId, StateSnapshot, UserId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::DbError;
use crate::store::DocumentStore;

#[derive(Debug, Default)]
struct MemoryState {
    meetings: BTreeMap<MeetingId, Meeting>,
    /// Per-meeting log, ascending by `seq`.
    snapshots: BTreeMap<MeetingId, Vec<StateSnapshot>>,
}

impl MemoryState {
    fn latest(&self, meeting_id: MeetingId) -> Option<&StateSnapshot> {
        self.snapshots.get(&meeting_id).and_then(|log| log.last())
    }

    fn has_seq(&self, meeting_id: MeetingId, seq: u64) -> bool {
        self.snapshots
            .get(&meeting_id)
            .is_some_and(|log| log.binary_search_by_key(&seq, |s| s.seq).is_ok())
    }

    fn append(&mut self, snapshot: StateSnapshot) {
        let log = self.snapshots.entry(snapshot.meeting_id).or_default();
        let at = log.partition_point(|s| s.seq < snapshot.seq);
        log.insert(at, snapshot);
    }
}

/// Memory-backed document store for development and tests.
///
/// Cloning is cheap and every clone shares the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with meetings.
    ///
    /// Later entries replace earlier ones with the same ID.
    pub fn seeded(meetings: impl IntoIterator<Item = Meeting>) -> Self {
        let mut state = MemoryState::default();
        for meeting in meetings {
            state.meetings.insert(meeting.id, meeting);
        }
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Return the full committed log for a meeting, ascending by `seq`.
    pub async fn snapshots(&self, meeting_id: MeetingId) -> Vec<StateSnapshot> {
        let state = self.state.lock().await;
        state.snapshots.get(&meeting_id).cloned().unwrap_or_default()
    }
}

/// An open transaction on a [`MemoryStore`].
///
/// Holds the store lock; dropping it without committing discards every
/// staged write.
pub struct MemoryTransaction {
    state: OwnedMutexGuard<MemoryState>,
    claims: BTreeMap<MeetingId, UserId>,
    inserts: Vec<StateSnapshot>,
}

impl MemoryTransaction {
    fn meeting(&self, meeting_id: MeetingId) -> Option<Meeting> {
        let mut meeting = self.state.meetings.get(&meeting_id).cloned()?;
        if let Some(candidate) = self.claims.get(&meeting_id) {
            meeting.candidate_id = Some(candidate.clone());
        }
        Some(meeting)
    }

    fn staged_latest(&self, meeting_id: MeetingId) -> Option<&StateSnapshot> {
        self.inserts
            .iter()
            .filter(|s| s.meeting_id == meeting_id)
            .max_by_key(|s| s.seq)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    type Transaction = MemoryTransaction;

    async fn begin(&self) -> Result<Self::Transaction, DbError> {
        let state = Arc::clone(&self.state).lock_owned().await;
        Ok(MemoryTransaction {
            state,
            claims: BTreeMap::new(),
            inserts: Vec::new(),
        })
    }

    async fn commit(&self, tx: Self::Transaction) -> Result<(), DbError> {
        let MemoryTransaction {
            mut state,
            claims,
            inserts,
        } = tx;

        let claim_count = claims.len();
        let insert_count = inserts.len();

        for (meeting_id, candidate) in claims {
            if let Some(meeting) = state.meetings.get_mut(&meeting_id) {
                meeting.candidate_id = Some(candidate);
            }
        }
        for snapshot in inserts {
            state.append(snapshot);
        }

        tracing::trace!(
            claims = claim_count,
            inserts = insert_count,
            "Committed memory transaction"
        );
        Ok(())
    }

    async fn rollback(&self, tx: Self::Transaction) -> Result<(), DbError> {
        drop(tx);
        Ok(())
    }

    async fn lock_meeting(
        &self,
        tx: &mut Self::Transaction,
        meeting_id: MeetingId,
    ) -> Result<Option<Meeting>, DbError> {
        Ok(tx.meeting(meeting_id))
    }

    async fn claim_candidate_slot(
        &self,
        tx: &mut Self::Transaction,
        meeting_id: MeetingId,
        candidate: &UserId,
    ) -> Result<bool, DbError> {
        let meeting = tx
            .meeting(meeting_id)
            .ok_or(DbError::MeetingNotFound(meeting_id))?;
        if meeting.candidate_id.is_some() {
            return Ok(false);
        }
        tx.claims.insert(meeting_id, candidate.clone());
        Ok(true)
    }

    async fn latest_snapshot(
        &self,
        tx: &mut Self::Transaction,
        meeting_id: MeetingId,
    ) -> Result<Option<StateSnapshot>, DbError> {
        let committed = tx.state.latest(meeting_id);
        let staged = tx.staged_latest(meeting_id);
        let latest = match (committed, staged) {
            (Some(c), Some(s)) => Some(if s.seq > c.seq { s } else { c }),
            (c, s) => c.or(s),
        };
        Ok(latest.cloned())
    }

    async fn insert_snapshot(
        &self,
        tx: &mut Self::Transaction,
        snapshot: &StateSnapshot,
    ) -> Result<(), DbError> {
        let meeting_id = snapshot.meeting_id;
        if !tx.state.meetings.contains_key(&meeting_id) {
            return Err(DbError::MeetingNotFound(meeting_id));
        }
        let staged_dup = tx
            .inserts
            .iter()
            .any(|s| s.meeting_id == meeting_id && s.seq == snapshot.seq);
        if staged_dup || tx.state.has_seq(meeting_id, snapshot.seq) {
            return Err(DbError::DuplicateSequence {
                meeting_id,
                seq: snapshot.seq,
            });
        }
        tx.inserts.push(snapshot.clone());
        Ok(())
    }

    async fn find_meeting(&self, meeting_id: MeetingId) -> Result<Option<Meeting>, DbError> {
        let state = self.state.lock().await;
        Ok(state.meetings.get(&meeting_id).cloned())
    }

    async fn find_latest_snapshot(
        &self,
        meeting_id: MeetingId,
    ) -> Result<Option<StateSnapshot>, DbError> {
        let state = self.state.lock().await;
        Ok(state.latest(meeting_id).cloned())
    }

    async fn insert_meeting(&self, meeting: &Meeting) -> Result<(), DbError> {
        let mut state = self.state.lock().await;
        if state.meetings.contains_key(&meeting.id) {
            return Err(DbError::MeetingExists(meeting.id));
        }
        state.meetings.insert(meeting.id, meeting.clone());
        tracing::debug!(meeting_id = %meeting.id, "Registered meeting");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use codepad_types::SnapshotId;

    use super::*;

    fn snapshot(meeting_id: MeetingId, seq: u64, content: &str) -> StateSnapshot {
        StateSnapshot {
            id: SnapshotId::new(),
            meeting_id,
            seq,
            content: content.to_owned(),
            author_id: UserId::from("alice"),
            created_at: Utc::now(),
        }
    }

    fn store_with_meeting() -> (MemoryStore, MeetingId) {
        let meeting = Meeting::new(MeetingId::new(), vec![UserId::from("alice")]);
        let id = meeting.id;
        (MemoryStore::seeded([meeting]), id)
    }

    #[tokio::test]
    async fn committed_insert_is_visible() {
        let (store, id) = store_with_meeting();

        let mut tx = store.begin().await.unwrap();
        store.insert_snapshot(&mut tx, &snapshot(id, 1, "a")).await.unwrap();
        store.commit(tx).await.unwrap();

        let latest = store.find_latest_snapshot(id).await.unwrap();
        assert_eq!(latest.map(|s| s.seq), Some(1));
    }

    #[tokio::test]
    async fn rolled_back_insert_is_discarded() {
        let (store, id) = store_with_meeting();

        let mut tx = store.begin().await.unwrap();
        store.insert_snapshot(&mut tx, &snapshot(id, 1, "a")).await.unwrap();
        store.rollback(tx).await.unwrap();

        assert!(store.find_latest_snapshot(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dropped_transaction_is_discarded() {
        let (store, id) = store_with_meeting();

        {
            let mut tx = store.begin().await.unwrap();
            store
                .claim_candidate_slot(&mut tx, id, &UserId::from("carol"))
                .await
                .unwrap();
            store.insert_snapshot(&mut tx, &snapshot(id, 1, "a")).await.unwrap();
        }

        let meeting = store.find_meeting(id).await.unwrap().unwrap();
        assert!(meeting.candidate_slot_open());
        assert!(store.snapshots(id).await.is_empty());
    }

    #[tokio::test]
    async fn latest_snapshot_sees_staged_writes() {
        let (store, id) = store_with_meeting();

        let mut tx = store.begin().await.unwrap();
        store.insert_snapshot(&mut tx, &snapshot(id, 1, "a")).await.unwrap();
        store.commit(tx).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        store.insert_snapshot(&mut tx, &snapshot(id, 2, "b")).await.unwrap();
        let latest = store.latest_snapshot(&mut tx, id).await.unwrap();
        assert_eq!(latest.map(|s| s.content), Some(String::from("b")));
    }

    #[tokio::test]
    async fn duplicate_sequence_is_rejected() {
        let (store, id) = store_with_meeting();

        let mut tx = store.begin().await.unwrap();
        store.insert_snapshot(&mut tx, &snapshot(id, 1, "a")).await.unwrap();
        store.commit(tx).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let result = store.insert_snapshot(&mut tx, &snapshot(id, 1, "again")).await;
        assert!(matches!(
            result,
            Err(DbError::DuplicateSequence { seq: 1, .. })
        ));
    }

    #[tokio::test]
    async fn insert_for_unknown_meeting_fails() {
        let store = MemoryStore::new();
        let missing = MeetingId::new();

        let mut tx = store.begin().await.unwrap();
        let result = store.insert_snapshot(&mut tx, &snapshot(missing, 1, "a")).await;
        assert!(matches!(result, Err(DbError::MeetingNotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn claim_only_succeeds_once() {
        let (store, id) = store_with_meeting();
        let carol = UserId::from("carol");
        let dave = UserId::from("dave");

        let mut tx = store.begin().await.unwrap();
        assert!(store.claim_candidate_slot(&mut tx, id, &carol).await.unwrap());
        assert!(!store.claim_candidate_slot(&mut tx, id, &dave).await.unwrap());
        let locked = store.lock_meeting(&mut tx, id).await.unwrap().unwrap();
        assert_eq!(locked.candidate_id, Some(carol.clone()));
        store.commit(tx).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(!store.claim_candidate_slot(&mut tx, id, &dave).await.unwrap());
        store.rollback(tx).await.unwrap();

        let meeting = store.find_meeting(id).await.unwrap().unwrap();
        assert_eq!(meeting.candidate_id, Some(carol));
    }

    #[tokio::test]
    async fn insert_meeting_rejects_duplicates() {
        let store = MemoryStore::new();
        let meeting = Meeting::new(MeetingId::new(), Vec::new());

        store.insert_meeting(&meeting).await.unwrap();
        let again = store.insert_meeting(&meeting).await;
        assert!(matches!(again, Err(DbError::MeetingExists(_))));
    }

    #[tokio::test]
    async fn log_stays_ordered_by_seq() {
        let (store, id) = store_with_meeting();

        let mut tx = store.begin().await.unwrap();
        store.insert_snapshot(&mut tx, &snapshot(id, 2, "b")).await.unwrap();
        store.insert_snapshot(&mut tx, &snapshot(id, 1, "a")).await.unwrap();
        store.commit(tx).await.unwrap();

        let seqs: Vec<u64> = store.snapshots(id).await.iter().map(|s| s.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
    }
}

//! The versioned editor state log.
//!
//! Each meeting owns an append-only sequence of [`StateSnapshot`]s. Reads
//! return the highest `seq`. Writes carry the `seq` the writer last saw and
//! are rejected when someone else has appended since (compare-and-swap on
//! the sequence number).
//!
//! # Write path
//!
//! ```text
//! identity ──▶ find_meeting ──▶ access guard        (non-locking)
//!                                    │
//!          ┌─────────────────────────▼─────────────────────────┐
//!          │ lock_meeting ─▶ claim slot? ─▶ latest_snapshot    │
//!          │        ─▶ compare last_seq ─▶ insert ─▶ commit    │  one transaction
//!          └───────────────────────────────────────────────────┘
//! ```
//!
//! Any error inside the transaction rolls it back, so a rejected write never
//! leaves a claimed slot or a partial snapshot behind.

use std::sync::Arc;

use chrono::Utc;
use codepad_db::{DbError, DocumentStore};
use codepad_types::{CallerIdentity, Meeting, MeetingId, SnapshotId, StateSnapshot, UserId};

use crate::access;
use crate::error::SyncError;
use crate::observe::{Operation, StateLogObserver, TracingObserver};

/// A request to append a new snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendRequest {
    /// Target meeting.
    pub meeting_id: MeetingId,
    /// Full buffer contents.
    pub content: String,
    /// The `seq` the writer last observed. `None` skips the staleness check.
    pub last_seq: Option<u64>,
}

impl AppendRequest {
    /// Build a request.
    pub fn new(meeting_id: MeetingId, content: impl Into<String>, last_seq: Option<u64>) -> Self {
        Self {
            meeting_id,
            content: content.into(),
            last_seq,
        }
    }
}

/// Guarded, versioned access to meeting editor state over a [`DocumentStore`].
pub struct StateLog<S> {
    store: Arc<S>,
    observer: Arc<dyn StateLogObserver>,
}

impl<S> Clone for StateLog<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            observer: Arc::clone(&self.observer),
        }
    }
}

impl<S> std::fmt::Debug for StateLog<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateLog").finish_non_exhaustive()
    }
}

impl<S: DocumentStore> StateLog<S> {
    /// Create a state log that reports events through [`TracingObserver`].
    pub fn new(store: Arc<S>) -> Self {
        Self::with_observer(store, Arc::new(TracingObserver))
    }

    /// Create a state log with a custom observer.
    pub const fn with_observer(store: Arc<S>, observer: Arc<dyn StateLogObserver>) -> Self {
        Self { store, observer }
    }

    /// The backing store.
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Return the highest-`seq` snapshot for a meeting, or `None` if nothing
    /// has been saved yet.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Unauthenticated`] if `caller` is `None`
    /// - [`SyncError::AccessDenied`] if the meeting is missing or the guard
    ///   rejects the caller
    /// - [`SyncError::Store`] if the store fails
    pub async fn get_latest(
        &self,
        caller: Option<&CallerIdentity>,
        meeting_id: MeetingId,
    ) -> Result<Option<StateSnapshot>, SyncError> {
        let result = self.read_latest(caller, meeting_id).await;
        if let Err(e) = &result {
            self.observer.on_rejected(Operation::GetLatest, meeting_id, e);
        }
        result
    }

    /// Append a new snapshot, claiming the candidate slot when it is open
    /// and the writer is not an interviewer.
    ///
    /// The new snapshot's `seq` is one more than the current latest, or `1`
    /// for an empty log.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Unauthenticated`] if `caller` is `None`
    /// - [`SyncError::AccessDenied`] if the meeting is missing or the guard
    ///   rejects the caller
    /// - [`SyncError::StaleState`] if `last_seq` is set, a snapshot exists,
    ///   and its `seq` differs from `last_seq`
    /// - [`SyncError::SequenceExhausted`] if the log is at `u64::MAX`
    /// - [`SyncError::Store`] if the store fails
    pub async fn append(
        &self,
        caller: Option<&CallerIdentity>,
        request: AppendRequest,
    ) -> Result<StateSnapshot, SyncError> {
        let meeting_id = request.meeting_id;
        let result = self.write(caller, request).await;
        if let Err(e) = &result {
            self.observer.on_rejected(Operation::Append, meeting_id, e);
        }
        result
    }

    async fn read_latest(
        &self,
        caller: Option<&CallerIdentity>,
        meeting_id: MeetingId,
    ) -> Result<Option<StateSnapshot>, SyncError> {
        let caller = authenticate(caller)?;
        self.authorize(meeting_id, &caller.subject).await?;

        let latest = self.store.find_latest_snapshot(meeting_id).await?;
        self.observer
            .on_read(meeting_id, &caller.subject, latest.as_ref().map(|s| s.seq));
        Ok(latest)
    }

    async fn write(
        &self,
        caller: Option<&CallerIdentity>,
        request: AppendRequest,
    ) -> Result<StateSnapshot, SyncError> {
        let caller = authenticate(caller)?;
        let meeting = self.authorize(request.meeting_id, &caller.subject).await?;

        let mut tx = self.store.begin().await?;
        match self
            .write_in_tx(&mut tx, &meeting, &caller.subject, request)
            .await
        {
            Ok((snapshot, claimed)) => {
                self.store.commit(tx).await?;
                if claimed {
                    self.observer
                        .on_slot_claimed(snapshot.meeting_id, &snapshot.author_id);
                }
                self.observer.on_append(&snapshot);
                Ok(snapshot)
            }
            Err(e) => {
                if let Err(rollback_err) = self.store.rollback(tx).await {
                    tracing::warn!(
                        meeting_id = %meeting.id,
                        error = %rollback_err,
                        "rollback after failed append also failed"
                    );
                }
                Err(e)
            }
        }
    }

    /// Steps that must observe a consistent view of the meeting's log.
    ///
    /// `meeting` is the pre-transaction read the access decision was made
    /// on. Returns the snapshot to commit and whether this write claimed the
    /// candidate slot.
    async fn write_in_tx(
        &self,
        tx: &mut S::Transaction,
        meeting: &Meeting,
        author: &UserId,
        request: AppendRequest,
    ) -> Result<(StateSnapshot, bool), SyncError> {
        let AppendRequest {
            meeting_id,
            content,
            last_seq,
        } = request;

        let Some(locked) = self.store.lock_meeting(tx, meeting_id).await? else {
            return Err(SyncError::AccessDenied { meeting_id });
        };

        let claimed = if access::should_claim_slot(meeting, author) {
            let won = self
                .store
                .claim_candidate_slot(tx, meeting_id, author)
                .await?;
            if !won {
                tracing::debug!(
                    %meeting_id,
                    writer = %author,
                    bound = ?locked.candidate_id,
                    "candidate slot taken by a concurrent writer"
                );
            }
            won
        } else {
            false
        };

        let latest_seq = self
            .store
            .latest_snapshot(tx, meeting_id)
            .await?
            .map(|s| s.seq);

        if let (Some(expected), Some(latest)) = (last_seq, latest_seq)
            && expected != latest
        {
            return Err(SyncError::StaleState {
                meeting_id,
                expected,
                latest,
            });
        }

        let seq = match latest_seq {
            Some(latest) => latest
                .checked_add(1)
                .ok_or(SyncError::SequenceExhausted { meeting_id })?,
            None => 1,
        };

        let snapshot = StateSnapshot {
            id: SnapshotId::new(),
            meeting_id,
            seq,
            content,
            author_id: author.clone(),
            created_at: Utc::now(),
        };

        // Only a conditional writer can be stale. For an unconditional one a
        // taken seq means the meeting lock did not hold, so it stays a store error.
        match (self.store.insert_snapshot(tx, &snapshot).await, last_seq) {
            (Ok(()), _) => Ok((snapshot, claimed)),
            (Err(DbError::DuplicateSequence { seq, .. }), Some(expected)) => {
                Err(SyncError::StaleState {
                    meeting_id,
                    expected,
                    latest: seq,
                })
            }
            (Err(e), _) => Err(e.into()),
        }
    }

    /// Load the meeting and run the access guard against it.
    async fn authorize(&self, meeting_id: MeetingId, caller: &UserId) -> Result<Meeting, SyncError> {
        let meeting = self
            .store
            .find_meeting(meeting_id)
            .await?
            .ok_or(SyncError::AccessDenied { meeting_id })?;

        let grant = access::evaluate_access(&meeting, caller)
            .ok_or(SyncError::AccessDenied { meeting_id })?;
        tracing::trace!(%meeting_id, %caller, grant = grant.as_str(), "access granted");
        Ok(meeting)
    }
}

const fn authenticate(caller: Option<&CallerIdentity>) -> Result<&CallerIdentity, SyncError> {
    match caller {
        Some(caller) => Ok(caller),
        None => Err(SyncError::Unauthenticated),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use codepad_db::MemoryStore;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl StateLogObserver for Recorder {
        fn on_read(&self, _meeting_id: MeetingId, caller: &UserId, latest_seq: Option<u64>) {
            self.push(format!("read {caller} {latest_seq:?}"));
        }

        fn on_append(&self, snapshot: &StateSnapshot) {
            self.push(format!("append {}", snapshot.seq));
        }

        fn on_slot_claimed(&self, _meeting_id: MeetingId, candidate: &UserId) {
            self.push(format!("claim {candidate}"));
        }

        fn on_rejected(&self, operation: Operation, _meeting_id: MeetingId, error: &SyncError) {
            self.push(format!("reject {} {}", operation.as_str(), error.kind().as_str()));
        }
    }

    fn setup() -> (StateLog<MemoryStore>, Arc<Recorder>, MeetingId) {
        let meeting = Meeting::new(MeetingId::new(), vec![UserId::from("ivy")]);
        let meeting_id = meeting.id;
        let store = Arc::new(MemoryStore::seeded([meeting]));
        let recorder = Arc::new(Recorder::default());
        let log = StateLog::with_observer(store, Arc::clone(&recorder) as Arc<dyn StateLogObserver>);
        (log, recorder, meeting_id)
    }

    #[tokio::test]
    async fn observer_sees_claim_then_append() {
        let (log, recorder, meeting_id) = setup();
        let cam = CallerIdentity::new("cam");

        log.append(Some(&cam), AppendRequest::new(meeting_id, "x", None))
            .await
            .unwrap();
        log.get_latest(Some(&cam), meeting_id).await.unwrap();

        assert_eq!(
            recorder.events(),
            vec!["claim cam", "append 1", "read cam Some(1)"]
        );
    }

    #[tokio::test]
    async fn observer_sees_rejections() {
        let (log, recorder, meeting_id) = setup();

        let result = log.get_latest(None, meeting_id).await;
        assert!(matches!(result, Err(SyncError::Unauthenticated)));

        log.append(
            Some(&CallerIdentity::new("ivy")),
            AppendRequest::new(meeting_id, "a", None),
        )
        .await
        .unwrap();
        let stale = log
            .append(
                Some(&CallerIdentity::new("ivy")),
                AppendRequest::new(meeting_id, "b", Some(0)),
            )
            .await;
        assert!(matches!(stale, Err(SyncError::StaleState { expected: 0, latest: 1, .. })));

        assert_eq!(
            recorder.events(),
            vec![
                "reject get_latest unauthenticated",
                "append 1",
                "reject append stale_state",
            ]
        );
    }

    #[tokio::test]
    async fn interviewer_write_leaves_slot_open() {
        let (log, recorder, meeting_id) = setup();

        log.append(
            Some(&CallerIdentity::new("ivy")),
            AppendRequest::new(meeting_id, "a", None),
        )
        .await
        .unwrap();

        let meeting = log.store().find_meeting(meeting_id).await.unwrap().unwrap();
        assert!(meeting.candidate_slot_open());
        assert_eq!(recorder.events(), vec!["append 1"]);
    }

    #[tokio::test]
    async fn rejected_write_does_not_claim_slot() {
        let (log, _recorder, meeting_id) = setup();
        log.append(
            Some(&CallerIdentity::new("ivy")),
            AppendRequest::new(meeting_id, "a", None),
        )
        .await
        .unwrap();

        let result = log
            .append(
                Some(&CallerIdentity::new("cam")),
                AppendRequest::new(meeting_id, "b", Some(7)),
            )
            .await;
        assert!(matches!(result, Err(SyncError::StaleState { .. })));

        let meeting = log.store().find_meeting(meeting_id).await.unwrap().unwrap();
        assert!(meeting.candidate_slot_open());
    }
}

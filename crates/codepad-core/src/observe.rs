//! Hooks for watching the state log from the outside.
//!
//! Callbacks run inline on the request path after the outcome is known, so
//! implementations must not block.

use codepad_types::{MeetingId, StateSnapshot, UserId};

use crate::error::SyncError;

/// Which state log operation produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// A latest-state read.
    GetLatest,
    /// A snapshot append.
    Append,
}

impl Operation {
    /// Stable label for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetLatest => "get_latest",
            Self::Append => "append",
        }
    }
}

/// Receives outcome notifications from a [`StateLog`](crate::StateLog).
pub trait StateLogObserver: Send + Sync {
    /// A caller read the latest snapshot (`None` when the log is empty).
    fn on_read(&self, _meeting_id: MeetingId, _caller: &UserId, _latest_seq: Option<u64>) {}

    /// A snapshot was committed.
    fn on_append(&self, _snapshot: &StateSnapshot) {}

    /// A writer was bound as the meeting's candidate.
    fn on_slot_claimed(&self, _meeting_id: MeetingId, _candidate: &UserId) {}

    /// An operation failed.
    fn on_rejected(&self, _operation: Operation, _meeting_id: MeetingId, _error: &SyncError) {}
}

/// Ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl StateLogObserver for NoopObserver {}

/// Emits each event as a structured `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl StateLogObserver for TracingObserver {
    fn on_read(&self, meeting_id: MeetingId, caller: &UserId, latest_seq: Option<u64>) {
        tracing::debug!(%meeting_id, %caller, ?latest_seq, "editor state read");
    }

    fn on_append(&self, snapshot: &StateSnapshot) {
        tracing::info!(
            meeting_id = %snapshot.meeting_id,
            seq = snapshot.seq,
            author = %snapshot.author_id,
            bytes = snapshot.content.len(),
            "editor state saved"
        );
    }

    fn on_slot_claimed(&self, meeting_id: MeetingId, candidate: &UserId) {
        tracing::info!(%meeting_id, %candidate, "candidate slot claimed");
    }

    fn on_rejected(&self, operation: Operation, meeting_id: MeetingId, error: &SyncError) {
        let kind = error.kind().as_str();
        if error.kind() == crate::ErrorKind::Internal {
            tracing::error!(%meeting_id, operation = operation.as_str(), kind, error = %error, "editor state operation failed");
        } else {
            tracing::warn!(%meeting_id, operation = operation.as_str(), kind, error = %error, "editor state operation rejected");
        }
    }
}

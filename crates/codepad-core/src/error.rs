//! Error taxonomy for editor state operations.

use codepad_db::DbError;
use codepad_types::MeetingId;

/// Errors returned by [`StateLog`](crate::StateLog) operations.
///
/// Callers distinguish failures by [`SyncError::kind`]. Only
/// [`SyncError::StaleState`] is worth retrying, and only after re-reading
/// the latest snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// No caller identity could be resolved.
    #[error("unauthenticated")]
    Unauthenticated,

    /// The meeting does not exist, or the caller is neither an interviewer,
    /// the bound candidate, nor eligible for an open candidate slot.
    #[error("access denied")]
    AccessDenied {
        /// The meeting that was requested.
        meeting_id: MeetingId,
    },

    /// The caller's view of the log is out of date.
    #[error("state is stale: fetch latest before updating (based on seq {expected}, latest is {latest})")]
    StaleState {
        /// The meeting that was written.
        meeting_id: MeetingId,
        /// The `last_seq` the caller based its write on.
        expected: u64,
        /// The true latest `seq` at write time.
        latest: u64,
    },

    /// The meeting's sequence counter cannot be advanced any further.
    #[error("sequence exhausted for meeting {meeting_id}")]
    SequenceExhausted {
        /// The meeting whose log is full.
        meeting_id: MeetingId,
    },

    /// The underlying store failed.
    #[error("store error: {0}")]
    Store(#[from] DbError),
}

/// Coarse category of a [`SyncError`], stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`SyncError::Unauthenticated`].
    Unauthenticated,
    /// See [`SyncError::AccessDenied`].
    AccessDenied,
    /// See [`SyncError::StaleState`].
    StaleState,
    /// Anything the caller cannot fix by changing its request.
    Internal,
}

impl ErrorKind {
    /// Stable `snake_case` label for logs and API bodies.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::AccessDenied => "access_denied",
            Self::StaleState => "stale_state",
            Self::Internal => "internal",
        }
    }
}

impl SyncError {
    /// Categorize this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::AccessDenied { .. } => ErrorKind::AccessDenied,
            Self::StaleState { .. } => ErrorKind::StaleState,
            Self::SequenceExhausted { .. } | Self::Store(_) => ErrorKind::Internal,
        }
    }

    /// Whether re-reading the latest snapshot and resubmitting may succeed.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StaleState { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_stale_state_is_retryable() {
        let meeting_id = MeetingId::new();
        let stale = SyncError::StaleState {
            meeting_id,
            expected: 1,
            latest: 2,
        };
        assert!(stale.is_retryable());
        assert_eq!(stale.kind(), ErrorKind::StaleState);

        assert!(!SyncError::Unauthenticated.is_retryable());
        assert!(!SyncError::AccessDenied { meeting_id }.is_retryable());
        assert!(!SyncError::Store(DbError::MeetingNotFound(meeting_id)).is_retryable());
    }

    #[test]
    fn store_errors_are_internal() {
        let err = SyncError::from(DbError::Corrupt(String::from("bad row")));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.kind().as_str(), "internal");
    }

    #[test]
    fn messages_are_human_readable() {
        assert_eq!(SyncError::Unauthenticated.to_string(), "unauthenticated");
        let denied = SyncError::AccessDenied {
            meeting_id: MeetingId::new(),
        };
        assert_eq!(denied.to_string(), "access denied");
        let stale = SyncError::StaleState {
            meeting_id: MeetingId::new(),
            expected: 1,
            latest: 2,
        };
        assert!(stale.to_string().starts_with("state is stale"));
    }
}

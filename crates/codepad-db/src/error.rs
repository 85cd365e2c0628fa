//! Error types for the document store.
//!
//! All store failures are propagated via [`DbError`], which wraps the
//! underlying [`sqlx`] errors and adds the domain-level conflicts that
//! both backends report identically.

use codepad_types::MeetingId;

/// Errors that can occur in the document store.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The referenced meeting does not exist.
    #[error("meeting not found: {0}")]
    MeetingNotFound(MeetingId),

    /// A meeting with this ID already exists.
    #[error("meeting already exists: {0}")]
    MeetingExists(MeetingId),

    /// A snapshot with this `(meeting_id, seq)` pair is already stored.
    #[error("duplicate sequence {seq} for meeting {meeting_id}")]
    DuplicateSequence {
        /// The meeting whose log was written.
        meeting_id: MeetingId,
        /// The sequence number that was already taken.
        seq: u64,
    },

    /// A stored row could not be mapped onto the domain types.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

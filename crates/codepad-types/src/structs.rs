//! Core entity structs shared by the store, the state log, and the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{MeetingId, SnapshotId, UserId};

/// A scheduled interview session that owns one editor buffer.
///
/// Only the access-relevant fields are modelled here. The meeting record
/// is created and scheduled elsewhere; the editor only ever writes
/// `candidate_id`, and only to move it from unset to set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Meeting {
    /// Meeting identifier.
    pub id: MeetingId,
    /// Users running the interview.
    pub interviewer_ids: Vec<UserId>,
    /// The bound candidate, or `None` while the slot is open.
    pub candidate_id: Option<UserId>,
}

impl Meeting {
    /// Create a meeting with the given interviewers and an open candidate slot.
    pub const fn new(id: MeetingId, interviewer_ids: Vec<UserId>) -> Self {
        Self {
            id,
            interviewer_ids,
            candidate_id: None,
        }
    }

    /// Bind a candidate up front (builder style).
    #[must_use]
    pub fn with_candidate(mut self, candidate: UserId) -> Self {
        self.candidate_id = Some(candidate);
        self
    }

    /// Whether `user` is one of the meeting's interviewers.
    pub fn is_interviewer(&self, user: &UserId) -> bool {
        self.interviewer_ids.contains(user)
    }

    /// Whether `user` is the bound candidate.
    pub fn is_candidate(&self, user: &UserId) -> bool {
        self.candidate_id.as_ref() == Some(user)
    }

    /// Whether no candidate has been bound yet.
    pub const fn candidate_slot_open(&self) -> bool {
        self.candidate_id.is_none()
    }
}

/// One immutable, fully materialized version of a meeting's editor buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StateSnapshot {
    /// Snapshot identifier.
    pub id: SnapshotId,
    /// The meeting this buffer belongs to.
    pub meeting_id: MeetingId,
    /// Position in the meeting's log, starting at 1.
    pub seq: u64,
    /// Full buffer text at this version.
    pub content: String,
    /// The user who wrote this version.
    pub author_id: UserId,
    /// Write timestamp.
    pub created_at: DateTime<Utc>,
}

/// The authenticated caller of an editor state operation.
///
/// Resolved per request by the auth collaborator and passed explicitly
/// into every core call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// The auth provider's subject for this caller.
    pub subject: UserId,
}

impl CallerIdentity {
    /// Create an identity for the given subject.
    pub fn new(subject: impl Into<UserId>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

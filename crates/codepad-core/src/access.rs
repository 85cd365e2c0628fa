//! Access control for a meeting's editor buffer.
//!
//! The guard is a pure function of the meeting record and the caller. It
//! holds no state and performs no writes; both the read and the write path
//! evaluate it on every call.
//!
//! | Caller | `candidate_id` | Decision |
//! |--------|----------------|----------|
//! | interviewer | any | [`AccessGrant::Interviewer`] |
//! | anyone else | unset | [`AccessGrant::OpenSlot`] |
//! | the candidate | set | [`AccessGrant::Candidate`] |
//! | anyone else | set | denied |

use codepad_types::{Meeting, UserId};

/// Why a caller was allowed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessGrant {
    /// The caller is one of the meeting's interviewers.
    Interviewer,
    /// The caller is the bound candidate.
    Candidate,
    /// No candidate is bound yet, so any authenticated caller may enter.
    OpenSlot,
}

impl AccessGrant {
    /// Stable label for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Interviewer => "interviewer",
            Self::Candidate => "candidate",
            Self::OpenSlot => "open_slot",
        }
    }
}

/// Decide whether `caller` may read or write `meeting`'s editor state.
///
/// Returns `None` when access is denied.
pub fn evaluate_access(meeting: &Meeting, caller: &UserId) -> Option<AccessGrant> {
    if meeting.is_interviewer(caller) {
        Some(AccessGrant::Interviewer)
    } else if meeting.candidate_slot_open() {
        Some(AccessGrant::OpenSlot)
    } else if meeting.is_candidate(caller) {
        Some(AccessGrant::Candidate)
    } else {
        None
    }
}

/// Boolean form of [`evaluate_access`]; a missing meeting is always denied.
pub fn can_access(meeting: Option<&Meeting>, caller: &UserId) -> bool {
    meeting.is_some_and(|m| evaluate_access(m, caller).is_some())
}

/// Whether a write by `caller` should bind them as the meeting's candidate.
///
/// True only while the slot is open and the writer is not an interviewer.
pub fn should_claim_slot(meeting: &Meeting, caller: &UserId) -> bool {
    meeting.candidate_slot_open() && !meeting.is_interviewer(caller)
}

#[cfg(test)]
mod tests {
    use codepad_types::MeetingId;

    use super::*;

    fn meeting() -> Meeting {
        Meeting::new(MeetingId::new(), vec![UserId::from("ivy")])
    }

    #[test]
    fn missing_meeting_is_denied() {
        assert!(!can_access(None, &UserId::from("ivy")));
    }

    #[test]
    fn interviewer_always_allowed() {
        let open = meeting();
        let bound = meeting().with_candidate(UserId::from("cam"));
        let ivy = UserId::from("ivy");

        assert_eq!(evaluate_access(&open, &ivy), Some(AccessGrant::Interviewer));
        assert_eq!(evaluate_access(&bound, &ivy), Some(AccessGrant::Interviewer));
    }

    #[test]
    fn anyone_allowed_while_slot_open() {
        let open = meeting();
        assert_eq!(
            evaluate_access(&open, &UserId::from("stranger")),
            Some(AccessGrant::OpenSlot)
        );
        assert!(can_access(Some(&open), &UserId::from("stranger")));
    }

    #[test]
    fn only_bound_candidate_allowed_once_set() {
        let bound = meeting().with_candidate(UserId::from("cam"));
        assert_eq!(
            evaluate_access(&bound, &UserId::from("cam")),
            Some(AccessGrant::Candidate)
        );
        assert_eq!(evaluate_access(&bound, &UserId::from("mallory")), None);
        assert!(!can_access(Some(&bound), &UserId::from("mallory")));
    }

    #[test]
    fn interviewers_never_claim_the_slot() {
        let open = meeting();
        assert!(!should_claim_slot(&open, &UserId::from("ivy")));
        assert!(should_claim_slot(&open, &UserId::from("cam")));

        let bound = meeting().with_candidate(UserId::from("cam"));
        assert!(!should_claim_slot(&bound, &UserId::from("cam")));
        assert!(!should_claim_slot(&bound, &UserId::from("mallory")));
    }
}

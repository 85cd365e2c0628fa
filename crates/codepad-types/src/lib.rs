//! Shared type definitions for the Codepad interview editor.
//!
//! This crate is the single source of truth for the types that cross crate
//! boundaries: the store, the state log, and the HTTP API all speak in
//! these terms. Types flow downstream to `TypeScript` via `ts-rs` for the
//! browser editor.
//!
//! # Modules
//!
//! - [`ids`] -- Identifier newtypes for meetings, snapshots, and users
//! - [`structs`] -- Meeting records, editor state snapshots, caller identity

pub mod ids;
pub mod structs;

pub use ids::{MeetingId, SnapshotId, UserId};
pub use structs::{CallerIdentity, Meeting, StateSnapshot};

#[cfg(test)]
mod tests {
    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::ids::MeetingId::export_all();
        let _ = crate::ids::SnapshotId::export_all();
        let _ = crate::ids::UserId::export_all();
        let _ = crate::structs::Meeting::export_all();
        let _ = crate::structs::StateSnapshot::export_all();
    }
}

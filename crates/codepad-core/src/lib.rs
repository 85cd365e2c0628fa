//! Access control and the versioned editor state log for Codepad meetings.
//!
//! # Modules
//!
//! - [`access`] -- The per-call access guard over a meeting record.
//! - [`config`] -- Configuration loading from `codepad-config.yaml` into
//!   strongly-typed structs.
//! - [`error`] -- [`SyncError`] and its coarse [`ErrorKind`].
//! - [`observe`] -- [`StateLogObserver`] hooks and the default
//!   [`TracingObserver`].
//! - [`state_log`] -- [`StateLog`], the guarded read and compare-and-swap
//!   append over a [`DocumentStore`](codepad_db::DocumentStore).

pub mod access;
pub mod config;
pub mod error;
pub mod observe;
pub mod state_log;

pub use access::{AccessGrant, can_access, evaluate_access, should_claim_slot};
pub use config::{CodepadConfig, ConfigError};
pub use error::{ErrorKind, SyncError};
pub use observe::{NoopObserver, Operation, StateLogObserver, TracingObserver};
pub use state_log::{AppendRequest, StateLog};

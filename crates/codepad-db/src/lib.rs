//! Document store for Codepad editor state.
//!
//! The editor state log consumes three things from its persistence layer:
//! get-by-id, a conditional patch of one meeting field, and an indexed
//! "latest snapshot for meeting" query, all inside an atomic transaction.
//! [`DocumentStore`] captures exactly that contract; two backends
//! implement it.
//!
//! # Architecture
//!
//! ```text
//! StateLog
//!     |
//!     +-- DocumentStore (trait)
//!         |-- MemoryStore      (single-process, tests and local dev)
//!         +-- PgDocumentStore  (PostgreSQL via sqlx)
//! ```
//!
//! # Modules
//!
//! - [`store`] -- The [`DocumentStore`] trait and its transaction contract
//! - [`memory`] -- In-memory backend
//! - [`pg_store`] -- `PostgreSQL` backend, pool and migrations
//! - [`settings`] -- [`DatabaseSettings`] from the config file
//! - [`error`] -- Shared error types

pub mod error;
pub mod memory;
pub mod pg_store;
pub mod settings;
pub mod store;

pub use error::DbError;
pub use memory::{MemoryStore, MemoryTransaction};
pub use pg_store::{MeetingRow, PgDocumentStore, SnapshotRow};
pub use settings::DatabaseSettings;
pub use store::DocumentStore;

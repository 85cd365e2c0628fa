//! HTTP API for Codepad meeting editor state.
//!
//! Exposes the [`StateLog`](codepad_core::StateLog) operations as REST
//! endpoints:
//!
//! - `GET /api/meetings/{id}/state` -- latest snapshot
//! - `POST /api/meetings/{id}/state` -- append a snapshot
//!
//! Caller identity arrives in the `x-auth-subject` header set by the
//! authenticating gateway (see [`identity`]).

pub mod error;
pub mod handlers;
pub mod identity;
pub mod router;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;

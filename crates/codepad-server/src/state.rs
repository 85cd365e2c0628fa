//! Shared application state for the Codepad API server.

use std::sync::Arc;

use codepad_core::StateLog;
use codepad_db::DocumentStore;

/// State shared by every handler.
#[derive(Debug)]
pub struct AppState<S> {
    /// The guarded editor state log.
    pub state_log: StateLog<S>,
}

impl<S: DocumentStore> AppState<S> {
    /// Wrap `store` in a state log with the default tracing observer.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            state_log: StateLog::new(store),
        }
    }

    /// Use a pre-built state log.
    pub const fn from_state_log(state_log: StateLog<S>) -> Self {
        Self { state_log }
    }
}

//! REST API endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness probe |
//! | `GET` | `/api/meetings/{id}/state` | Latest editor snapshot, or `null` |
//! | `POST` | `/api/meetings/{id}/state` | Append a new editor snapshot |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use codepad_core::AppendRequest;
use codepad_db::DocumentStore;
use codepad_types::{MeetingId, StateSnapshot};
use uuid::Uuid;

use crate::error::ApiError;
use crate::identity::Caller;
use crate::state::AppState;

/// Request body for `POST /api/meetings/{id}/state`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SaveStateBody {
    /// Full buffer contents.
    pub content: String,
    /// The `seq` the client last observed, if it has read before.
    #[serde(default)]
    pub last_seq: Option<u64>,
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// GET /api/meetings/{id}/state
// ---------------------------------------------------------------------------

/// Return the latest snapshot for a meeting, or `null` when nothing has
/// been saved yet.
pub async fn get_latest_state<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id_str): Path<String>,
    Caller(caller): Caller,
) -> Result<Json<Option<StateSnapshot>>, ApiError> {
    let meeting_id = parse_meeting_id(&id_str)?;
    let latest = state
        .state_log
        .get_latest(caller.as_ref(), meeting_id)
        .await?;
    Ok(Json(latest))
}

// ---------------------------------------------------------------------------
// POST /api/meetings/{id}/state
// ---------------------------------------------------------------------------

/// Append a snapshot and return it.
pub async fn save_state<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id_str): Path<String>,
    Caller(caller): Caller,
    payload: Result<Json<SaveStateBody>, JsonRejection>,
) -> Result<Json<StateSnapshot>, ApiError> {
    let meeting_id = parse_meeting_id(&id_str)?;
    let Json(body) = payload.map_err(|e| ApiError::InvalidBody(e.body_text()))?;

    let request = AppendRequest {
        meeting_id,
        content: body.content,
        last_seq: body.last_seq,
    };
    let snapshot = state.state_log.append(caller.as_ref(), request).await?;
    Ok(Json(snapshot))
}

fn parse_meeting_id(s: &str) -> Result<MeetingId, ApiError> {
    Uuid::parse_str(s)
        .map(MeetingId::from)
        .map_err(|e| ApiError::InvalidUuid(format!("{s}: {e}")))
}

//! Error types for the Codepad HTTP API.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Every
//! error body has the shape `{ "error", "kind", "status" }`; stale writes
//! additionally carry `retryable` and `latest_seq`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use codepad_core::{ErrorKind, SyncError};

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The state log rejected or failed the operation.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// A UUID could not be parsed from the request path.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),

    /// The request body was missing or malformed.
    #[error("invalid request body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Sync(e) => match e.kind() {
                ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
                ErrorKind::AccessDenied => StatusCode::FORBIDDEN,
                ErrorKind::StaleState => StatusCode::CONFLICT,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InvalidUuid(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    const fn kind_label(&self) -> &'static str {
        match self {
            Self::Sync(e) => e.kind().as_str(),
            Self::InvalidUuid(_) | Self::InvalidBody(_) => "bad_request",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Store failures are logged by the state log observer; the client
        // only learns that something went wrong.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            String::from("internal error")
        } else {
            self.to_string()
        };

        let mut body = serde_json::json!({
            "error": message,
            "kind": self.kind_label(),
            "status": status.as_u16(),
        });

        if let Self::Sync(SyncError::StaleState { latest, .. }) = &self
            && let Some(obj) = body.as_object_mut()
        {
            obj.insert("retryable".to_owned(), serde_json::Value::Bool(true));
            obj.insert("latest_seq".to_owned(), serde_json::Value::from(*latest));
        }

        (status, axum::Json(body)).into_response()
    }
}

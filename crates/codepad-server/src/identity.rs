//! Caller identity resolution.
//!
//! Authentication happens upstream. The gateway in front of this server
//! verifies the session and forwards the subject in the
//! [`AUTH_SUBJECT_HEADER`] header. A missing or blank header means the
//! request is anonymous, which the state log rejects as unauthenticated.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use codepad_types::CallerIdentity;

/// Header carrying the authenticated subject.
pub const AUTH_SUBJECT_HEADER: &str = "x-auth-subject";

/// Extractor yielding the resolved caller, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub Option<CallerIdentity>);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve_caller(&parts.headers)))
    }
}

/// Resolve the caller from request headers.
pub fn resolve_caller(headers: &HeaderMap) -> Option<CallerIdentity> {
    let subject = headers.get(AUTH_SUBJECT_HEADER)?.to_str().ok()?.trim();
    if subject.is_empty() {
        None
    } else {
        Some(CallerIdentity::new(subject))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &'static str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(AUTH_SUBJECT_HEADER, HeaderValue::from_static(value));
        map
    }

    #[test]
    fn subject_header_resolves() {
        let caller = resolve_caller(&headers("  cam "));
        assert_eq!(caller, Some(CallerIdentity::new("cam")));
    }

    #[test]
    fn missing_or_blank_is_anonymous() {
        assert_eq!(resolve_caller(&HeaderMap::new()), None);
        assert_eq!(resolve_caller(&headers("   ")), None);
    }
}

//! Settling client results against the session.
//!
//! Every screen funnels its `Result<T, ApiError>` through [`settle`], so a
//! rejected credential is handled in exactly one place whichever request
//! saw it.

use tracing::debug;

use crate::auth::{Route, Session};

use super::ApiError;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome<T> {
    Success(T),
    /// Transient notice for the status bar
    Failed(String),
    /// The session was cleared; navigate to this route without a notice
    Unauthorized(Route),
}

impl<T> ApiOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiOutcome::Success(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiOutcome<U> {
        match self {
            ApiOutcome::Success(value) => ApiOutcome::Success(f(value)),
            ApiOutcome::Failed(notice) => ApiOutcome::Failed(notice),
            ApiOutcome::Unauthorized(route) => ApiOutcome::Unauthorized(route),
        }
    }
}

/// Convert a client result into what the UI should do with it.
///
/// A 401 invalidates the session (clearing the stored token once). Other
/// failures become a notice: the backend's `detail` when it sent one,
/// otherwise `fallback`.
pub fn settle<T>(session: &mut Session, result: Result<T, ApiError>, fallback: &str) -> ApiOutcome<T> {
    match result {
        Ok(value) => ApiOutcome::Success(value),
        Err(ApiError::Unauthorized) => ApiOutcome::Unauthorized(session.invalidate()),
        Err(e) => {
            debug!(error = %e, "Request failed");
            let notice = e.detail().unwrap_or(fallback).to_string();
            ApiOutcome::Failed(notice)
        }
    }
}

//! Error taxonomy for the fraud case service.
//!
//! Every failed operation surfaces one of these variants to the caller;
//! nothing is swallowed into a default value. The HTTP mapping lives here
//! so handlers can return `FraudError` directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::types::case::CaseStatus;

#[derive(Debug, Error)]
pub enum FraudError {
    /// Malformed or out-of-range input. Never retried automatically.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Fraud score outside `[0, 1]` or non-finite.
    #[error("invalid fraud score {score}: must be a finite value in [0, 1]")]
    InvalidScore { score: f64 },

    /// Statistics window must cover between one day and one year.
    #[error("invalid window: {days} days (must be 1 to 365)")]
    InvalidWindow { days: i64 },

    /// Note text is blank.
    #[error("note text must not be blank")]
    EmptyNote,

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("authentication required")]
    Unauthorized,

    #[error("insufficient permissions for this action")]
    Forbidden,

    /// The case is in a terminal status; its lifecycle is closed.
    #[error("case is already closed")]
    CaseAlreadyClosed,

    /// The requested status change is not in the transition table.
    #[error("illegal case transition from {from} to {to}")]
    IllegalTransition { from: CaseStatus, to: CaseStatus },

    /// Concurrent-write contention on the same entity. Safe to retry.
    #[error("conflicting concurrent update: {0}")]
    Conflict(String),

    /// Scoring or storage collaborator failure after bounded retries.
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),
}

impl FraudError {
    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            FraudError::Validation(_) => "validation_error",
            FraudError::InvalidScore { .. } => "invalid_score",
            FraudError::InvalidWindow { .. } => "invalid_window",
            FraudError::EmptyNote => "empty_note",
            FraudError::NotFound { .. } => "not_found",
            FraudError::Unauthorized => "unauthorized",
            FraudError::Forbidden => "forbidden",
            FraudError::CaseAlreadyClosed => "case_already_closed",
            FraudError::IllegalTransition { .. } => "illegal_transition",
            FraudError::Conflict(_) => "conflict",
            FraudError::DependencyUnavailable(_) => "dependency_unavailable",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            FraudError::Validation(_)
            | FraudError::InvalidScore { .. }
            | FraudError::InvalidWindow { .. }
            | FraudError::EmptyNote => StatusCode::BAD_REQUEST,
            FraudError::NotFound { .. } => StatusCode::NOT_FOUND,
            FraudError::Unauthorized => StatusCode::UNAUTHORIZED,
            FraudError::Forbidden => StatusCode::FORBIDDEN,
            FraudError::IllegalTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            FraudError::CaseAlreadyClosed | FraudError::Conflict(_) => StatusCode::CONFLICT,
            FraudError::DependencyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for FraudError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!(error = %self, code = self.code(), "request failed");
        }
        let body = Json(json!({
            "error": self.code(),
            "detail": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            FraudError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            FraudError::CaseAlreadyClosed.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            FraudError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            FraudError::DependencyUnavailable("scorer".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(FraudError::EmptyNote.code(), "empty_note");
        assert_eq!(
            FraudError::IllegalTransition {
                from: CaseStatus::Investigating,
                to: CaseStatus::Pending,
            }
            .code(),
            "illegal_transition"
        );
    }
}

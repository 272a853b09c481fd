//! JSON error responses

use crate::error::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, warn};

/// Error body returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message
    pub error: String,
    /// Stable machine-readable kind
    pub kind: &'static str,
    /// Pipeline step the failure happened in, for submissions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<&'static str>,
}

/// Handler error wrapping the crate error
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

/// HTTP status for an error, decided by its root cause
pub fn status_for(err: &Error) -> StatusCode {
    match err.root() {
        Error::Invalid(_) => StatusCode::BAD_REQUEST,
        Error::Auth(_) => StatusCode::UNAUTHORIZED,
        Error::NotFound(_) | Error::BaseBranchNotFound(_) => StatusCode::NOT_FOUND,
        Error::Conflict(_)
        | Error::BranchCreateConflict(_)
        | Error::NoDraftMatch(_)
        | Error::NoMergedPr(_) => StatusCode::CONFLICT,
        Error::EmptyCommit(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        Error::Remote { .. } | Error::Http(_) | Error::TooManyResults { .. } => {
            StatusCode::BAD_GATEWAY
        }
        Error::ForkNotReady { .. } => StatusCode::SERVICE_UNAVAILABLE,
        Error::Config(_) | Error::Io(_) | Error::Json(_) | Error::Submission { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Machine-readable kind for an error
pub fn kind_for(err: &Error) -> &'static str {
    match err.root() {
        Error::Auth(_) => "auth",
        Error::NotFound(_) => "not-found",
        Error::Conflict(_) => "conflict",
        Error::BaseBranchNotFound(_) => "base-branch-not-found",
        Error::BranchCreateConflict(_) => "branch-exists",
        Error::QuotaExceeded { .. } => "quota-exceeded",
        Error::EmptyCommit(_) => "empty-commit",
        Error::NoMergedPr(_) => "no-merged-pr",
        Error::NoDraftMatch(_) => "no-draft-match",
        Error::ForkNotReady { .. } => "fork-not-ready",
        Error::Remote { .. } | Error::Http(_) => "remote",
        Error::TooManyResults { .. } => "too-many-results",
        Error::Invalid(_) => "invalid",
        Error::Config(_) | Error::Io(_) | Error::Json(_) | Error::Submission { .. } => "internal",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(status = status.as_u16(), "request failed: {}", self.0);
        } else {
            warn!(status = status.as_u16(), "request rejected: {}", self.0);
        }

        let step = match &self.0 {
            Error::Submission { step, .. } => Some(step.as_str()),
            _ => None,
        };
        let body = ErrorBody {
            error: self.0.to_string(),
            kind: kind_for(&self.0),
            step,
        };
        (status, Json(body)).into_response()
    }
}

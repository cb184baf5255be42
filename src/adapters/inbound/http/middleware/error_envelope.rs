use axum::{
    extract::{OriginalUri, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use std::{fmt, str::FromStr};

use crate::{
    adapters::inbound::http::{dto::ErrorEnvelope, error::PendingError},
    domain::errors::ErrorCode,
};

/// How error codes map onto HTTP status codes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorStatusPolicy {
    /// Missing resources are 404, name conflicts 409
    #[default]
    Strict,
    /// Every backend failure is a 500
    Uniform,
}

impl ErrorStatusPolicy {
    pub fn status_for(&self, code: ErrorCode) -> StatusCode {
        match (*self, code) {
            (_, ErrorCode::FileSizeLimitExceeded | ErrorCode::BadRequest) => {
                StatusCode::BAD_REQUEST
            }
            (ErrorStatusPolicy::Strict, code) if code.is_not_found() => StatusCode::NOT_FOUND,
            (ErrorStatusPolicy::Strict, ErrorCode::BucketAlreadyExists) => StatusCode::CONFLICT,
            (ErrorStatusPolicy::Strict, ErrorCode::MethodNotAllowed) => {
                StatusCode::METHOD_NOT_ALLOWED
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl FromStr for ErrorStatusPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(ErrorStatusPolicy::Strict),
            "uniform" => Ok(ErrorStatusPolicy::Uniform),
            other => Err(format!("Unknown error status policy: {}", other)),
        }
    }
}

impl fmt::Display for ErrorStatusPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorStatusPolicy::Strict => f.write_str("strict"),
            ErrorStatusPolicy::Uniform => f.write_str("uniform"),
        }
    }
}

/// Render a pending error into the JSON envelope
///
/// Responses without a [`PendingError`] pass through untouched.
pub async fn render_error_envelope(
    State(policy): State<ErrorStatusPolicy>,
    OriginalUri(uri): OriginalUri,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let Some(pending) = response.extensions_mut().remove::<PendingError>() else {
        return response;
    };

    let envelope = ErrorEnvelope {
        timestamp: Utc::now(),
        error_code: pending.code.to_string(),
        message: pending.message,
        details: pending.details,
        request_path: uri.path().to_string(),
    };

    (policy.status_for(pending.code), Json(envelope)).into_response()
}

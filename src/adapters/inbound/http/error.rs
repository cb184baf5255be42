use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::domain::errors::{ErrorCode, GatewayError, ValidationError};

/// Failure of an HTTP request
///
/// Rendering into the JSON envelope happens in
/// [`render_error_envelope`](super::middleware::render_error_envelope); this
/// type only records what went wrong.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("{message}")]
    BadRequest {
        message: String,
        details: Option<String>,
    },

    #[error("No handler found for the requested path")]
    RouteNotFound,

    #[error("Request method is not supported for this path")]
    MethodNotAllowed,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>, details: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            details: Some(details.into()),
        }
    }

    pub fn missing_parameter(name: &str) -> Self {
        Self::bad_request("Missing required parameter", name)
    }

    /// Map a multipart read failure, recognising the body limit
    pub fn from_multipart(err: MultipartError, max_upload_bytes: usize) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            GatewayError::PayloadTooLarge {
                max_bytes: max_upload_bytes as u64,
            }
            .into()
        } else {
            Self::bad_request("Malformed multipart request", err.body_text())
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Gateway(err) => err.code(),
            ApiError::BadRequest { .. } => ErrorCode::BadRequest,
            ApiError::RouteNotFound => ErrorCode::RouteNotFound,
            ApiError::MethodNotAllowed => ErrorCode::MethodNotAllowed,
        }
    }

    pub fn details(&self) -> Option<String> {
        match self {
            ApiError::Gateway(err) => err.details(),
            ApiError::BadRequest { details, .. } => details.clone(),
            ApiError::RouteNotFound | ApiError::MethodNotAllowed => None,
        }
    }
}

/// An error response that still needs its envelope
#[derive(Debug, Clone)]
pub struct PendingError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let pending = PendingError {
            code: self.code(),
            message: self.to_string(),
            details: self.details(),
        };

        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(pending);
        response
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request("Invalid request parameter", err.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request("Invalid query parameters", rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("Invalid request body", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request("Invalid path parameters", rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::bad_request("Malformed multipart request", rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_carries_pending_error() {
        let response = ApiError::Gateway(GatewayError::BucketNotFound {
            bucket: "b1".to_string(),
        })
        .into_response();

        let pending = response.extensions().get::<PendingError>().unwrap();
        assert_eq!(pending.code, ErrorCode::BucketNotFound);
        assert_eq!(pending.message, "Bucket not found");
        assert_eq!(pending.details.as_deref(), Some("Bucket: b1 not found"));
    }

    #[test]
    fn test_bad_request_code() {
        let err = ApiError::missing_parameter("bucket");
        assert_eq!(err.code(), ErrorCode::BadRequest);
        assert_eq!(err.to_string(), "Missing required parameter");
        assert_eq!(err.details().as_deref(), Some("bucket"));
        assert_eq!(ApiError::RouteNotFound.code(), ErrorCode::RouteNotFound);
    }
}

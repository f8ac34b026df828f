use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::error::{Error, ErrorKind};

/// Wire error body: `{error, code, message, details?, timestamp}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            body: ErrorBody {
                error: status.canonical_reason().unwrap_or("Error").to_string(),
                code: code.to_string(),
                message: message.into(),
                details: None,
                timestamp: Utc::now(),
            },
        }
    }

    /// Override the wire code where an endpoint demands a specific one.
    pub fn with_code(mut self, code: &str) -> Self {
        self.body.code = code.to_string();
        self
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let (status, code) = match err.kind {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, not_found_code(&err.context)),
            ErrorKind::AlreadyExists => (StatusCode::CONFLICT, "INDEX_ALREADY_EXISTS"),
            ErrorKind::Conflict => {
                if err.context.contains("name") {
                    (StatusCode::BAD_REQUEST, "SAME_NAME_PROVIDED")
                } else {
                    (StatusCode::CONFLICT, "CONFLICT")
                }
            }
            ErrorKind::Cancelled => (StatusCode::CONFLICT, "CANCELLED"),
            ErrorKind::Io | ErrorKind::Parse | ErrorKind::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };
        ApiError::new(status, code, err.context)
    }
}

fn not_found_code(context: &str) -> &'static str {
    if context.starts_with("index ") {
        "INDEX_NOT_FOUND"
    } else if context.starts_with("job ") {
        "JOB_NOT_FOUND"
    } else {
        "DOCUMENT_NOT_FOUND"
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_to_status_mapping() {
        let err = ApiError::from(Error::validation("bad settings"));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body.code, "VALIDATION_FAILED");

        let err = ApiError::from(Error::not_found("index 'movies' not found"));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.body.code, "INDEX_NOT_FOUND");

        let err = ApiError::from(Error::not_found("document 'm1' not found"));
        assert_eq!(err.body.code, "DOCUMENT_NOT_FOUND");

        let err = ApiError::from(Error::not_found("job 'x' not found"));
        assert_eq!(err.body.code, "JOB_NOT_FOUND");

        let err = ApiError::from(Error::already_exists("index 'movies' already exists"));
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err = ApiError::from(Error::conflict("the new index name equals the current name"));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body.code, "SAME_NAME_PROVIDED");

        let err = ApiError::from(Error::internal("disk on fire"));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_with_code_override() {
        let err = ApiError::from(Error::validation("bad")).with_code("INVALID_QUERY");
        assert_eq!(err.body.code, "INVALID_QUERY");
    }
}

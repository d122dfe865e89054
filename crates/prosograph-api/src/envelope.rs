//! The `{status, data, error, msg}` response envelope.
//!
//! Every response, successful or not, has this shape. Failures carry
//! `status: false`, a `null` payload and the error text in `error`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

use prosograph_core::Error;

/// A JSON response body.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Envelope<T> {
    /// Whether the request succeeded.
    pub status: bool,
    /// The payload.
    pub data: T,
    /// Error messages, empty on success.
    pub error: Vec<String>,
    /// Short human-readable summary.
    pub msg: String,
}

impl<T: Serialize> Envelope<T> {
    /// A successful response.
    pub fn ok(data: T, msg: impl Into<String>) -> Self {
        Self {
            status: true,
            data,
            error: Vec::new(),
            msg: msg.into(),
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Result of a handler.
pub type ApiResult<T> = std::result::Result<Envelope<T>, ApiError>;

/// A failed request, rendered as an envelope with a matching status code.
#[derive(Debug)]
pub struct ApiError {
    code: StatusCode,
    error: Error,
}

impl ApiError {
    /// A 400 for a malformed or missing request parameter.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            code: StatusCode::BAD_REQUEST,
            error: Error::invalid_data(msg),
        }
    }

    /// The HTTP status this error is sent with.
    pub fn status_code(&self) -> StatusCode {
        self.code
    }

    /// The underlying error.
    pub fn error(&self) -> &Error {
        &self.error
    }
}

/// `NotFound` is a 404, bad input is a 400, anything else is a 500.
pub fn status_for(error: &Error) -> StatusCode {
    if error.is_not_found() {
        StatusCode::NOT_FOUND
    } else if error.is_invalid_input() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self {
            code: status_for(&error),
            error,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.code.is_server_error() {
            tracing::error!(error = %self.error, "request failed");
        } else {
            tracing::debug!(status = %self.code, error = %self.error, "request rejected");
        }

        let msg = self
            .code
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
        let body = Envelope {
            status: false,
            data: Value::Null,
            error: vec![self.error.to_string()],
            msg,
        };
        (self.code, Json(body)).into_response()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&Error::not_found("node 9")), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&Error::invalid_data("step")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&Error::empty_graph("no nodes")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&Error::data_source("down")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&Error::snapshot_io("disk full")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_ok_envelope_shape() {
        let value = serde_json::to_value(Envelope::ok(vec![1, 2], "done")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"status": true, "data": [1, 2], "error": [], "msg": "done"})
        );
    }

    #[test]
    fn test_bad_request() {
        let err = ApiError::bad_request("_id is required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.error().to_string().contains("_id is required"));
    }

    #[test]
    fn test_error_response_status() {
        let response = ApiError::from(Error::not_found("node 9")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

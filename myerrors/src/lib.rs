use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Unified error taxonomy for the API. Every AWS call failure is mapped into
/// one of these exactly once, at the gateway boundary; handlers only decide
/// the HTTP shape via `IntoResponse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Malformed input: credential shape, missing fields, bad dates.
    Validation(String),
    /// The vendor rejected the request or reported a call-level failure.
    Vendor(String),
    /// Anything else: client construction, networking, unexpected state.
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(msg) => write!(f, "validation error: {msg}"),
            ApiError::Vendor(msg) => write!(f, "AWS API error: {msg}"),
            ApiError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Vendor(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("AWS API error: {msg}"),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal server error: {msg}"),
            ),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let response = ApiError::Validation("bad region".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn vendor_and_internal_map_to_server_error() {
        let vendor = ApiError::Vendor("throttled".to_string()).into_response();
        assert_eq!(vendor.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let internal = ApiError::Internal("boom".to_string()).into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn anyhow_errors_become_internal() {
        let err: ApiError = anyhow::anyhow!("dispatch failure").into();
        assert_eq!(err, ApiError::Internal("dispatch failure".to_string()));
    }
}

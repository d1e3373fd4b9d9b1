//! HTTP error responses for web adapter.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::domain::error::PlotterError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn status_from_error(err: &PlotterError) -> StatusCode {
    match err {
        PlotterError::Validation { .. } | PlotterError::InvalidPage { .. } => {
            StatusCode::BAD_REQUEST
        }
        PlotterError::NotFound { .. } | PlotterError::InsufficientData { .. } => {
            StatusCode::NOT_FOUND
        }
        PlotterError::DataParse { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        PlotterError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        PlotterError::Allocation { source, .. } => status_from_error(source),
        PlotterError::Storage { .. }
        | PlotterError::ConfigParse { .. }
        | PlotterError::ConfigMissing { .. }
        | PlotterError::ConfigInvalid { .. }
        | PlotterError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<PlotterError> for WebError {
    fn from(err: PlotterError) -> Self {
        let status = status_from_error(&err);
        if status.is_server_error() && status != StatusCode::GATEWAY_TIMEOUT {
            tracing::error!(error = %err, "request failed");
            return Self::internal("Internal server error");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_message() {
        let err = WebError::from(PlotterError::InvalidPage {
            page: 9,
            total_pages: 2,
        });
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("invalid page number 9"));
    }

    #[test]
    fn allocation_errors_take_the_inner_status() {
        let err = PlotterError::Allocation {
            ticker: "AAPL".into(),
            source: Box::new(PlotterError::not_found("AAPL")),
        };
        assert_eq!(status_from_error(&err), StatusCode::NOT_FOUND);
    }

    #[test]
    fn storage_errors_hide_details() {
        let err = WebError::from(PlotterError::Storage {
            reason: "failed to read /secret/path".into(),
        });
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("/secret/path"));
    }

    #[test]
    fn timeouts_map_to_gateway_timeout() {
        let err = WebError::from(PlotterError::Timeout {
            ticker: "AAPL".into(),
            millis: 100,
        });
        assert_eq!(err.status, StatusCode::GATEWAY_TIMEOUT);
    }
}

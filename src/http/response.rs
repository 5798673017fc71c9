//! Error responses.
//!
//! Every failure leaves the relay as JSON carrying a readable message, a
//! machine-readable kind and a timestamp. CORS headers are added by the
//! router layers, not here.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::forwarder::{ErrorKind, ForwardError};

/// Wire shape of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
    pub timestamp: String,
}

/// API error type that converts domain errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
    pub upstream_status: Option<u16>,
}

impl ApiError {
    /// The inbound request deadline expired before the handler finished.
    pub fn deadline_exceeded(deadline: Duration) -> Self {
        Self {
            status: StatusCode::GATEWAY_TIMEOUT,
            kind: ErrorKind::Timeout.as_str(),
            message: format!("request did not complete within {}s", deadline.as_secs()),
            upstream_status: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal",
            message: message.into(),
            upstream_status: None,
        }
    }

    pub fn not_found(path: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: "not_found",
            message: format!("no route for {}", path),
            upstream_status: None,
        }
    }
}

impl From<ForwardError> for ApiError {
    fn from(err: ForwardError) -> Self {
        Self {
            status: StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            kind: err.kind().as_str(),
            message: err.to_string(),
            upstream_status: err.upstream_status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            kind: self.kind.to_string(),
            upstream_status: self.upstream_status,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> ErrorBody {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_upstream_http_error_body() {
        let err = ForwardError::UpstreamHttp { status: 500, status_text: "Internal Server Error".into() };
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = body_of(response).await;
        assert_eq!(body.kind, "http_error");
        assert_eq!(body.upstream_status, Some(500));
        assert!(body.error.contains("500"));
        assert!(chrono::DateTime::parse_from_rfc3339(&body.timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_timeout_is_gateway_timeout() {
        let response = ApiError::from(ForwardError::Timeout(Duration::from_secs(10))).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let body = body_of(response).await;
        assert_eq!(body.kind, "timeout");
        assert_eq!(body.upstream_status, None);
    }

    #[tokio::test]
    async fn test_deadline_exceeded_body() {
        let response = ApiError::deadline_exceeded(Duration::from_secs(30)).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let body = body_of(response).await;
        assert_eq!(body.kind, "timeout");
        assert!(body.error.contains("30s"));
    }

    #[test]
    fn test_upstream_status_omitted_when_absent() {
        let json = serde_json::to_value(ErrorBody {
            error: "x".into(),
            kind: "timeout".into(),
            upstream_status: None,
            timestamp: "t".into(),
        })
        .unwrap();
        assert!(json.get("upstream_status").is_none());
    }
}

//! Route handlers.

use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    BoxError, Json,
};
use serde::Serialize;

use crate::forwarder::{EncryptRequest, ForwardError};
use crate::http::cors;
use crate::http::request::request_id;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;

pub const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub proxy: &'static str,
    pub health: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

/// `/proxy`: preflight, relay, or reject by method.
pub async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let start = Instant::now();

    let response = match method {
        Method::OPTIONS => cors::preflight(),
        Method::GET => relay(&state, &headers, uri.query()).await,
        ref other => {
            tracing::warn!(method = %other, "Rejected non-GET proxy request");
            ApiError::from(ForwardError::MethodNotAllowed(other.to_string())).into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

async fn relay(state: &AppState, headers: &HeaderMap, query: Option<&str>) -> Response {
    let request_id = request_id(headers);

    let request = match EncryptRequest::from_query(query) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(request_id = request_id.unwrap_or("-"), error = %e, "Rejected proxy request");
            return ApiError::from(e).into_response();
        }
    };

    match state.forwarder.forward(&request, request_id).await {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, TEXT_PLAIN_UTF8)], body).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Everything without a dedicated handler: preflight for OPTIONS, 404 for
/// reads, 405 for any other method.
pub async fn fallback_handler(method: Method, uri: Uri) -> Response {
    match method {
        Method::OPTIONS => cors::preflight(),
        Method::GET | Method::HEAD => ApiError::not_found(uri.path()).into_response(),
        ref other => {
            ApiError::from(ForwardError::MethodNotAllowed(other.to_string())).into_response()
        }
    }
}

pub async fn index_handler() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        proxy: "GET /proxy?usr=<usr>&p29=<p29>",
        health: "GET /health",
    })
}

pub async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Turn a failure raised by the deadline middleware into a JSON error.
pub async fn handle_middleware_error(err: BoxError, deadline: Duration) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!(deadline_secs = deadline.as_secs(), "Inbound request deadline exceeded");
        ApiError::deadline_exceeded(deadline)
    } else {
        tracing::error!(error = %err, "Unhandled middleware error");
        ApiError::internal(err.to_string())
    }
}

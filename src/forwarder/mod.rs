//! Upstream forwarding policy.
//!
//! # Data Flow
//! ```text
//! EncryptRequest (validated usr/p29)
//!     → request.rs (percent-encode onto the configured endpoint)
//!     → GET with JSON headers, bounded by the upstream timeout
//!     → non-2xx?   → ForwardError::UpstreamHttp
//!     → transport? → error.rs classification (timeout / dns / refused / unknown)
//!     → envelope.rs ({code, body, msg} or raw text)
//!     → Ok(body) | Err(ForwardError)
//! ```
//!
//! Every adapter (the axum route, one-shot service invocation, the CLI) goes
//! through [`Forwarder::forward`]; none of them re-implement any of this.

pub mod envelope;
pub mod error;
pub mod request;

use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::config::UpstreamConfig;
use crate::observability::metrics;

pub use error::{classify_transport, ErrorKind, ForwardError, SetupError};
pub use request::{EncryptRequest, Endpoint};

/// Header carrying the correlation ID to the upstream.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Relays encrypt requests to the upstream gateway.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    endpoint: Endpoint,
    timeout: Duration,
}

impl Forwarder {
    /// Build a forwarder from upstream configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, SetupError> {
        let endpoint = Endpoint::new(&config.base_url, &config.encrypt_path)?;
        let timeout = Duration::from_millis(config.timeout_ms);

        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(timeout);
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        tracing::info!(
            endpoint = %endpoint.base(),
            timeout_ms = config.timeout_ms,
            "Forwarder initialized"
        );

        Ok(Self { client, endpoint, timeout })
    }

    /// Forward with the configured timeout.
    pub async fn forward(
        &self,
        request: &EncryptRequest,
        request_id: Option<&str>,
    ) -> Result<String, ForwardError> {
        self.forward_with_timeout(request, request_id, self.timeout).await
    }

    /// Forward with an explicit deadline covering connect, headers and body.
    /// When it elapses the in-flight request is dropped, which closes its
    /// connection.
    pub async fn forward_with_timeout(
        &self,
        request: &EncryptRequest,
        request_id: Option<&str>,
        timeout: Duration,
    ) -> Result<String, ForwardError> {
        let start = Instant::now();
        let url = self.endpoint.url_for(request);
        let log_id = request_id.unwrap_or("-");

        tracing::info!(request_id = %log_id, url = %url, "Forwarding encrypt request");

        let mut builder = self
            .client
            .get(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .timeout(timeout);
        if let Some(id) = request_id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }

        let outcome = self.execute(builder, timeout, log_id).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match &outcome {
            Ok(body) => tracing::info!(
                request_id = %log_id,
                url = %url,
                duration_ms,
                body_len = body.len(),
                outcome = "success",
                "Encrypt request completed"
            ),
            Err(e) => tracing::warn!(
                request_id = %log_id,
                url = %url,
                duration_ms,
                outcome = e.kind().as_str(),
                error = %e,
                "Encrypt request failed"
            ),
        }
        metrics::record_forward(
            outcome.as_ref().map(|_| "success").unwrap_or_else(|e| e.kind().as_str()),
            start,
        );

        outcome
    }

    async fn execute(
        &self,
        builder: reqwest::RequestBuilder,
        timeout: Duration,
        request_id: &str,
    ) -> Result<String, ForwardError> {
        let response = builder
            .send()
            .await
            .map_err(|e| classify_transport(&e, timeout))?;

        let status = response.status();
        tracing::info!(request_id = %request_id, status = status.as_u16(), "Upstream responded");

        if !status.is_success() {
            return Err(ForwardError::UpstreamHttp {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| classify_transport(&e, timeout))?;

        envelope::decode(text)
    }
}

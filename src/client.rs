//! Client for a running relay.
//!
//! This is the programmatic counterpart of the browser form: it validates
//! the two parameters, calls `GET /proxy`, and turns whatever comes back
//! into either the encrypted string or a [`ClientError`] with a readable
//! message.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::forwarder::{classify_transport, EncryptRequest, ForwardError};
use crate::http::ErrorBody;

/// Default request deadline, slightly above the relay's upstream timeout so
/// the relay reports its own timeout first.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid relay URL '{0}'")]
    InvalidUrl(String),

    /// Local validation or transport failure reaching the relay.
    #[error(transparent)]
    Forward(#[from] ForwardError),

    /// The relay answered with an error body.
    #[error("{message}")]
    Relay {
        status: u16,
        kind: String,
        message: String,
    },

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

impl ClientError {
    /// Error kind as reported by the relay, or classified locally.
    pub fn kind(&self) -> String {
        match self {
            ClientError::InvalidUrl(_) | ClientError::Build(_) => "client".to_string(),
            ClientError::Forward(e) => e.kind().as_str().to_string(),
            ClientError::Relay { kind, .. } => kind.clone(),
        }
    }
}

pub struct RelayClient {
    client: reqwest::Client,
    relay_url: Url,
    timeout: Duration,
}

impl RelayClient {
    pub fn new(relay_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(relay_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(relay_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let relay_url = Url::parse(relay_url.trim_end_matches('/'))
            .map_err(|_| ClientError::InvalidUrl(relay_url.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self { client, relay_url, timeout })
    }

    fn url(&self, path: &str) -> Url {
        let mut url = self.relay_url.clone();
        let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url
    }

    /// Encrypt `usr`/`p29` through the relay.
    pub async fn encrypt(&self, usr: &str, p29: &str) -> Result<String, ClientError> {
        let request = EncryptRequest::new(usr, p29)?;

        let mut url = self.url("/proxy");
        url.set_query(Some(&request.query_string()));

        tracing::debug!(url = %url, "Calling relay");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_transport(&e, self.timeout))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| classify_transport(&e, self.timeout))?;

        if status.is_success() {
            return Ok(text);
        }

        Err(match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => ClientError::Relay {
                status: status.as_u16(),
                kind: body.kind,
                message: body.error,
            },
            Err(_) => ClientError::Relay {
                status: status.as_u16(),
                kind: "unknown".to_string(),
                message: format!("relay returned HTTP {}: {}", status.as_u16(), text),
            },
        })
    }

    /// Fetch the relay's `/health` document.
    pub async fn health(&self) -> Result<serde_json::Value, ClientError> {
        let resp = self
            .client
            .get(self.url("/health"))
            .send()
            .await
            .map_err(|e| classify_transport(&e, self.timeout))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Relay {
                status: status.as_u16(),
                kind: "http_error".to_string(),
                message: format!("health check returned HTTP {}", status.as_u16()),
            });
        }

        resp.json()
            .await
            .map_err(|e| ClientError::Forward(classify_transport(&e, self.timeout)))
    }
}

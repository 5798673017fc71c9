//! Configuration validation.
//!
//! Serde handles syntax; this module checks meaning. Every problem found is
//! reported, not just the first, so an operator can fix a file in one pass.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upstream.base_url is not set; choose the gateway explicitly")]
    MissingUpstream,

    #[error("upstream.base_url '{url}' is invalid: {reason}")]
    InvalidUpstreamUrl { url: String, reason: String },

    #[error("upstream.base_url scheme '{0}' is not supported (use http or https)")]
    UnsupportedScheme(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("timeouts.request_secs ({request_ms}ms) must exceed upstream.timeout_ms ({upstream_ms}ms)")]
    DeadlineTooShort { request_ms: u64, upstream_ms: u64 },

    #[error("{field} '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },
}

/// Validate a configuration, returning every error found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let base_url = config.upstream.base_url.trim();
    if base_url.is_empty() {
        errors.push(ValidationError::MissingUpstream);
    } else {
        match Url::parse(base_url) {
            Ok(url) if url.scheme() != "http" && url.scheme() != "https" => {
                errors.push(ValidationError::UnsupportedScheme(url.scheme().to_string()));
            }
            Ok(url) if url.host_str().is_none() => {
                errors.push(ValidationError::InvalidUpstreamUrl {
                    url: base_url.to_string(),
                    reason: "missing host".to_string(),
                });
            }
            Ok(url) if url.query().is_some() || url.fragment().is_some() => {
                errors.push(ValidationError::InvalidUpstreamUrl {
                    url: base_url.to_string(),
                    reason: "must not contain a query or fragment".to_string(),
                });
            }
            Ok(_) => {}
            Err(e) => errors.push(ValidationError::InvalidUpstreamUrl {
                url: base_url.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    if config.upstream.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream.timeout_ms"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    } else if config.timeouts.request_secs.saturating_mul(1000) <= config.upstream.timeout_ms {
        errors.push(ValidationError::DeadlineTooShort {
            request_ms: config.timeouts.request_secs.saturating_mul(1000),
            upstream_ms: config.upstream.timeout_ms,
        });
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

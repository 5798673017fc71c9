//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `upstream.base_url`.
pub const ENV_UPSTREAM_URL: &str = "RELAY_UPSTREAM_URL";
/// Environment variable overriding `listener.bind_address`.
pub const ENV_BIND_ADDRESS: &str = "RELAY_BIND_ADDRESS";
/// Port-only override, applied to the host of `listener.bind_address`.
pub const ENV_PORT: &str = "PORT";
/// Environment variable overriding `observability.log_level`.
pub const ENV_LOG_LEVEL: &str = "RELAY_LOG_LEVEL";
/// Environment variable overriding `observability.log_format`.
pub const ENV_LOG_FORMAT: &str = "RELAY_LOG_FORMAT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {reason}")]
    Env { key: &'static str, reason: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read a TOML file into a configuration without validating it.
pub fn read_config_file(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply overrides from a key lookup (normally the process environment).
pub fn apply_env_overrides<F>(config: &mut RelayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = lookup(ENV_UPSTREAM_URL) {
        config.upstream.base_url = url;
    }
    if let Some(addr) = lookup(ENV_BIND_ADDRESS) {
        config.listener.bind_address = addr;
    } else if let Some(port) = lookup(ENV_PORT) {
        let port: u16 = port.trim().parse().map_err(|e| ConfigError::Env {
            key: ENV_PORT,
            reason: format!("'{}': {}", port, e),
        })?;
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{}:{}", host, port);
    }
    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.observability.log_level = level;
    }
    if let Some(format) = lookup(ENV_LOG_FORMAT) {
        config.observability.log_format = format
            .parse()
            .map_err(|reason| ConfigError::Env { key: ENV_LOG_FORMAT, reason })?;
    }

    Ok(())
}

/// Load configuration: defaults, then the optional file, then the process
/// environment. The result is not yet validated so callers can layer CLI
/// flags on top; call [`finalize`] afterwards.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => RelayConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// Validate a fully assembled configuration.
pub fn finalize(config: RelayConfig) -> Result<RelayConfig, ConfigError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_env_overrides_upstream_and_port() {
        let vars = env(&[(ENV_UPSTREAM_URL, "http://gateway.svc.cluster.local"), (ENV_PORT, "8088")]);
        let mut config = RelayConfig::default();
        apply_env_overrides(&mut config, |k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.upstream.base_url, "http://gateway.svc.cluster.local");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8088");
    }

    #[test]
    fn test_bind_address_wins_over_port() {
        let vars = env(&[(ENV_BIND_ADDRESS, "127.0.0.1:9000"), (ENV_PORT, "8088")]);
        let mut config = RelayConfig::default();
        apply_env_overrides(&mut config, |k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let vars = env(&[(ENV_UPSTREAM_URL, "  ")]);
        let mut config = RelayConfig::default();
        config.upstream.base_url = "https://kept.example.com".into();
        apply_env_overrides(&mut config, |k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.upstream.base_url, "https://kept.example.com");
    }

    #[test]
    fn test_bad_port_rejected() {
        let vars = env(&[(ENV_PORT, "eighty")]);
        let mut config = RelayConfig::default();
        let err = apply_env_overrides(&mut config, |k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Env { key: ENV_PORT, .. }));
    }

    #[test]
    fn test_finalize_reports_validation() {
        let err = finalize(RelayConfig::default()).unwrap_err();
        assert!(err.to_string().contains("upstream.base_url is not set"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → RELAY_* / PORT environment overrides (loader.rs)
//!     → CLI flags (main.rs)
//!     → validation.rs (semantic checks, all errors reported)
//!     → RelayConfig (validated, immutable for the process lifetime)
//! ```
//!
//! # Design Decisions
//! - The upstream base URL has no default; deployments pick it explicitly
//! - All other fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{finalize, load_config, ConfigError};
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, RelayConfig, TimeoutConfig, UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};

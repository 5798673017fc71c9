//! Encrypt relay library.
//!
//! A CORS relay in front of the gateway's `/gateway/user/encrypt` endpoint.
//! [`forwarder`] holds the single forwarding policy; [`http`] and [`client`]
//! are thin adapters around it.

pub mod client;
pub mod config;
pub mod forwarder;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use client::RelayClient;
pub use config::RelayConfig;
pub use forwarder::{EncryptRequest, ForwardError, Forwarder};
pub use http::HttpServer;
pub use lifecycle::Shutdown;

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarder and HTTP handlers produce:
//!     → logging.rs (structured log events: url, status, duration, outcome)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Observability is a side channel; nothing here affects control flow
//! - Request ID flows from the inbound request to the upstream call

pub mod logging;
pub mod metrics;

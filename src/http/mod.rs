//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (assign / keep x-request-id)
//!     → handlers.rs (method dispatch, query parsing)
//!     → forwarder (upstream call)
//!     → response.rs (errors as JSON) + cors.rs (headers on everything)
//!     → Send to client
//! ```

pub mod cors;
pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{ApiError, ErrorBody};
pub use server::{build_router, AppState, HttpServer};

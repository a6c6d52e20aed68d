//! HTTP front end.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace layer, timeout)
//!     → middleware/tenant.rs (org ID, server span, deadline → RequestContext)
//!     → bridge::Bridge::serve (forward over gRPC)
//!     → Send to client
//! ```

pub mod middleware;
pub mod server;

pub use server::{AppState, HttpServer};

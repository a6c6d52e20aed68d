//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!     → tracing.rs (server spans, trace/baggage propagation)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Backends continuing the trace
//! ```

pub mod logging;
pub mod metrics;
pub mod tracing;

pub use self::tracing::TracingHandle;

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Admission, metering, forwarding produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request
//! - Denial reasons are logged and counted, never returned to the client

pub mod logging;
pub mod metrics;

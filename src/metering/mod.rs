//! Metered forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! AdmissionGrant (request extensions)
//!     → meter.rs: ResponseMeter::new (construction fault → forward unmetered)
//!     → downstream handler forwards to upstream
//!     → meter.rs: classify response
//!         passthrough (101, empty body, local upstream failure) → release as is
//!         buffered → read full body → usage counter increment
//!             ok   → original status, headers, bytes
//!             fail → 500 + error_body.rs JSON
//! ```
//!
//! # Design Decisions
//! - Metering correctness over delivery: an uncounted response is never released
//! - Full buffering is bounded by `metering.max_body_bytes`
//! - The increment happens only after the last body byte has been read

pub mod error_body;
pub mod meter;

pub use error_body::ErrorBody;
pub use meter::{DecorationError, MeteringError, MeteringSettings, ResponseMeter, UpstreamFailure};

//! Gatekeeper middleware, outermost first.
//!
//! ```text
//! admission.rs → metering.rs → forward handler
//! ```

pub mod admission;
pub mod metering;

pub use admission::admission_middleware;
pub use metering::{metering_middleware, MeteringState};

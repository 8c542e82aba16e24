//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout)
//!     → middleware/admission.rs (allowlist .. route; 403 on any failure)
//!     → middleware/metering.rs (decorate response with the usage meter)
//!     → server.rs forward handler (stream to upstream)
//!     → metering buffers the body, counts it, releases it
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{build_router, ForwardState, GatewayServer};

//! Admission subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (peer address, method, path, headers):
//!     → allowlist.rs   (source IP membership)
//!     → headers.rs     (accessKey, timestamp, nonceStr, signature, body)
//!     → identity store (access key → secret key)
//!     → signature.rs   (recompute and compare)
//!     → freshness.rs   (timestamp age)
//!     → replay.rs      (atomic nonce claim)
//!     → registry       (path + method → interface id)
//!     → AdmissionGrant handed to metering
//! ```
//!
//! # Design Decisions
//! - Fail closed: collaborator errors deny the request
//! - Every denial is the same bare 403; reasons only reach logs and metrics
//! - Checks run strictly in order so side effects never happen out of turn

pub mod allowlist;
pub mod error;
pub mod freshness;
pub mod headers;
pub mod pipeline;
pub mod replay;
pub mod signature;

pub use allowlist::IpAllowlist;
pub use error::AdmissionError;
pub use freshness::FreshnessWindow;
pub use headers::SignedHeaders;
pub use pipeline::{AdmissionGrant, AdmissionPipeline, AdmissionPolicy, AdmissionRequest};

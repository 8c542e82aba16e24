//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Collaborator call (identity, nonce, registry, usage counter):
//!     → timeouts.rs (enforce per-call deadline)
//!     → On expiry: ServiceError::Timeout, handled like any lookup failure
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries: a failed lookup fails the request closed

pub mod timeouts;

pub use timeouts::with_deadline;

//! External collaborators consumed by the gatekeeper.
//!
//! # Data Flow
//! ```text
//! admission pipeline
//!     → identity.rs   (access key → InvokeUser)
//!     → nonce.rs      (accessKey:nonceStr → replay record)
//!     → registry.rs   (path + method → InterfaceDescriptor)
//! metering
//!     → usage.rs      (interface id + user id → one increment)
//! ```
//!
//! # Design Decisions
//! - Every collaborator is an async trait so remote implementations suspend
//!   the request instead of blocking a runtime worker
//! - In-memory implementations back local runs and tests; they are seeded from
//!   config and hold `DashMap` shard locks only for a single map operation

pub mod collaborators;
pub mod identity;
pub mod nonce;
pub mod registry;
pub mod usage;

pub use collaborators::{Collaborators, InMemoryServices};
pub use identity::{AccountStatus, IdentityStore, InMemoryIdentityStore, InvokeUser};
pub use nonce::{InMemoryNonceStore, NonceStore};
pub use registry::{InMemoryInterfaceRegistry, InterfaceDescriptor, InterfaceLookup, InterfaceRegistry};
pub use usage::{InMemoryUsageCounter, UsageCounter, UsageEvent};

/// Failure of a collaborator call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The collaborator could not be reached or answered with an error.
    #[error("service unavailable: {0}")]
    Unavailable(String),
    /// The call did not complete before its deadline.
    #[error("call timed out after {0} ms")]
    Timeout(u64),
    /// The caller has no invocations left on this interface.
    #[error("no invocations left for user {user_id} on interface {interface_id}")]
    QuotaExhausted { interface_id: u64, user_id: u64 },
    /// The caller was never granted access to this interface.
    #[error("user {user_id} holds no grant on interface {interface_id}")]
    NotGranted { interface_id: u64, user_id: u64 },
}

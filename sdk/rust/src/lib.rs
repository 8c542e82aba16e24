//! Caller-side SDK for the gatekeeper API gateway.
//!
//! - [`sign`] holds the signing primitive the gateway verifies against.
//! - [`client`] wraps `reqwest` and attaches the signed headers to every call.

pub mod client;
pub mod sign;

pub use client::{Credentials, GatekeeperClient, GatewayError, SignedHeaders};

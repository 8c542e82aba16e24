//! Gatekeeper: a signed-request admission filter and usage meter for a
//! single upstream interface service.

// Request path
pub mod auth;
pub mod http;
pub mod metering;

// Collaborators
pub mod services;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → borrowed by startup; each subsystem copies out its own settings
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the allowlist is never mutated at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    GatewayConfig, GrantSeed, InterfaceSeed, ListenerConfig, MeteringConfig, ObservabilityConfig,
    SecurityConfig, SeedConfig, TimeoutConfig, UpstreamConfig, UserSeed,
};

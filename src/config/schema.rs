//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single downstream service requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// Admission pipeline settings.
    pub security: SecurityConfig,

    /// Response metering settings.
    pub metering: MeteringConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Records loaded into the in-memory collaborators at startup.
    pub seed: SeedConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8090").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8090".to_string(),
        }
    }
}

/// Upstream (mock interface service) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream `host:port` (e.g., "127.0.0.1:8123" or "localhost:8123").
    /// Hostnames are resolved per connection by the forwarding client.
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8123".to_string(),
        }
    }
}

/// Admission pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Source IPs allowed to reach the gateway at all.
    pub ip_allowlist: Vec<String>,

    /// Maximum age of a request timestamp in seconds.
    pub max_timestamp_age_secs: u64,

    /// Maximum distance into the future a timestamp may lie.
    /// Unset keeps the check one-sided.
    pub max_future_skew_secs: Option<u64>,

    /// Lifetime of a nonce record.
    pub nonce_ttl_secs: u64,

    /// Interval at which expired nonce records are swept.
    pub nonce_sweep_interval_secs: u64,

    /// Deadline for each identity, nonce, and registry lookup.
    pub lookup_timeout_ms: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            ip_allowlist: vec!["127.0.0.1".to_string()],
            max_timestamp_age_secs: 300,
            max_future_skew_secs: None,
            nonce_ttl_secs: 300,
            nonce_sweep_interval_secs: 60,
            lookup_timeout_ms: 2000,
        }
    }
}

/// Response metering configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MeteringConfig {
    /// Largest upstream body that will be buffered for metering.
    pub max_body_bytes: usize,

    /// Deadline for the usage counter call.
    pub counter_timeout_ms: u64,

    /// Message placed in the error body when metering fails.
    pub error_message: String,
}

impl Default for MeteringConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            counter_timeout_ms: 2000,
            error_message: "invocation quota exhausted or usage could not be recorded".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Seed data for the in-memory identity store, registry, and usage counter.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SeedConfig {
    pub users: Vec<UserSeed>,
    pub interfaces: Vec<InterfaceSeed>,
    pub grants: Vec<GrantSeed>,
}

/// A caller account.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserSeed {
    pub id: u64,
    pub access_key: String,
    pub secret_key: String,
    #[serde(default)]
    pub banned: bool,
}

/// A billable mock interface.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InterfaceSeed {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub method: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Invocation budget of one user on one interface.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GrantSeed {
    pub interface_id: u64,
    pub user_id: u64,
    pub left: u64,
}

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, value ranges, and the allowlist
//! - Check seed data for duplicate keys
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};

use axum::http::uri::Authority;
use axum::http::Method;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new("listener.bind_address", "not a socket address"));
    }
    let upstream_ok = config
        .upstream
        .address
        .parse::<Authority>()
        .map(|authority| authority.port_u16().is_some())
        .unwrap_or(false);
    if !upstream_ok {
        errors.push(ValidationError::new("upstream.address", "expected host:port"));
    }

    let security = &config.security;
    if security.ip_allowlist.is_empty() {
        errors.push(ValidationError::new(
            "security.ip_allowlist",
            "empty allowlist rejects every request",
        ));
    }
    for (i, ip) in security.ip_allowlist.iter().enumerate() {
        if ip.parse::<IpAddr>().is_err() {
            errors.push(ValidationError::new(
                format!("security.ip_allowlist[{}]", i),
                format!("'{}' is not an IP address", ip),
            ));
        }
    }
    // A nonce that expires while its timestamp is still fresh can be replayed.
    if security.nonce_ttl_secs < security.max_timestamp_age_secs {
        errors.push(ValidationError::new(
            "security.nonce_ttl_secs",
            "must be at least max_timestamp_age_secs",
        ));
    }
    if security.lookup_timeout_ms == 0 {
        errors.push(ValidationError::new("security.lookup_timeout_ms", "must be > 0"));
    }
    if security.nonce_sweep_interval_secs == 0 {
        errors.push(ValidationError::new("security.nonce_sweep_interval_secs", "must be > 0"));
    }

    if config.metering.max_body_bytes == 0 {
        errors.push(ValidationError::new("metering.max_body_bytes", "must be > 0"));
    }
    if config.metering.counter_timeout_ms == 0 {
        errors.push(ValidationError::new("metering.counter_timeout_ms", "must be > 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    let mut access_keys = HashSet::new();
    for user in &config.seed.users {
        if !access_keys.insert(user.access_key.as_str()) {
            errors.push(ValidationError::new(
                "seed.users",
                format!("duplicate access key '{}'", user.access_key),
            ));
        }
    }
    let mut interface_ids = HashSet::new();
    for iface in &config.seed.interfaces {
        if !interface_ids.insert(iface.id) {
            errors.push(ValidationError::new(
                "seed.interfaces",
                format!("duplicate interface id {}", iface.id),
            ));
        }
        if iface.method.to_uppercase().parse::<Method>().is_err() {
            errors.push(ValidationError::new(
                "seed.interfaces",
                format!("interface {} has invalid method '{}'", iface.id, iface.method),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! The ordered admission pipeline.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, Method};

use crate::auth::allowlist::IpAllowlist;
use crate::auth::error::AdmissionError;
use crate::auth::freshness::{now_secs, FreshnessWindow};
use crate::auth::headers::SignedHeaders;
use crate::auth::replay::claim_nonce;
use crate::auth::signature::verify_signature;
use crate::config::SecurityConfig;
use crate::resilience::with_deadline;
use crate::services::{AccountStatus, IdentityStore, InterfaceLookup, InterfaceRegistry, NonceStore};

/// Proof that a request passed admission, carried to metering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionGrant {
    pub interface_id: u64,
    pub user_id: u64,
    pub access_key: String,
}

/// Tunables of the pipeline, derived from [`SecurityConfig`].
#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    pub allowlist: IpAllowlist,
    pub freshness: FreshnessWindow,
    pub nonce_ttl: Duration,
    pub lookup_timeout: Duration,
}

impl AdmissionPolicy {
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self {
            allowlist: IpAllowlist::from_strings(&config.ip_allowlist),
            freshness: FreshnessWindow {
                max_age_secs: config.max_timestamp_age_secs,
                max_future_skew_secs: config.max_future_skew_secs,
            },
            nonce_ttl: Duration::from_secs(config.nonce_ttl_secs),
            lookup_timeout: Duration::from_millis(config.lookup_timeout_ms),
        }
    }
}

/// What the pipeline needs to know about a request.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionRequest<'a> {
    pub source: IpAddr,
    pub method: &'a Method,
    pub path: &'a str,
    pub headers: &'a HeaderMap,
}

/// Runs the admission checks in order; the first failure wins.
///
/// Steps: allowlist, header extraction, identity, signature, freshness,
/// replay, route resolution. Only the replay step writes anything, so a
/// request rejected earlier leaves no trace in the nonce cache.
pub struct AdmissionPipeline {
    policy: AdmissionPolicy,
    identity: Arc<dyn IdentityStore>,
    nonces: Arc<dyn NonceStore>,
    registry: Arc<dyn InterfaceRegistry>,
}

impl AdmissionPipeline {
    pub fn new(
        policy: AdmissionPolicy,
        identity: Arc<dyn IdentityStore>,
        nonces: Arc<dyn NonceStore>,
        registry: Arc<dyn InterfaceRegistry>,
    ) -> Self {
        Self {
            policy,
            identity,
            nonces,
            registry,
        }
    }

    pub async fn admit(&self, request: AdmissionRequest<'_>) -> Result<AdmissionGrant, AdmissionError> {
        self.admit_at(request, now_secs()).await
    }

    /// [`Self::admit`] with an explicit clock.
    pub async fn admit_at(&self, request: AdmissionRequest<'_>, now_secs: u64) -> Result<AdmissionGrant, AdmissionError> {
        let deadline = self.policy.lookup_timeout;

        // 1. Allowlist
        if !self.policy.allowlist.contains(request.source) {
            return Err(AdmissionError::SourceNotAllowed(request.source));
        }

        // 2. Headers
        let signed = SignedHeaders::extract(request.headers)?;

        // 3. Identity
        let user = with_deadline(deadline, self.identity.resolve_user(&signed.access_key))
            .await
            .map_err(AdmissionError::unavailable("identity store"))?
            .ok_or(AdmissionError::UnknownAccessKey)?;
        if user.status == AccountStatus::Banned {
            return Err(AdmissionError::AccountBanned(user.id));
        }

        // 4. Signature
        verify_signature(&signed, &user.secret_key)?;

        // 5. Freshness
        self.policy.freshness.check(&signed.timestamp, now_secs)?;

        // 6. Replay
        claim_nonce(
            self.nonces.as_ref(),
            &signed.access_key,
            &signed.nonce,
            self.policy.nonce_ttl,
            deadline,
        )
        .await?;

        // 7. Route
        let lookup = with_deadline(deadline, self.registry.resolve_interface(request.path, request.method))
            .await
            .map_err(AdmissionError::unavailable("interface registry"))?;
        let interface = match lookup {
            InterfaceLookup::Found(descriptor) => descriptor,
            InterfaceLookup::MethodMismatch { .. } | InterfaceLookup::NotFound => {
                return Err(AdmissionError::UnknownInterface {
                    method: request.method.clone(),
                    path: request.path.to_string(),
                });
            }
        };
        if !interface.enabled {
            return Err(AdmissionError::InterfaceDisabled(interface.id));
        }

        Ok(AdmissionGrant {
            interface_id: interface.id,
            user_id: user.id,
            access_key: signed.access_key,
        })
    }
}

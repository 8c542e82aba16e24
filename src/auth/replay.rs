//! Replay protection.

use std::time::Duration;

use crate::auth::error::AdmissionError;
use crate::resilience::with_deadline;
use crate::services::NonceStore;

/// Cache key of a nonce record.
pub fn nonce_key(access_key: &str, nonce: &str) -> String {
    format!("{}:{}", access_key, nonce)
}

/// Claim `(access_key, nonce)` for `ttl`. A second claim while the first
/// record is live is a replay.
pub async fn claim_nonce(
    store: &dyn NonceStore,
    access_key: &str,
    nonce: &str,
    ttl: Duration,
    deadline: Duration,
) -> Result<(), AdmissionError> {
    let key = nonce_key(access_key, nonce);
    let created = with_deadline(deadline, store.insert_if_absent(&key, nonce, ttl))
        .await
        .map_err(AdmissionError::unavailable("nonce cache"))?;
    if created {
        Ok(())
    } else {
        Err(AdmissionError::Replayed)
    }
}

//! Request timestamp freshness.

use std::time::{SystemTime, UNIX_EPOCH};

use gatekeeper_sdk::sign::TIMESTAMP;

use crate::auth::error::AdmissionError;

/// Accepted timestamp window relative to the gateway clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessWindow {
    /// A request older than this many seconds is stale (strict `>`).
    pub max_age_secs: u64,
    /// `None` accepts any future timestamp.
    pub max_future_skew_secs: Option<u64>,
}

impl FreshnessWindow {
    /// Check a raw header value against `now_secs`.
    pub fn check(&self, timestamp: &str, now_secs: u64) -> Result<(), AdmissionError> {
        let sent = timestamp
            .trim()
            .parse::<u64>()
            .map_err(|e| AdmissionError::MalformedHeader {
                header: TIMESTAMP,
                reason: e.to_string(),
            })?;

        if now_secs >= sent {
            let age_secs = now_secs - sent;
            if age_secs > self.max_age_secs {
                return Err(AdmissionError::Expired {
                    age_secs,
                    max_age_secs: self.max_age_secs,
                });
            }
        } else if let Some(max_skew_secs) = self.max_future_skew_secs {
            let ahead_secs = sent - now_secs;
            if ahead_secs > max_skew_secs {
                return Err(AdmissionError::FromTheFuture {
                    ahead_secs,
                    max_skew_secs,
                });
            }
        }
        Ok(())
    }
}

/// Current unix time in seconds.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

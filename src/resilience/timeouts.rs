//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap collaborator calls with a deadline
//! - Map expiry onto the collaborator error type
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - An expired lookup is indistinguishable from a failed one to callers

use std::future::Future;
use std::time::Duration;

use crate::services::ServiceError;

/// Run `call`, failing with [`ServiceError::Timeout`] once `deadline` passes.
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(ServiceError::Timeout(
            u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
        )),
    }
}

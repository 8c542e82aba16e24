//! Response decoration: buffer, count, then release.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, HttpBody};
use axum::http::header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING};
use axum::http::response::Parts;
use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Json, Response};

use crate::auth::AdmissionGrant;
use crate::config::MeteringConfig;
use crate::metering::error_body::ErrorBody;
use crate::observability::metrics;
use crate::resilience::with_deadline;
use crate::services::{ServiceError, UsageCounter, UsageEvent};

/// Headers that describe the original body and must not survive a substitution.
const BODY_HEADERS: [HeaderName; 4] = [CONTENT_LENGTH, TRANSFER_ENCODING, CONTENT_ENCODING, CONTENT_TYPE];

/// Marks a response the gateway produced itself because the upstream could
/// not be reached. Such responses are never metered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamFailure;

/// Metering tunables, derived from [`MeteringConfig`].
#[derive(Debug, Clone)]
pub struct MeteringSettings {
    pub max_body_bytes: usize,
    pub counter_timeout: Duration,
    pub error_message: String,
}

impl MeteringSettings {
    pub fn from_config(config: &MeteringConfig) -> Self {
        Self {
            max_body_bytes: config.max_body_bytes,
            counter_timeout: Duration::from_millis(config.counter_timeout_ms),
            error_message: config.error_message.clone(),
        }
    }
}

/// Failure to build a [`ResponseMeter`]. Recovered by forwarding unmetered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecorationError {
    #[error("request carries no admission grant")]
    MissingGrant,
    #[error("response buffer limit is zero")]
    ZeroBufferLimit,
}

/// Failure while metering a response that was already decorated.
#[derive(Debug, thiserror::Error)]
pub enum MeteringError {
    #[error("failed to buffer upstream body: {0}")]
    Body(#[source] axum::Error),
    #[error("usage counter rejected increment: {0}")]
    Counter(#[source] ServiceError),
}

/// How a response is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    /// Has a body to buffer and meter.
    Buffered,
    /// Released untouched and unmetered.
    Passthrough,
}

fn classify(response: &Response) -> BodyKind {
    if response.status() == StatusCode::SWITCHING_PROTOCOLS
        || response.extensions().get::<UpstreamFailure>().is_some()
        || response.body().is_end_stream()
    {
        BodyKind::Passthrough
    } else {
        BodyKind::Buffered
    }
}

/// Wraps one forwarded response so that exactly one usage event is recorded
/// once its body has been read in full.
///
/// The body is released only after the increment settles: unchanged on
/// success, replaced by a 500 [`ErrorBody`] on failure. The whole body is held
/// in memory, bounded by `max_body_bytes`.
pub struct ResponseMeter {
    event: UsageEvent,
    counter: Arc<dyn UsageCounter>,
    settings: MeteringSettings,
}

impl ResponseMeter {
    pub fn new(
        grant: Option<&AdmissionGrant>,
        counter: Arc<dyn UsageCounter>,
        settings: &MeteringSettings,
    ) -> Result<Self, DecorationError> {
        let grant = grant.ok_or(DecorationError::MissingGrant)?;
        if settings.max_body_bytes == 0 {
            return Err(DecorationError::ZeroBufferLimit);
        }
        Ok(Self {
            event: UsageEvent {
                interface_id: grant.interface_id,
                user_id: grant.user_id,
            },
            counter,
            settings: settings.clone(),
        })
    }

    pub async fn apply(self, response: Response) -> Response {
        if classify(&response) == BodyKind::Passthrough {
            tracing::debug!(status = %response.status(), "Response passed through unmetered");
            return response;
        }

        let (parts, body) = response.into_parts();
        // If the client goes away, this future is dropped here and no
        // increment is submitted.
        let bytes = match axum::body::to_bytes(body, self.settings.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let err = MeteringError::Body(e);
                tracing::warn!(
                    interface_id = self.event.interface_id,
                    user_id = self.event.user_id,
                    limit = self.settings.max_body_bytes,
                    error = %err,
                    "Upstream body could not be buffered"
                );
                metrics::record_usage_event("buffer_failed");
                return substitute(parts, StatusCode::BAD_GATEWAY, "upstream response could not be buffered");
            }
        };

        match with_deadline(self.settings.counter_timeout, self.counter.increment(self.event)).await {
            Ok(()) => {
                tracing::info!(
                    interface_id = self.event.interface_id,
                    user_id = self.event.user_id,
                    status = %parts.status,
                    bytes = bytes.len(),
                    "Invocation recorded"
                );
                metrics::record_usage_event("recorded");
                Response::from_parts(parts, Body::from(bytes))
            }
            Err(e) => {
                let err = MeteringError::Counter(e);
                tracing::error!(
                    interface_id = self.event.interface_id,
                    user_id = self.event.user_id,
                    error = %err,
                    "Usage increment failed, withholding upstream response"
                );
                metrics::record_usage_event("counter_failed");
                drop(bytes);
                substitute(parts, StatusCode::INTERNAL_SERVER_ERROR, &self.settings.error_message)
            }
        }
    }
}

/// Replace the body with an [`ErrorBody`], keeping unrelated upstream headers.
fn substitute(parts: Parts, status: StatusCode, message: &str) -> Response {
    let mut response = (status, Json(ErrorBody::new(status, message))).into_response();
    for (name, value) in parts.headers.iter() {
        if !BODY_HEADERS.contains(name) {
            response.headers_mut().append(name.clone(), value.clone());
        }
    }
    response
}

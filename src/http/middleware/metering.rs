//! Metering middleware.
//! Decorates the downstream response so each admitted call is counted once.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::AdmissionGrant;
use crate::http::request::request_id;
use crate::metering::{MeteringSettings, ResponseMeter};
use crate::observability::metrics;
use crate::services::UsageCounter;

/// State required for metering.
#[derive(Clone)]
pub struct MeteringState {
    pub counter: Arc<dyn UsageCounter>,
    pub settings: MeteringSettings,
}

pub async fn metering_middleware(
    State(state): State<MeteringState>,
    request: Request,
    next: Next,
) -> Response {
    let meter = ResponseMeter::new(
        request.extensions().get::<AdmissionGrant>(),
        state.counter.clone(),
        &state.settings,
    );

    match meter {
        Ok(meter) => meter.apply(next.run(request).await).await,
        Err(e) => {
            tracing::error!(
                request_id = %request_id(request.headers()),
                error = %e,
                "Failed to decorate response, forwarding unmetered"
            );
            metrics::record_decoration_fault();
            next.run(request).await
        }
    }
}

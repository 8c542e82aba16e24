//! Admission middleware.
//! Runs the admission pipeline and attaches the grant for metering.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{AdmissionPipeline, AdmissionRequest};
use crate::http::request::request_id;
use crate::observability::metrics;

pub async fn admission_middleware(
    State(pipeline): State<Arc<AdmissionPipeline>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    // Split so only `Parts` (which is Sync) is borrowed across the lookups.
    let (mut parts, body) = request.into_parts();
    let request_id = request_id(&parts.headers);

    tracing::info!(
        request_id = %request_id,
        method = %parts.method,
        path = %parts.uri.path(),
        query = parts.uri.query().unwrap_or(""),
        source = %peer,
        "Gateway request"
    );

    let outcome = pipeline
        .admit(AdmissionRequest {
            source: peer.ip(),
            method: &parts.method,
            path: parts.uri.path(),
            headers: &parts.headers,
        })
        .await;

    match outcome {
        Ok(grant) => {
            tracing::debug!(
                request_id = %request_id,
                access_key = %grant.access_key,
                interface_id = grant.interface_id,
                user_id = grant.user_id,
                "Request admitted"
            );
            parts.extensions.insert(grant);
            next.run(Request::from_parts(parts, body)).await
        }
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                source = %peer,
                reason = e.reason(),
                error = %e,
                "Request denied"
            );
            metrics::record_rejection(e.reason());
            e.into_response()
        }
    }
}

//! HTTP server setup and forwarding.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all forward handler
//! - Wire up middleware (request ID, tracing, timeout, admission, metering)
//! - Forward admitted requests to the upstream interface service
//! - Serve until the shutdown channel fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode, Uri},
    middleware::{self as axum_middleware, Next},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::{AdmissionPipeline, AdmissionPolicy};
use crate::config::GatewayConfig;
use crate::http::middleware::{admission_middleware, metering_middleware, MeteringState};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::metering::{MeteringSettings, UpstreamFailure};
use crate::observability::metrics;
use crate::services::Collaborators;

/// State injected into the forward handler.
#[derive(Clone)]
pub struct ForwardState {
    pub client: Client<HttpConnector, Body>,
    pub upstream: String,
}

impl ForwardState {
    pub fn new(upstream: impl Into<String>) -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build(HttpConnector::new()),
            upstream: upstream.into(),
        }
    }
}

/// Gatekeeper HTTP server.
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    pub fn new(config: &GatewayConfig, collaborators: Collaborators) -> Self {
        Self {
            router: build_router(config, collaborators),
        }
    }

    /// Accept connections until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gateway server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Gateway server draining");
            })
            .await?;

        tracing::info!("Gateway server stopped");
        Ok(())
    }
}

/// Build the router. Outermost layer first: request ID, trace, request ID
/// propagation, timeout, request metrics, admission, metering, forward.
#[allow(deprecated)]
pub fn build_router(config: &GatewayConfig, collaborators: Collaborators) -> Router {
    let pipeline = Arc::new(AdmissionPipeline::new(
        AdmissionPolicy::from_config(&config.security),
        collaborators.identity,
        collaborators.nonces,
        collaborators.registry,
    ));
    let metering = MeteringState {
        counter: collaborators.usage,
        settings: MeteringSettings::from_config(&config.metering),
    };
    let forward = ForwardState::new(config.upstream.address.clone());

    Router::new()
        .route("/{*path}", any(forward_handler))
        .route("/", any(forward_handler))
        .with_state(forward)
        .layer(axum_middleware::from_fn_with_state(metering, metering_middleware))
        .layer(axum_middleware::from_fn_with_state(pipeline, admission_middleware))
        .layer(axum_middleware::from_fn(track_requests))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
}

async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let response = next.run(request).await;
    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

/// Forward the request to the upstream, streaming both bodies.
async fn forward_handler(State(state): State<ForwardState>, request: Request) -> Response {
    let request_id = request_id(request.headers());
    let (parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let uri = match format!("http://{}{}", state.upstream, path_and_query).parse::<Uri>() {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream URI");
            return upstream_failure();
        }
    };

    let mut upstream_request = axum::http::Request::new(body);
    *upstream_request.method_mut() = parts.method.clone();
    *upstream_request.uri_mut() = uri;
    let headers = upstream_request.headers_mut();
    for (name, value) in parts.headers.iter() {
        if *name != header::HOST {
            headers.append(name.clone(), value.clone());
        }
    }
    if let Ok(host) = HeaderValue::from_str(&state.upstream) {
        headers.insert(header::HOST, host);
    }

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        upstream = %state.upstream,
        path = %path_and_query,
        "Forwarding request"
    );

    match state.client.request(upstream_request).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                upstream = %state.upstream,
                error = %e,
                "Upstream error"
            );
            upstream_failure()
        }
    }
}

fn upstream_failure() -> Response {
    let mut response = (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
    response.extensions_mut().insert(UpstreamFailure);
    response
}

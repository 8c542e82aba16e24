//! End-to-end tests: signed requests through the full router to a live
//! mock backend.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use gatekeeper::config::{GatewayConfig, GrantSeed, InterfaceSeed, UserSeed};
use gatekeeper::http::build_router;
use gatekeeper::metering::ErrorBody;
use gatekeeper::services::{Collaborators, InMemoryServices, ServiceError, UsageCounter, UsageEvent};
use gatekeeper_sdk::{Credentials, SignedHeaders};

mod common;

const USER_ID: u64 = 1;
const INTERFACE_ID: u64 = 1;

fn allowed_peer() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 50000))
}

fn credentials() -> Credentials {
    Credentials {
        access_key: "testAccessKey".into(),
        secret_key: "testSecretKey".into(),
    }
}

fn config(upstream: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.upstream.address = upstream.to_string();
    config.seed.users = vec![
        UserSeed {
            id: USER_ID,
            access_key: "testAccessKey".into(),
            secret_key: "testSecretKey".into(),
            banned: false,
        },
        UserSeed {
            id: 2,
            access_key: "bannedAccessKey".into(),
            secret_key: "bannedSecretKey".into(),
            banned: true,
        },
    ];
    config.seed.interfaces = vec![
        InterfaceSeed {
            id: INTERFACE_ID,
            name: "getName".into(),
            path: "/api/name".into(),
            method: "GET".into(),
            enabled: true,
        },
        InterfaceSeed {
            id: 2,
            name: "postName".into(),
            path: "/api/name/user".into(),
            method: "POST".into(),
            enabled: true,
        },
    ];
    config.seed.grants = vec![
        GrantSeed {
            interface_id: INTERFACE_ID,
            user_id: USER_ID,
            left: 10,
        },
        GrantSeed {
            interface_id: 2,
            user_id: USER_ID,
            left: 10,
        },
    ];
    config
}

fn app(config: &GatewayConfig, collaborators: Collaborators, peer: SocketAddr) -> Router {
    build_router(config, collaborators).layer(MockConnectInfo(peer))
}

fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}

fn signed(
    creds: &Credentials,
    method: &str,
    uri: &str,
    body: Option<&str>,
    nonce: &str,
) -> Request<Body> {
    let headers = SignedHeaders::with_parts(creds, body, &now_secs().to_string(), nonce);
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("accessKey", &headers.access_key)
        .header("timestamp", &headers.timestamp)
        .header("nonceStr", &headers.nonce)
        .header("signature", &headers.signature);
    if let Some(encoded) = &headers.encoded_body {
        builder = builder.header("body", encoded).header("content-type", "application/json");
    }
    builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

#[tokio::test]
async fn test_signed_request_is_forwarded_and_counted_once() {
    let backend = common::start_mock_backend("GET your name is yupi").await;
    let config = config(backend.addr);
    let services = InMemoryServices::from_seed(&config.seed);
    let app = app(&config, services.collaborators(), allowed_peer());

    let response = app
        .oneshot(signed(&credentials(), "GET", "/api/name?name=yupi", None, "nonce-e2e"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_bytes(response).await, b"GET your name is yupi");
    assert_eq!(backend.hits(), 1);
    let grant = services.usage.get(INTERFACE_ID, USER_ID).unwrap();
    assert_eq!(grant.total, 1);
    assert_eq!(grant.left, 9);
}

#[tokio::test]
async fn test_signed_body_is_forwarded() {
    let backend = common::start_mock_backend("POST your username is yupi").await;
    let config = config(backend.addr);
    let services = InMemoryServices::from_seed(&config.seed);
    let app = app(&config, services.collaborators(), allowed_peer());

    let response = app
        .oneshot(signed(
            &credentials(),
            "POST",
            "/api/name/user",
            Some(r#"{"username":"yupi"}"#),
            "nonce-post",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"POST your username is yupi");
    assert_eq!(services.usage.get(2, USER_ID).unwrap().total, 1);
}

#[tokio::test]
async fn test_replayed_nonce_is_rejected_without_extra_increment() {
    let backend = common::start_mock_backend("ok").await;
    let config = config(backend.addr);
    let services = InMemoryServices::from_seed(&config.seed);
    let app = app(&config, services.collaborators(), allowed_peer());

    let first = app
        .clone()
        .oneshot(signed(&credentials(), "GET", "/api/name", None, "nonce-replay"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let _ = body_bytes(first).await;

    let replay = app
        .oneshot(signed(&credentials(), "GET", "/api/name", None, "nonce-replay"))
        .await
        .unwrap();
    assert_eq!(replay.status(), StatusCode::FORBIDDEN);
    assert!(body_bytes(replay).await.is_empty());

    assert_eq!(backend.hits(), 1);
    assert_eq!(services.usage.get(INTERFACE_ID, USER_ID).unwrap().total, 1);
}

#[tokio::test]
async fn test_nonce_is_accepted_again_after_ttl() {
    let backend = common::start_mock_backend("ok").await;
    let mut config = config(backend.addr);
    config.security.nonce_ttl_secs = 1;
    let services = InMemoryServices::from_seed(&config.seed);
    let app = app(&config, services.collaborators(), allowed_peer());

    let first = app
        .clone()
        .oneshot(signed(&credentials(), "GET", "/api/name", None, "nonce-ttl"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(1200)).await;

    let again = app
        .oneshot(signed(&credentials(), "GET", "/api/name", None, "nonce-ttl"))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::OK);
    assert_eq!(backend.hits(), 2);
}

#[tokio::test]
async fn test_source_outside_allowlist_is_rejected() {
    let backend = common::start_mock_backend("ok").await;
    let config = config(backend.addr);
    let services = InMemoryServices::from_seed(&config.seed);
    let app = app(
        &config,
        services.collaborators(),
        SocketAddr::from(([10, 0, 0, 9], 50000)),
    );

    let response = app
        .oneshot(signed(&credentials(), "GET", "/api/name", None, "nonce-ip"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(backend.hits(), 0);
    assert!(services.nonces.is_empty());
}

#[tokio::test]
async fn test_rejections_never_reach_the_backend() {
    let backend = common::start_mock_backend("ok").await;
    let config = config(backend.addr);
    let services = InMemoryServices::from_seed(&config.seed);
    let app = app(&config, services.collaborators(), allowed_peer());

    let unsigned = Request::builder().uri("/api/name").body(Body::empty()).unwrap();
    let wrong_secret = Credentials {
        access_key: "testAccessKey".into(),
        secret_key: "wrongSecretKey".into(),
    };
    let banned = Credentials {
        access_key: "bannedAccessKey".into(),
        secret_key: "bannedSecretKey".into(),
    };
    let requests = vec![
        unsigned,
        signed(&wrong_secret, "GET", "/api/name", None, "nonce-a"),
        signed(&banned, "GET", "/api/name", None, "nonce-b"),
        signed(&credentials(), "GET", "/api/unknown", None, "nonce-c"),
        signed(&credentials(), "DELETE", "/api/name", None, "nonce-d"),
    ];

    for request in requests {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
    assert_eq!(backend.hits(), 0);
    assert_eq!(services.usage.get(INTERFACE_ID, USER_ID).unwrap().total, 0);
}

struct FailingCounter {
    calls: AtomicUsize,
}

#[async_trait]
impl UsageCounter for FailingCounter {
    async fn increment(&self, _event: UsageEvent) -> Result<(), ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ServiceError::Unavailable("counter offline".into()))
    }
}

#[tokio::test]
async fn test_counter_failure_withholds_backend_body() {
    let backend = common::start_mock_backend("confidential payload").await;
    let config = config(backend.addr);
    let services = InMemoryServices::from_seed(&config.seed);
    let counter = Arc::new(FailingCounter {
        calls: AtomicUsize::new(0),
    });
    let mut collaborators = services.collaborators();
    collaborators.usage = counter.clone();
    let app = app(&config, collaborators, allowed_peer());

    let response = app
        .oneshot(signed(&credentials(), "GET", "/api/name", None, "nonce-fail"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()["content-type"], "application/json");
    let body = body_bytes(response).await;
    assert!(!String::from_utf8_lossy(&body).contains("confidential payload"));
    let error: ErrorBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.code, 500);
    assert_eq!(error.message, config.metering.error_message);
    assert_eq!(backend.hits(), 1);
    assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_exhausted_quota_surfaces_as_metering_failure() {
    let backend = common::start_mock_backend("ok").await;
    let mut config = config(backend.addr);
    config.seed.grants[0].left = 0;
    let services = InMemoryServices::from_seed(&config.seed);
    let app = app(&config, services.collaborators(), allowed_peer());

    let response = app
        .oneshot(signed(&credentials(), "GET", "/api/name", None, "nonce-quota"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(backend.hits(), 1);
}

#[tokio::test]
async fn test_upstream_error_status_is_metered_and_released() {
    let backend = common::start_programmable_backend(|| async { (404, "no such name".to_string()) }).await;
    let config = config(backend.addr);
    let services = InMemoryServices::from_seed(&config.seed);
    let app = app(&config, services.collaborators(), allowed_peer());

    let response = app
        .oneshot(signed(&credentials(), "GET", "/api/name", None, "nonce-404"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_bytes(response).await, b"no such name");
    assert_eq!(services.usage.get(INTERFACE_ID, USER_ID).unwrap().total, 1);
}

#[tokio::test]
async fn test_unreachable_upstream_is_not_metered() {
    let config = config(common::unused_addr().await);
    let services = InMemoryServices::from_seed(&config.seed);
    let app = app(&config, services.collaborators(), allowed_peer());

    let response = app
        .oneshot(signed(&credentials(), "GET", "/api/name", None, "nonce-down"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(services.usage.get(INTERFACE_ID, USER_ID).unwrap().total, 0);
}

#[tokio::test]
async fn test_client_gone_mid_body_records_no_usage() {
    let backend = common::start_stalling_backend("first twenty bytes..").await;
    let config = config(backend.addr);
    let services = InMemoryServices::from_seed(&config.seed);
    let app = app(&config, services.collaborators(), allowed_peer());

    let pending = app.oneshot(signed(&credentials(), "GET", "/api/name", None, "nonce-gone"));
    assert!(tokio::time::timeout(Duration::from_millis(500), pending).await.is_err());

    // Give any stray task a chance to run before checking.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(backend.hits(), 1);
    let grant = services.usage.get(INTERFACE_ID, USER_ID).unwrap();
    assert_eq!(grant.total, 0);
    assert_eq!(grant.left, 10);
}

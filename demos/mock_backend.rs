//! Pretend interface service for local runs behind the gateway.
//!
//! Pair with a config whose `upstream.address` is `127.0.0.1:8123` and whose
//! seed registers `GET /api/name` and `POST /api/name/user`.

use axum::{extract::Query, routing::{get, post}, Json, Router};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;

#[derive(Deserialize)]
struct User {
    username: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let app = Router::new()
        .route(
            "/api/name",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                format!("GET your name is {}", params.get("name").map(String::as_str).unwrap_or("anonymous"))
            }),
        )
        .route(
            "/api/name/user",
            post(|Json(user): Json<User>| async move { format!("POST your username is {}", user.username) }),
        );

    let addr = SocketAddr::from(([127, 0, 0, 1], 8123));
    println!("Mock interface service listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

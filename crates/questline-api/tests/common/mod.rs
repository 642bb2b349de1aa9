//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use questline_store::StoreConfig;
use questline_store::memory::MemoryStore;
use questline_store::pg::PgStore;
use questline_test_support::{FixedClock, fixed_now};
use sqlx::PgPool;
use tower::ServiceExt;

use questline_api::routes;
use questline_api::state::AppState;

/// Build the full app router over `store` with a fixed clock. Uses the same
/// route structure as `main.rs`.
pub fn build_test_app(store: &MemoryStore) -> Router {
    let app_state = AppState::new(
        Arc::new(store.clone()),
        Arc::new(FixedClock(fixed_now())),
        Duration::from_secs(5),
    );
    routes::app(app_state)
}

/// Build the full app router over a migrated `PostgreSQL` pool.
pub fn build_pg_test_app(pool: PgPool) -> Router {
    let app_state = AppState::new(
        Arc::new(PgStore::new(pool, StoreConfig::default())),
        Arc::new(FixedClock(fixed_now())),
        Duration::from_secs(5),
    );
    routes::app(app_state)
}

/// Send a request with a JSON body and return the response.
pub async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send_json(app, "POST", uri, body).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

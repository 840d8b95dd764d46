// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use km_ensemble::config::Config;
use km_ensemble::db::{AnonymousIdentity, Backend, FirestoreDb, LocalStore, SnapshotHub};
use km_ensemble::routes::create_router;
use km_ensemble::AppState;
use std::sync::Arc;
use std::time::Duration;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection against the emulator.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new(
        "test-project",
        Arc::new(AnonymousIdentity::local()),
        Arc::new(SnapshotHub::new()),
        Duration::from_millis(200),
    )
    .await
    .expect("Failed to connect to Firestore emulator")
}

/// Unique group id so emulator tests never share state.
#[allow(dead_code)]
pub fn unique_group_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

/// Create a test app backed by an in-memory local store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let backend = Backend::Local(LocalStore::in_memory(Arc::new(SnapshotHub::new())));
    let state = Arc::new(AppState::with_backend(config, backend));
    (create_router(state.clone()), state)
}

/// Create a test app whose remote store is offline.
#[allow(dead_code)]
pub fn create_offline_app() -> axum::Router {
    let backend = Backend::Firestore(FirestoreDb::new_mock());
    let state = Arc::new(AppState::with_backend(Config::test_default(), backend));
    create_router(state)
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

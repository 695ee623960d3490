//! In-process scenario tests for pmd-daemon HTTP endpoints.
//!
//! These tests spin up the Axum router **without** binding a TCP socket.
//! Each test calls `routes::build_router` and drives it via
//! `tower::ServiceExt::oneshot` — no network I/O required.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use pmd_daemon::{routes, state};
use pmd_store::EntityStore;
use pmd_testkit::contested_bucket;
use tower::ServiceExt; // oneshot

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_router(store: Arc<EntityStore>) -> axum::Router {
    let st = Arc::new(state::AppState::new(store, "cfg-hash-test".into()));
    routes::build_router(st)
}

async fn call(router: axum::Router, req: Request<axum::body::Body>) -> (StatusCode, bytes::Bytes) {
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (status, body)
}

fn parse_json(b: bytes::Bytes) -> serde_json::Value {
    serde_json::from_slice(&b).expect("body is not valid JSON")
}

fn get(uri: &str) -> Request<axum::body::Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap()
}

fn post(uri: &str, body: serde_json::Value) -> Request<axum::body::Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

// ---------------------------------------------------------------------------
// Health / status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_200_ok_true() {
    let router = make_router(Arc::new(EntityStore::new()));
    let (status, body) = call(router, get("/v1/health")).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "pmd-daemon");
}

#[tokio::test]
async fn status_reports_counts_and_config_hash() {
    let store = Arc::new(EntityStore::new());
    contested_bucket(&store);
    let router = make_router(store);

    let (status, body) = call(router, get("/v1/status")).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    assert_eq!(json["config_hash"], "cfg-hash-test");
    assert_eq!(json["groups"], 1);
    assert_eq!(json["reservations"], 3);
    assert_eq!(json["inventory_units"], 2);
}

// ---------------------------------------------------------------------------
// Matching flow over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn preview_execute_reset_round_trip() {
    let store = Arc::new(EntityStore::new());
    let fx = contested_bucket(&store);
    let base = format!("/v1/matching/{}", fx.group.id);

    let (status, body) = call(make_router(Arc::clone(&store)), get(&format!("{base}/preview"))).await;
    assert_eq!(status, StatusCode::OK);
    let preview = parse_json(body);
    assert_eq!(preview["total_pending"], 3);
    assert_eq!(preview["matches"].as_array().unwrap().len(), 2);

    let (status, body) = call(
        make_router(Arc::clone(&store)),
        post(&format!("{base}/execute"), serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let report = parse_json(body);
    assert_eq!(report["matched"], 2);
    assert_eq!(report["remaining"], 1);

    let (status, body) = call(
        make_router(Arc::clone(&store)),
        post(&format!("{base}/reset"), serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(body)["reset_count"], 2);
}

#[tokio::test]
async fn manual_assign_flow() {
    let store = Arc::new(EntityStore::new());
    let fx = contested_bucket(&store);
    let unit = &fx.units[0];

    let (status, body) = call(
        make_router(Arc::clone(&store)),
        get(&format!("/v1/inventory/{}/assignable", unit.id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let candidates = parse_json(body);
    // MNP first even though it registered last.
    assert_eq!(candidates[0]["customer_name"], "switcher");

    let (status, body) = call(
        make_router(Arc::clone(&store)),
        post(
            &format!("/v1/inventory/{}/assign", unit.id),
            serde_json::json!({ "reservation_id": fx.second_new_line.id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(body)["matched_serial_number"], "SN-0001");

    // Same unit again: precondition failure surfaces as 409.
    let (status, body) = call(
        make_router(Arc::clone(&store)),
        post(
            &format!("/v1/inventory/{}/assign", unit.id),
            serde_json::json!({ "reservation_id": fx.first_new_line.id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(parse_json(body)["error"]
        .as_str()
        .unwrap()
        .contains("already matched"));
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_group_maps_to_404() {
    let router = make_router(Arc::new(EntityStore::new()));
    let ghost = uuid::Uuid::new_v4();
    let (status, body) = call(router, get(&format!("/v1/matching/{ghost}/preview"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(parse_json(body)["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn duplicate_serial_maps_to_409() {
    let store = Arc::new(EntityStore::new());
    let fx = contested_bucket(&store);

    let (status, _) = call(
        make_router(Arc::clone(&store)),
        post(
            "/v1/inventory",
            serde_json::json!({
                "group_id": fx.group.id,
                "model": "S26",
                "color": "Black",
                "serial_number": "SN-0001",
                "arrival_date": "2026-02-03"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

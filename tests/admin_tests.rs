// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route administration, reset and export/import over HTTP.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{body_json, get_request, json_request};

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

async fn log(app: &axum::Router, member: &str, km: f64) {
    let (status, _) = send(
        app,
        json_request(
            "POST",
            "/api/groups/crew/entries",
            json!({ "distance_km": km, "date": "2024-01-01", "member": member }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

fn cumulative(milestones: &serde_json::Value) -> Vec<f64> {
    milestones
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["distanceKm"].as_f64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_segment_view_of_default_route() {
    let (app, _state) = common::create_test_app();

    let (status, segments) = send(&app, get_request("/api/groups/crew/milestones/segments")).await;
    assert_eq!(status, StatusCode::OK);

    let segments = segments.as_array().unwrap();
    assert_eq!(segments.len(), 8);
    assert_eq!(segments[0]["segmentKm"], 0.0);
    assert_eq!(segments[1]["id"], "qc");
    assert_eq!(segments[1]["segmentKm"], 317.0);
    assert_eq!(segments[2]["segmentKm"], 208.0);
}

#[tokio::test]
async fn test_save_segments_normalizes() {
    let (app, _state) = common::create_test_app();

    let (status, saved) = send(
        &app,
        json_request(
            "PUT",
            "/api/groups/crew/milestones",
            json!({ "milestones": [
                { "id": "a", "name": "Start", "segmentKm": 12 },
                { "name": "Middle", "segmentKm": 50 },
                { "id": "x", "name": "   ", "segmentKm": 999 },
                { "id": "c", "name": " End ", "segmentKm": "75" }
            ]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cumulative(&saved), vec![0.0, 50.0, 125.0]);
    assert_eq!(saved[0]["id"], "a");
    assert!(!saved[1]["id"].as_str().unwrap().is_empty());
    assert_eq!(saved[2]["name"], "End");

    let (_, dash) = send(&app, get_request("/api/groups/crew/dashboard")).await;
    assert_eq!(dash["progress"]["next_milestone"]["name"], "Middle");
}

#[tokio::test]
async fn test_progress_after_route_change() {
    let (app, _state) = common::create_test_app();

    send(
        &app,
        json_request(
            "PUT",
            "/api/groups/crew/milestones",
            json!({ "milestones": [
                { "name": "Start", "segmentKm": 0 },
                { "name": "A", "segmentKm": 100 },
                { "name": "B", "segmentKm": 200 }
            ]}),
        ),
    )
    .await;
    log(&app, "Alice", 150.0).await;

    let (_, dash) = send(&app, get_request("/api/groups/crew/dashboard")).await;
    let progress = &dash["progress"];
    assert_eq!(progress["next_milestone"]["distanceKm"], 300.0);
    assert_eq!(progress["milestones"][1]["reached"], true);
    assert_eq!(progress["milestones"][2]["reached"], false);
    assert_eq!(progress["remaining_km"], 150.0);
}

#[tokio::test]
async fn test_reorder() {
    let (app, _state) = common::create_test_app();

    let (status, route) = send(
        &app,
        json_request(
            "POST",
            "/api/groups/crew/milestones/reorder",
            json!({ "from": 1, "to": 2 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(route[1]["id"], "rdl");
    assert_eq!(route[1]["distanceKm"], 208.0);
    assert_eq!(route[2]["id"], "qc");
    assert_eq!(route[2]["distanceKm"], 525.0);

    let (status, unchanged) = send(
        &app,
        json_request(
            "POST",
            "/api/groups/crew/milestones/reorder",
            json!({ "from": 0, "to": 42 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unchanged, route);
}

#[tokio::test]
async fn test_edit_ops() {
    let (app, _state) = common::create_test_app();

    let (status, route) = send(
        &app,
        json_request(
            "POST",
            "/api/groups/crew/milestones/edit",
            json!({ "op": "rename", "index": 7, "name": "Îles" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(route[7]["name"], "Îles");
    assert_eq!(route[7]["id"], "iles");

    let (_, route) = send(
        &app,
        json_request(
            "POST",
            "/api/groups/crew/milestones/edit",
            json!({ "op": "append", "name": "Cap-aux-Meules", "segment_km": 13 }),
        ),
    )
    .await;
    assert_eq!(route.as_array().unwrap().len(), 9);
    assert_eq!(route[8]["distanceKm"], 1500.0);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/groups/crew/milestones/edit",
            json!({ "op": "teleport" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_reset_requires_confirmation() {
    let (app, _state) = common::create_test_app();
    log(&app, "Alice", 5.0).await;

    for body in [json!({}), json!({ "confirm": false })] {
        let (status, _) = send(
            &app,
            json_request("POST", "/api/groups/crew/reset", body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    let (_, dash) = send(&app, get_request("/api/groups/crew/dashboard")).await;
    assert_eq!(dash["group_total"], 5.0);

    let (status, body) = send(
        &app,
        json_request("POST", "/api/groups/crew/reset", json!({ "confirm": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["members_removed"], 1);

    let (_, dash) = send(&app, get_request("/api/groups/crew/dashboard")).await;
    assert_eq!(dash["group_total"], 0.0);
    assert_eq!(dash["progress"]["milestones"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn test_export_then_import_elsewhere() {
    let (app, _state) = common::create_test_app();
    log(&app, "Alice", 5.0).await;
    log(&app, "Bob", 3.0).await;

    let response = app
        .clone()
        .oneshot(get_request("/api/groups/crew/export"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .contains("km-ensemble-crew.json"));
    let exported = body_json(response).await;
    assert_eq!(exported["milestones"].as_array().unwrap().len(), 8);
    assert_eq!(exported["members"]["Alice"]["entries"][0]["distanceKm"], 5.0);

    let (other, _state) = common::create_test_app();
    let (status, dash) = send(
        &other,
        Request::builder()
            .method("POST")
            .uri("/api/groups/copy/import")
            .body(Body::from(exported.to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dash["group_id"], "copy");
    assert_eq!(dash["group_total"], 8.0);
}

#[tokio::test]
async fn test_import_tolerates_string_distances() {
    let (app, _state) = common::create_test_app();

    let file = json!({
        "milestones": [
            { "id": "s", "name": "Start", "distanceKm": 0 },
            { "id": "e", "name": "End", "distanceKm": "40" }
        ],
        "members": {
            "Alice": { "entries": [
                { "id": "1", "km": "2.5", "dateISO": "2024-02-01" },
                { "id": "2", "distanceKm": "oops", "dateISO": "2024-02-02" }
            ]}
        }
    });
    let (status, dash) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/groups/crew/import")
            .body(Body::from(file.to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dash["group_total"], 2.5);
    assert_eq!(dash["progress"]["remaining_km"], 37.5);
}

#[tokio::test]
async fn test_malformed_import_rejected_without_changes() {
    let (app, _state) = common::create_test_app();
    log(&app, "Alice", 5.0).await;

    for raw in [r#"{"notMilestones": []}"#, "not json", r#"{"milestones": 3}"#] {
        let (status, body) = send(
            &app,
            Request::builder()
                .method("POST")
                .uri("/api/groups/crew/import")
                .body(Body::from(raw))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_file");
    }

    let (_, dash) = send(&app, get_request("/api/groups/crew/dashboard")).await;
    assert_eq!(dash["group_total"], 5.0);
    assert_eq!(dash["leaderboard"][0]["member"], "Alice");
}

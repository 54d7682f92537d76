//! HTTP-level tests driving the full router, checking routing, the
//! response envelope, and error status mapping.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use deskline_api::{create_api_router, ApiConfig, AppState};
use deskline_storage::InMemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

fn test_app() -> Router {
    let state = AppState::new(Arc::new(InMemoryStore::new()), ApiConfig::default());
    create_api_router(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_ping() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/health/ping")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&bytes[..], b"pong");
}

#[tokio::test]
async fn test_shift_crud_uses_success_envelope() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/shifts",
            json!({
                "name": "day",
                "start": "09:00:00",
                "end": "17:00:00",
                "created_by": "admin"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["msg"], "success");
    assert_eq!(body["data"]["name"], "day");
    assert_eq!(body["data"]["wraps_midnight"], false);
    let shift_id = body["data"]["shift_id"].as_i64().unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/shifts/{shift_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["min_staff"], 1);
}

#[tokio::test]
async fn test_missing_shift_maps_to_not_found_envelope() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/shifts/999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], 2002);
    assert!(body["msg"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_bad_time_format_is_a_400() {
    let response = test_app()
        .oneshot(json_request(
            "POST",
            "/api/v1/shifts",
            json!({
                "name": "day",
                "start": "9am",
                "end": "17:00:00",
                "created_by": "admin"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], 1003);
}

#[tokio::test]
async fn test_tag_crud_enforces_unique_names() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/tags",
            json!({ "name": "vip", "created_by": "admin" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["name"], "vip");
    assert_eq!(body["data"]["color"], "#1890ff");
    let tag_id = body["data"]["tag_id"].as_i64().unwrap();

    // Same name again is a conflict.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/tags",
            json!({ "name": "vip", "created_by": "admin" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["code"], 3000);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/tags/{tag_id}"),
            json!({ "color": "#ff4d4f" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["color"], "#ff4d4f");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/tags/{tag_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/tags/{tag_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], 2000);
}

#[tokio::test]
async fn test_assignment_without_agents_is_a_503() {
    let response = test_app()
        .oneshot(json_request(
            "POST",
            "/api/v1/conversations",
            json!({ "user_id": "u1", "nickname": "Pat" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["code"], 4000);
}

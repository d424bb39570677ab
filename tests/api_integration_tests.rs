//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle for each endpoint.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use dataloader_cache::{api::create_router, AppState, Config};
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;

// == Helper Functions ==

fn test_config() -> Config {
    Config {
        max_entries: 100,
        cache_ttl: 300,
        ..Config::default()
    }
}

fn create_test_state(config: &Config) -> AppState {
    AppState::from_config(config).unwrap()
}

fn create_test_app() -> Router {
    create_router(create_test_state(&test_config()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// == SET Endpoint Tests ==

#[tokio::test]
async fn test_set_endpoint_success() {
    let app = create_test_app();

    let response = send(
        &app,
        "PUT",
        "/set",
        Some(r#"{"key":"test_key","value":"test_value"}"#),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "test_key");
    assert!(json["message"].as_str().unwrap().contains("test_key"));
}

#[tokio::test]
async fn test_set_endpoint_structured_value() {
    let app = create_test_app();

    let response = send(
        &app,
        "PUT",
        "/set",
        Some(r#"{"key":"user:1","value":{"id":1,"tags":["a","b"]}}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/get/user:1", None).await;
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["value"]["id"], 1);
    assert_eq!(json["value"]["tags"][1], "b");
}

// == GET Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_success() {
    let app = create_test_app();

    let set_response = send(
        &app,
        "PUT",
        "/set",
        Some(r#"{"key":"get_key","value":"get_value"}"#),
    )
    .await;
    assert_eq!(set_response.status(), StatusCode::OK);

    let get_response = send(&app, "GET", "/get/get_key", None).await;

    assert_eq!(get_response.status(), StatusCode::OK);
    let json = body_to_json(get_response.into_body()).await;
    assert_eq!(json["key"], "get_key");
    assert_eq!(json["value"], "get_value");
    assert_eq!(json["origin"], "local");
    assert!(json["ttl_remaining"].as_u64().unwrap() <= 300);
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app();

    let response = send(&app, "GET", "/get/nonexistent_key", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("nonexistent_key"));
}

#[tokio::test]
async fn test_get_without_ttl_omits_remaining() {
    let state = create_test_state(&Config {
        cache_ttl: -1,
        ..test_config()
    });
    let app = create_router(state);

    send(&app, "PUT", "/set", Some(r#"{"key":"k","value":1}"#)).await;
    let response = send(&app, "GET", "/get/k", None).await;

    let json = body_to_json(response.into_body()).await;
    assert!(json["ttl_remaining"].is_null());
}

// == DELETE Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint_success() {
    let state = create_test_state(&Config {
        remote_enabled: false,
        ..test_config()
    });
    let app = create_router(state);

    send(
        &app,
        "PUT",
        "/set",
        Some(r#"{"key":"delete_key","value":"delete_value"}"#),
    )
    .await;

    let del_response = send(&app, "DELETE", "/del/delete_key", None).await;
    assert_eq!(del_response.status(), StatusCode::OK);

    let get_response = send(&app, "GET", "/get/delete_key", None).await;
    assert_eq!(get_response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_endpoint_not_found() {
    let app = create_test_app();

    let response = send(&app, "DELETE", "/del/nonexistent_key", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == Remote Bridge Tests ==

#[tokio::test]
async fn test_deleted_key_reads_back_from_remote() {
    let state = create_test_state(&test_config());
    let app = create_router(state.clone());

    send(
        &app,
        "PUT",
        "/set",
        Some(r#"{"key":"shared","value":{"n":42}}"#),
    )
    .await;
    state.cache.flush().await;
    assert!(state.remote.peek("shared").is_some());

    send(&app, "DELETE", "/del/shared", None).await;
    assert!(!state.cache.contains_key("shared").await);

    let response = send(&app, "GET", "/get/shared", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["value"]["n"], 42);
    assert_eq!(json["origin"], "remote");
}

#[tokio::test]
async fn test_remote_toggle_endpoint() {
    let state = create_test_state(&test_config());
    let app = create_router(state.clone());

    let response = send(&app, "PUT", "/remote", Some(r#"{"active":false}"#)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["active"], false);

    send(&app, "PUT", "/set", Some(r#"{"key":"offline","value":1}"#)).await;
    state.cache.flush().await;
    assert!(state.remote.is_empty());

    let response = send(&app, "GET", "/health", None).await;
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["remote_active"], false);
}

// == CLEAR Endpoint Tests ==

#[tokio::test]
async fn test_clear_endpoint() {
    let state = create_test_state(&test_config());
    let app = create_router(state.clone());

    send(&app, "PUT", "/set", Some(r#"{"key":"a","value":1}"#)).await;
    send(&app, "PUT", "/set", Some(r#"{"key":"b","value":2}"#)).await;

    let response = send(&app, "DELETE", "/clear", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["cleared"], 2);
    assert!(state.cache.is_empty().await);
}

// == STATS Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint() {
    let state = create_test_state(&Config {
        remote_enabled: false,
        ..test_config()
    });
    let app = create_router(state);

    send(
        &app,
        "PUT",
        "/set",
        Some(r#"{"key":"stats_key","value":"stats_value"}"#),
    )
    .await;
    send(&app, "GET", "/get/stats_key", None).await;
    send(&app, "GET", "/get/nonexistent", None).await;

    let response = send(&app, "GET", "/stats", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["total_entries"], 1);
    assert_eq!(json["hit_rate"], 0.5);
}

#[tokio::test]
async fn test_stats_count_evictions() {
    let state = create_test_state(&Config {
        max_entries: 2,
        ..test_config()
    });
    let app = create_router(state);

    for key in ["a", "b", "c"] {
        let body = format!(r#"{{"key":"{}","value":null}}"#, key);
        send(&app, "PUT", "/set", Some(&body)).await;
    }

    let response = send(&app, "GET", "/stats", None).await;
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["evictions"], 1);
    assert_eq!(json["total_entries"], 2);
}

// == HEALTH Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = send(&app, "GET", "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["remote_active"], true);
    assert!(json.get("timestamp").is_some());
}

// == Error Response Tests ==

#[tokio::test]
async fn test_invalid_json_request() {
    let app = create_test_app();

    let response = send(&app, "PUT", "/set", Some(r#"{"invalid json"#)).await;

    // Axum returns 400 for syntax errors and 422 for shape errors
    assert!(
        response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn test_empty_key_request() {
    let app = create_test_app();

    let response = send(&app, "PUT", "/set", Some(r#"{"key":"","value":"test"}"#)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

// == TTL Expiration via API Tests ==

#[tokio::test(start_paused = true)]
async fn test_ttl_expiration_via_api() {
    let state = create_test_state(&Config {
        cache_ttl: 1,
        remote_enabled: false,
        ..test_config()
    });
    let app = create_router(state);

    let set_response = send(
        &app,
        "PUT",
        "/set",
        Some(r#"{"key":"ttl_test","value":"expires_soon"}"#),
    )
    .await;
    assert_eq!(set_response.status(), StatusCode::OK);

    let get_response = send(&app, "GET", "/get/ttl_test", None).await;
    assert_eq!(get_response.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let get_response = send(&app, "GET", "/get/ttl_test", None).await;
    assert_eq!(get_response.status(), StatusCode::NOT_FOUND);
}

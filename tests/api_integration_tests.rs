//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycles against the router, plus one run
//! against a live listener.

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use policy_cache::{api::create_router, AppState, Cache, CacheConfig, EvictionPolicy};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

fn create_state(config: CacheConfig) -> AppState {
    AppState::new(Cache::new(config).unwrap())
}

fn create_test_app() -> Router {
    create_router(create_state(CacheConfig::default()))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

// == SET / GET ==

#[tokio::test]
async fn test_set_then_get_json_value() {
    let app = create_test_app();

    let (status, json) = send(
        &app,
        json_request("PUT", "/set", json!({"key": "user", "value": {"id": 7, "tags": ["a"]}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["message"].as_str().unwrap().contains("user"));

    let (status, json) = send(&app, empty_request("GET", "/get/user")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["key"], "user");
    assert_eq!(json["value"], json!({"id": 7, "tags": ["a"]}));
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app();

    let (status, json) = send(&app, empty_request("GET", "/get/missing")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("missing"));
}

#[tokio::test]
async fn test_invalid_json_request() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/set")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_empty_key_request() {
    let app = create_test_app();

    let (status, json) = send(&app, json_request("PUT", "/set", json!({"key": "", "value": 1}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json.get("error").is_some());
}

// == DELETE / HAS / KEYS / CLEAR ==

#[tokio::test]
async fn test_delete_endpoint_twice() {
    let app = create_test_app();
    send(&app, json_request("PUT", "/set", json!({"key": "k", "value": "v"}))).await;

    let (status, _) = send(&app, empty_request("DELETE", "/del/k")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, empty_request("DELETE", "/del/k")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, json) = send(&app, empty_request("GET", "/has/k")).await;
    assert_eq!(json["exists"], false);
}

#[tokio::test]
async fn test_keys_and_clear() {
    let app = create_test_app();
    for key in ["b", "a", "c"] {
        send(&app, json_request("PUT", "/set", json!({"key": key, "value": key}))).await;
    }

    let (_, json) = send(&app, empty_request("GET", "/keys")).await;
    assert_eq!(json["count"], 3);
    assert_eq!(json["keys"], json!(["a", "b", "c"]));

    let (status, json) = send(&app, empty_request("POST", "/clear")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["size"], 0);
    assert_eq!(json["memory_usage"], 0);
}

// == STATS / ENTRY INFO ==

#[tokio::test]
async fn test_stats_track_hits_and_misses() {
    let app = create_test_app();
    send(&app, json_request("PUT", "/set", json!({"key": "k", "value": "abc"}))).await;
    send(&app, empty_request("GET", "/get/k")).await;
    send(&app, empty_request("GET", "/get/k")).await;
    send(&app, empty_request("GET", "/get/nope")).await;

    let (status, json) = send(&app, empty_request("GET", "/stats")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["hits"], 2);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["sets"], 1);
    assert_eq!(json["size"], 1);
    assert_eq!(json["memory_usage"], 5);
    assert_eq!(json["policy"], "LRU");
    let hit_rate = json["hit_rate"].as_f64().unwrap();
    assert!((hit_rate - 2.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_entry_info_endpoint() {
    let app = create_test_app();
    send(
        &app,
        json_request("PUT", "/set", json!({"key": "k", "value": [1, 2], "ttl_ms": 60000})),
    )
    .await;
    send(&app, empty_request("GET", "/get/k")).await;

    let (status, json) = send(&app, empty_request("GET", "/entry/k")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["size_bytes"], 5);
    assert_eq!(json["access_count"], 1);
    assert!(json["ttl_remaining_ms"].as_u64().unwrap() <= 60_000);
    assert!(json["created_at"].is_string());

    let (status, _) = send(&app, empty_request("GET", "/entry/unknown")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// == POLICY / CONFIG ==

#[tokio::test]
async fn test_policy_change_drives_eviction() {
    let app = create_router(create_state(CacheConfig {
        max_size: 2,
        ..CacheConfig::default()
    }));

    let (status, json) = send(&app, json_request("PUT", "/policy", json!({"policy": "fifo"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["policy"], "FIFO");

    send(&app, json_request("PUT", "/set", json!({"key": "a", "value": 1}))).await;
    send(&app, json_request("PUT", "/set", json!({"key": "b", "value": 2}))).await;
    send(&app, empty_request("GET", "/get/a")).await;
    send(&app, json_request("PUT", "/set", json!({"key": "c", "value": 3}))).await;

    let (_, json) = send(&app, empty_request("GET", "/keys")).await;
    assert_eq!(json["keys"], json!(["b", "c"]));
}

#[tokio::test]
async fn test_config_update_endpoint() {
    let app = create_test_app();
    for n in 0..5 {
        send(&app, json_request("PUT", "/set", json!({"key": format!("k{n}"), "value": n}))).await;
    }

    let (status, json) = send(
        &app,
        json_request("PATCH", "/config", json!({"max_size": 3, "policy": "LFU"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["max_size"], 3);
    assert_eq!(json["policy"], "LFU");

    let (_, json) = send(&app, empty_request("GET", "/stats")).await;
    assert_eq!(json["size"], 3);
    assert_eq!(json["evictions"], 2);

    let (status, _) = send(
        &app,
        json_request("PATCH", "/config", json!({"cleanup_interval_ms": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// == TTL ==

#[tokio::test]
async fn test_ttl_expiration_via_api() {
    let state = create_state(CacheConfig::default());
    let app = create_router(state.clone());

    send(
        &app,
        json_request("PUT", "/set", json!({"key": "short", "value": "v", "ttl_ms": 100})),
    )
    .await;
    let (status, _) = send(&app, empty_request("GET", "/get/short")).await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(150)).await;

    let (status, _) = send(&app, empty_request("GET", "/get/short")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, json) = send(&app, empty_request("GET", "/has/short")).await;
    assert_eq!(json["exists"], false);
    assert_eq!(state.cache.stats().await.expirations, 1);
}

// == Memory Limit ==

#[tokio::test]
async fn test_memory_limit_scenario() {
    let state = create_state(CacheConfig {
        max_memory: 1000,
        policy: EvictionPolicy::Lru,
        ..CacheConfig::default()
    });
    let app = create_router(state.clone());

    // Each string value serializes to 400 bytes
    let value = "x".repeat(398);
    for key in ["a", "b", "c"] {
        let (status, _) = send(&app, json_request("PUT", "/set", json!({"key": key, "value": value}))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let stats = state.cache.stats().await;
    assert!(stats.memory_usage <= 800);
    assert!(stats.evictions >= 1);
    assert!(!state.cache.has("a").await);

    // Too large to ever fit
    let huge = "x".repeat(2000);
    let (status, _) = send(&app, json_request("PUT", "/set", json!({"key": "huge", "value": huge}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// == Live Server ==

#[tokio::test]
async fn test_live_server_roundtrip() {
    let app = create_test_app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let base = format!("http://{}", addr);

    let response = client
        .put(format!("{base}/set"))
        .json(&json!({"key": "live", "value": {"ok": true}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: Value = client
        .get(format!("{base}/get/live"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["value"]["ok"], true);

    let health: Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");

    server.abort();
}

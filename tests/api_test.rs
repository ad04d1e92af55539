use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::post,
    Json, Router,
};
use codesync::api::{HealthResponse, NewRoomResponse};
use codesync::execute::ExecuteConfig;
use codesync::state::AppState;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn app_with(config: ExecuteConfig) -> Router {
    codesync::app(
        Arc::new(AppState::new_with_executor(config)),
        Path::new("does-not-exist"),
    )
}

fn execute_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/execute")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Stand-in for the execution service
async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/execute", addr)
}

fn upstream_config(api_url: String) -> ExecuteConfig {
    ExecuteConfig {
        api_url,
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn test_health_on_fresh_state() {
    let response = app_with(ExecuteConfig::default())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health: HealthResponse = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.connections, 0);
    assert_eq!(health.rooms, 0);
}

#[tokio::test]
async fn test_new_room_tokens_differ() {
    let app = app_with(ExecuteConfig::default());

    let first = app
        .clone()
        .oneshot(Request::get("/api/rooms/new").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let second = app
        .oneshot(Request::get("/api/rooms/new").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let first: NewRoomResponse = serde_json::from_value(body_json(first).await).unwrap();
    let second: NewRoomResponse = serde_json::from_value(body_json(second).await).unwrap();
    assert!(!first.room_id.is_empty());
    assert_ne!(first.room_id, second.room_id);
}

#[tokio::test]
async fn test_execute_rejects_missing_language() {
    let response = app_with(ExecuteConfig::default())
        .oneshot(execute_request(json!({ "source": "print(1)" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("language"));
}

#[tokio::test]
async fn test_execute_rejects_unsupported_language() {
    let response = app_with(ExecuteConfig::default())
        .oneshot(execute_request(
            json!({ "language": "brainfuck", "source": "+." }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("brainfuck"));
}

#[tokio::test]
async fn test_execute_relays_upstream_body() {
    let upstream = Router::new().route(
        "/execute",
        post(|Json(req): Json<Value>| async move {
            Json(json!({
                "language": req["language"],
                "run": { "stdout": "1\n", "stderr": "", "code": 0 },
                "echo": req["files"][0]["content"],
            }))
        }),
    );
    let url = spawn_upstream(upstream).await;

    let response = app_with(upstream_config(url))
        .oneshot(execute_request(
            json!({ "language": "python", "source": "print(1)" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["language"], "python");
    assert_eq!(body["run"]["stdout"], "1\n");
    assert_eq!(body["echo"], "print(1)");
}

#[tokio::test]
async fn test_execute_maps_upstream_rate_limit() {
    let upstream = Router::new().route(
        "/execute",
        post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
    );
    let url = spawn_upstream(upstream).await;

    let response = app_with(upstream_config(url))
        .oneshot(execute_request(
            json!({ "language": "python", "source": "print(1)" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_execute_maps_upstream_failure() {
    let upstream = Router::new().route(
        "/execute",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let url = spawn_upstream(upstream).await;

    let response = app_with(upstream_config(url))
        .oneshot(execute_request(
            json!({ "language": "rust", "source": "fn main() {}" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_execute_unreachable_upstream() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);

    let response = app_with(upstream_config(format!("http://{}/execute", addr)))
        .oneshot(execute_request(
            json!({ "language": "go", "source": "package main" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

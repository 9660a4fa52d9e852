//! HTTP API tests driving the router in-process.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use mcp_context::adapters::http::{HttpConfig, McpHttpServer};
use mcp_context::domain::models::McpServerConfig;

use common::{fixture_dir, service};

async fn app() -> Router {
    let servers = vec![McpServerConfig {
        id: "market-data".to_string(),
        name: "Market Data".to_string(),
        server_type: "http".to_string(),
        endpoint: Some("http://localhost:9301/mcp".to_string()),
        enabled: true,
        metadata: Default::default(),
    }];
    McpHttpServer::new(service(&fixture_dir()).await, servers, HttpConfig::default()).router()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_loaded_models() {
    let app = app().await;
    let (status, body) = send(&app, get("/api/mcp/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["loaded"], true);
    assert_eq!(body["domain_models"], 3);
}

#[tokio::test]
async fn test_list_and_get_domain_models() {
    let app = app().await;

    let (status, body) = send(&app, get("/api/mcp/domain-models")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["domain_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["cognition", "investments", "legal_docs"]);

    let (status, body) = send(&app, get("/api/mcp/domain-models/legal_docs")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], "1.0.0");

    let (status, body) = send(&app, get("/api/mcp/domain-models/nonexistent")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_resolve_then_fetch_trace() {
    let app = app().await;

    let (status, bundle) = send(
        &app,
        post_json(
            "/api/mcp/resolve",
            &json!({"request_id": "http-1", "domain_ids": ["investments", "nonexistent"]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bundle["outcome"], "partial");
    assert_eq!(bundle["request_id"], "http-1");

    let (status, trace) = send(&app, get("/api/mcp/traces/http-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trace["domain_ids_consulted"], json!(["investments"]));

    let (status, body) = send(
        &app,
        post_json("/api/mcp/resolve", &json!({"request_id": "http-1", "keywords": ["finance"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE_REQUEST_ID");

    let (_, traces) = send(&app, get("/api/mcp/traces?limit=10")).await;
    assert_eq!(traces.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_resolve_errors_map_to_status() {
    let app = app().await;

    let (status, body) = send(&app, post_json("/api/mcp/resolve", &json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "EMPTY_QUERY");

    let (status, body) = send(
        &app,
        post_json("/api/mcp/resolve", &json!({"keywords": ["astrology"]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NO_MATCH");

    let (status, _) = send(&app, get("/api/mcp/traces/unknown")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_servers_metrics_and_reload() {
    let app = app().await;

    let (status, servers) = send(&app, get("/api/mcp/servers")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(servers[0]["id"], "market-data");
    assert_eq!(servers[0]["type"], "http");

    let (status, report) = send(&app, post_json("/api/mcp/reload", &json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["loaded"].as_array().unwrap().len(), 3);

    let (status, metrics) = send(&app, get("/api/mcp/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics["load_count"], 2);
    assert_eq!(metrics["size"], 3);
    assert_eq!(metrics["trace_count"], 0);
}

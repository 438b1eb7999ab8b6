//! Integration tests for the admin API client against a canned HTTP server.

mod common;

use common::CannedServer;
use lucidlink_mcp::api::{ApiClient, ApiClientConfig, ApiResult, CreateFilespaceRequest, Credential};
use lucidlink_mcp::error::ErrorKind;
use lucidlink_mcp::poll::ManualClock;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

fn client(server: &CannedServer) -> ApiClient {
    let config = ApiClientConfig {
        base_url: server.base_url.clone(),
        request_timeout: Duration::from_secs(5),
        ..ApiClientConfig::default()
    };
    ApiClient::with_clock(
        Credential::new("secret-token").unwrap(),
        &config,
        Arc::new(ManualClock::new()),
    )
    .unwrap()
}

#[tokio::test]
async fn test_empty_success_body_is_empty_object() {
    let server = CannedServer::start(|_| (200, String::new())).await;
    let result = client(&server).health().await;

    assert_eq!(
        result,
        ApiResult::Success {
            status_code: 200,
            body: json!({})
        }
    );
    assert_eq!(server.requests()[0].path, "/api/v1/health");
}

#[tokio::test]
async fn test_bearer_token_and_json_body_are_sent() {
    let server = CannedServer::start(|_| (201, r#"{"data":{"id":"fs-1"}}"#.to_string())).await;
    let result = client(&server)
        .create_filespace(&CreateFilespaceRequest::new("alpha"))
        .await;

    assert!(result.is_success());
    assert_eq!(result.data(), Some(&json!({"id": "fs-1"})));

    let request = &server.requests()[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/api/v1/filespaces");
    assert_eq!(request.header("authorization"), Some("Bearer secret-token"));

    let body: Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body["name"], "alpha");
    assert_eq!(body["region"], "us-east-1");
    assert_eq!(body["storageProvider"], "AWS");
}

#[tokio::test]
async fn test_conflict_keeps_server_message() {
    let server = CannedServer::start(|_| (409, r#"{"message":"exists"}"#.to_string())).await;
    let result = client(&server)
        .create_filespace(&CreateFilespaceRequest::new("alpha"))
        .await;

    assert_eq!(result.status_code(), Some(409));
    let error = result.error().unwrap();
    assert_eq!(error.kind, ErrorKind::Conflict);
    assert_eq!(error.message, "exists");
}

#[tokio::test]
async fn test_unauthorized_without_body() {
    let server = CannedServer::start(|_| (401, String::new())).await;
    let result = client(&server).list_filespaces().await;

    let error = result.error().unwrap();
    assert_eq!(error.kind, ErrorKind::AuthFailed);
    assert!(error.message.contains("Authentication failed"));
}

#[tokio::test]
async fn test_path_segments_are_percent_encoded() {
    let server = CannedServer::start(|_| (204, String::new())).await;
    let result = client(&server).delete_filespace("fs 1/../x").await;

    assert!(result.is_success());
    assert_eq!(server.requests()[0].path, "/api/v1/filespaces/fs%201%2F..%2Fx");
}

#[tokio::test]
async fn test_eleventh_call_refused_locally() {
    let server = CannedServer::start(|_| (200, r#"{"data":[]}"#.to_string())).await;
    let client = client(&server);

    for _ in 0..10 {
        assert!(client.list_groups().await.is_success());
    }
    let refused = client.list_groups().await;

    assert_eq!(refused.status_code(), None);
    assert_eq!(refused.error().unwrap().kind, ErrorKind::RateLimited);
    assert_eq!(server.requests().len(), 10);
}

#[tokio::test]
async fn test_slow_server_is_timed_out() {
    // Accepts connections and never answers.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let config = ApiClientConfig {
        base_url: format!("http://{}/api/v1", addr),
        request_timeout: Duration::from_millis(300),
        ..ApiClientConfig::default()
    };
    let client = ApiClient::with_clock(
        Credential::new("secret-token").unwrap(),
        &config,
        Arc::new(ManualClock::new()),
    )
    .unwrap();

    let result = client.health().await;

    assert_eq!(result.status_code(), None);
    let error = result.error().unwrap();
    assert_eq!(error.kind, ErrorKind::TimedOut);
    assert_eq!(error.message, "API request timed out.");
}

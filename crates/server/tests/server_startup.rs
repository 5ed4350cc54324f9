//! Server startup and plumbing tests: health, config, metrics, auth.

mod common;

use reqwest::Client;
use serde_json::Value;

use common::{api, start_test_server};

#[tokio::test]
async fn test_health_endpoint() {
    let (port, mut server, _temp_dir) = start_test_server().await;

    let client = Client::new();
    let response = client
        .get(api(port, "/health"))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);

    let json: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());

    server.kill().await.ok();
}

#[tokio::test]
async fn test_config_endpoint_is_sanitized() {
    let (port, mut server, _temp_dir) = start_test_server().await;

    let client = Client::new();
    let response = client.get(api(port, "/config")).send().await.unwrap();
    assert_eq!(response.status(), 200);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["auth"]["method"], "none");
    assert_eq!(json["auth"]["keys_configured"], 0);
    // Raw key material never appears in the response shape.
    assert!(json["auth"]["api_keys"].is_null());

    server.kill().await.ok();
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (port, mut server, _temp_dir) = start_test_server().await;

    let client = Client::new();

    // Hit an API route first so HTTP counters exist.
    client.get(api(port, "/health")).send().await.unwrap();

    let response = client
        .get(format!("http://127.0.0.1:{}/metrics", port))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body = response.text().await.unwrap();
    assert!(body.contains("prereg_http_requests_total"));
    assert!(body.contains("prereg_applicants_total"));

    server.kill().await.ok();
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (port, mut server, _temp_dir) = start_test_server().await;

    let client = Client::new();
    let response = client.get(api(port, "/nope")).send().await.unwrap();
    assert_eq!(response.status(), 404);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_stats_endpoint_empty_portal() {
    let (port, mut server, _temp_dir) = start_test_server().await;

    let client = Client::new();
    let response = client.get(api(port, "/stats")).send().await.unwrap();
    assert_eq!(response.status(), 200);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["applicants"]["total"], 0);
    assert_eq!(json["groups"]["total"], 0);
    assert_eq!(json["tickets"]["open"], 0);
    assert_eq!(json["queue_today"]["waiting"], 0);

    server.kill().await.ok();
}

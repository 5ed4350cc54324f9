//! Shared helpers for server integration tests.
#![allow(dead_code)]

use std::io::Write;
use std::net::TcpListener;
use std::time::Duration;

use reqwest::Client;
use tempfile::{NamedTempFile, TempDir};
use tokio::time::sleep;

/// Find an available port
pub fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Config with auth disabled and auto-assignment off (tests drive
/// assignment explicitly unless they opt in).
pub fn config_with_db(port: u16, db_path: &str, auto_assign: bool) -> String {
    format!(
        r#"
[auth]
method = "none"

[server]
host = "127.0.0.1"
port = {}

[database]
path = "{}"

[registration]
auto_assign = {}
"#,
        port, db_path, auto_assign
    )
}

/// Spawn the server and return a handle
pub async fn spawn_server(config_path: &std::path::Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_preregd"))
        .env("PREREG_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
pub async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

/// Helper to start a server for testing
pub async fn start_test_server() -> (u16, tokio::process::Child, TempDir) {
    start_test_server_with_auto_assign(false).await
}

/// Start a server, controlling the registration auto-assign flag
pub async fn start_test_server_with_auto_assign(
    auto_assign: bool,
) -> (u16, tokio::process::Child, TempDir) {
    let port = get_available_port();
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let config_content = config_with_db(port, db_path.to_str().unwrap(), auto_assign);

    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let server = spawn_server(temp_file.path()).await;

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    // Keep the config file alive for the whole server lifetime
    std::mem::forget(temp_file);

    // Give a moment for initialization
    sleep(Duration::from_millis(100)).await;

    (port, server, temp_dir)
}

pub fn api(port: u16, path: &str) -> String {
    format!("http://127.0.0.1:{}/api/v1{}", port, path)
}

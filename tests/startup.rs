//! Startup behaviour of the gateway binary.

use std::process::Stdio;
use std::time::Duration;

use axum::routing::any;
use axum::Router;
use tokio::process::Command;

use storefront_gateway::backends::BackendService;

mod common;

fn gateway_command(port: u16) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_storefront-gateway"));
    command
        .env_clear()
        .env("PORT", port.to_string())
        .env("LISTEN_ADDR", "127.0.0.1")
        .env("DISABLE_TRACING", "1")
        .env("LOG_LEVEL", "info")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    command
}

fn with_backends(command: &mut Command, addr: &str) {
    for service in BackendService::ALL {
        command.env(service.env_var(), addr);
    }
}

#[tokio::test]
async fn test_missing_backend_variable_exits_before_bind() {
    let port = common::free_port();
    let mut command = gateway_command(port);
    with_backends(&mut command, "127.0.0.1:50051");
    command.env_remove("AD_SERVICE_ADDR");

    let output = tokio::time::timeout(Duration::from_secs(30), command.output())
        .await
        .expect("gateway should exit on its own")
        .unwrap();

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("AD_SERVICE_ADDR"), "{stdout}");

    // Nothing was bound.
    assert!(std::net::TcpListener::bind(("127.0.0.1", port)).is_ok());
}

#[tokio::test]
async fn test_unreachable_backend_exits_with_connect_error() {
    let port = common::free_port();
    let dead = format!("127.0.0.1:{}", common::free_port());
    let mut command = gateway_command(port);
    with_backends(&mut command, &dead);

    let output = tokio::time::timeout(Duration::from_secs(30), command.output())
        .await
        .expect("gateway should exit on its own")
        .unwrap();

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("grpc: failed to connect"), "{stdout}");
    assert!(stdout.contains(&dead), "{stdout}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_serves_health_once_backends_are_dialed() {
    // Any HTTP/2 server accepts the dial; no RPCs are made.
    let backend = common::spawn_server(Router::new().fallback(any(|| async { "" }))).await;

    let port = common::free_port();
    let mut command = gateway_command(port);
    with_backends(&mut command, &backend.to_string());
    let mut child = command.spawn().unwrap();

    let url = format!("http://127.0.0.1:{port}/_healthz");
    let client = reqwest::Client::new();
    let mut healthy = None;
    for _ in 0..100 {
        if let Ok(response) = client.get(&url).send().await {
            healthy = Some(response);
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let response = healthy.expect("gateway never became reachable");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .is_some_and(|c| c.to_str().unwrap().starts_with("shop_session-id=")));
    assert_eq!(response.text().await.unwrap(), "ok");

    child.kill().await.unwrap();
}

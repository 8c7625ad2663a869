//! End-to-end tests over real sockets.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

use h2_dispatch::config::ServerConfig;
use h2_dispatch::lifecycle::{Application, Shutdown};
use h2_dispatch::net::Listener;

mod common;
use common::write_file;

async fn start(config: ServerConfig) -> (String, Shutdown, tokio::task::JoinHandle<()>) {
    let listener = Listener::bind(&config.listener).await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let app = Application::build(config).await.unwrap();
    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        app.serve_on(listener, signal).await.unwrap();
    });
    (base, shutdown, handle)
}

fn config_in(root: &std::path::Path) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.paths.root = root.to_path_buf();
    config.timeouts.shutdown_secs = 2;
    config
}

fn h2c_client() -> reqwest::Client {
    reqwest::Client::builder()
        .http2_prior_knowledge()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

#[tokio::test]
async fn serves_static_files_over_h2c() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "web/app/index.html", "<p>hello</p>");
    let (base, shutdown, handle) = start(config_in(dir.path())).await;

    let response = h2c_client()
        .get(format!("{base}/web/app/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.version(), reqwest::Version::HTTP_2);
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/html");
    assert_eq!(response.headers()["content-length"], "12");
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), "<p>hello</p>");

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn api_and_errors_over_h2c() {
    let dir = tempfile::tempdir().unwrap();
    let (base, shutdown, _handle) = start(config_in(dir.path())).await;
    let client = h2c_client();

    let response = client
        .post(format!("{base}/api/http2/load/namespaces"))
        .body(r#"{"data":null}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["http2"]["path"], "/src/http2");

    let response = client
        .delete(format!("{base}/api/http2/load/namespaces"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = client
        .get(format!("{base}/web/nothing.css"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    shutdown.trigger();
}

#[tokio::test]
async fn http1_clients_are_served_too() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "web/index.html", "home");
    let (base, shutdown, _handle) = start(config_in(dir.path())).await;

    let response = reqwest::Client::builder()
        .http1_only()
        .build()
        .unwrap()
        .get(format!("{base}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.version(), reqwest::Version::HTTP_11);
    assert_eq!(response.text().await.unwrap(), "home");

    shutdown.trigger();
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.security.max_body_size = 16;
    let (base, shutdown, _handle) = start(config).await;

    let response = h2c_client()
        .post(format!("{base}/api/http2/load/config"))
        .body(vec![b'x'; 1024])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    shutdown.trigger();
}

//! Static resolution against a real directory tree.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use axum::http::{Method, StatusCode};

use h2_dispatch::config::ServerConfig;
use h2_dispatch::lifecycle::Application;
use h2_dispatch::plugin::PluginDescriptor;

mod common;
use common::{event, get, write_file, RecordingStream};

/// Project layout:
/// ```text
/// web/index.html, web/myapp/index.html, web/notes.unknownext
/// src/myapp/file.js
/// plugins/shop/{src/app.js, web/index.html, src/vendor/lib/index.js}
/// opt/lib/index.js
/// ```
fn project(root: &Path) -> ServerConfig {
    write_file(root, "web/index.html", "<h1>home</h1>");
    write_file(root, "web/myapp/index.html", "<h1>myapp</h1>");
    write_file(root, "web/notes.unknownext", "???");
    write_file(root, "src/myapp/file.js", "export const x = 1;");
    write_file(root, "plugins/shop/src/app.js", "shop()");
    write_file(root, "plugins/shop/web/index.html", "<h1>shop</h1>");
    write_file(root, "plugins/shop/src/vendor/lib/index.js", "plugin copy");
    write_file(root, "opt/lib/index.js", "override copy");

    let mut config = ServerConfig::default();
    config.paths.root = root.to_path_buf();

    let mut shop = PluginDescriptor::new("shop", "plugins/shop");
    shop.static_maps = BTreeMap::from([(
        "shop/vendor/lib".to_string(),
        PathBuf::from("opt/lib"),
    )]);
    config.plugins.push(shop);
    config
}

async fn fetch(app: &Application, target: &str) -> RecordingStream {
    let mut stream = RecordingStream::new();
    app.dispatcher().dispatch(get(target), &mut stream).await;
    stream
}

#[tokio::test]
async fn web_directory_serves_index() {
    let dir = tempfile::tempdir().unwrap();
    let app = Application::build(project(dir.path())).await.unwrap();

    let mut stream = fetch(&app, "/web/myapp/").await;
    assert_eq!(stream.status(), StatusCode::OK);
    assert_eq!(stream.header("content-type"), vec!["text/html"]);
    assert_eq!(stream.body_text().await, "<h1>myapp</h1>");

    let mut stream = fetch(&app, "/").await;
    assert_eq!(stream.body_text().await, "<h1>home</h1>");
}

#[tokio::test]
async fn source_zone_uses_source_root_without_index() {
    let dir = tempfile::tempdir().unwrap();
    let app = Application::build(project(dir.path())).await.unwrap();

    let mut stream = fetch(&app, "/src/myapp/file.js").await;
    assert_eq!(stream.status(), StatusCode::OK);
    assert_eq!(stream.body_text().await, "export const x = 1;");

    let stream = fetch(&app, "/src/myapp/").await;
    assert_eq!(stream.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn plugin_folders_are_mapped() {
    let dir = tempfile::tempdir().unwrap();
    let app = Application::build(project(dir.path())).await.unwrap();

    let mut stream = fetch(&app, "/src/shop/app.js").await;
    assert_eq!(stream.body_text().await, "shop()");

    let mut stream = fetch(&app, "/web/shop/").await;
    assert_eq!(stream.body_text().await, "<h1>shop</h1>");
}

#[tokio::test]
async fn override_mapping_beats_plugin_folder() {
    let dir = tempfile::tempdir().unwrap();
    let app = Application::build(project(dir.path())).await.unwrap();

    let mut stream = fetch(&app, "/src/shop/vendor/lib/index.js").await;
    assert_eq!(stream.status(), StatusCode::OK);
    assert_eq!(stream.body_text().await, "override copy");
}

#[tokio::test]
async fn query_string_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let app = Application::build(project(dir.path())).await.unwrap();

    let mut stream = fetch(&app, "/src/shop/app.js?v=3").await;
    assert_eq!(stream.body_text().await, "shop()");
}

#[tokio::test]
async fn unresolvable_paths_fall_through_to_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = Application::build(project(dir.path())).await.unwrap();

    for target in [
        "/web/missing.css",
        "/web/myapp",
        "/web/notes.unknownext",
        "/web/../src/myapp/file.js",
    ] {
        let stream = fetch(&app, target).await;
        assert_eq!(stream.status(), StatusCode::NOT_FOUND, "{target}");
    }
}

#[tokio::test]
async fn head_and_post_are_served_too() {
    let dir = tempfile::tempdir().unwrap();
    let app = Application::build(project(dir.path())).await.unwrap();

    for method in [Method::HEAD, Method::POST] {
        let mut stream = RecordingStream::new();
        app.dispatcher()
            .dispatch(event(method, "/web/myapp/index.html", ""), &mut stream)
            .await;
        assert_eq!(stream.status(), StatusCode::OK);
    }
}

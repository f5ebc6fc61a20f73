//! Publishing and resolving a provider through the HTTP API on the local
//! backend.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;
use serde_json::json;

use common::*;
use depot_server::{build_router, AppState, ServerConfig};
use depot_store::{Driver, FilenamePatterns, LocalBackend};

fn app() -> (tempfile::TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let driver = Driver::new(LocalBackend::new(
        dir.path(),
        Arc::new(FilenamePatterns::new()),
    ));
    let app = build_router(AppState::new(driver, ServerConfig::default()));
    (dir, app)
}

/// Everything scenario one uploads: manifest, signature and a linux binary.
async fn publish_widget(app: &Router) -> Vec<u8> {
    let links = publish_version(app).await;
    let shasums_upload = links["shasums-upload"].as_str().unwrap();
    let sig_upload = links["shasums-sig-upload"].as_str().unwrap();
    assert_eq!(shasums_upload, "/v1/providers/acme/widget/versions/1.0.0/shasums");

    assert_eq!(put(app, shasums_upload, vec![b'f'; 64]).await.status, StatusCode::OK);
    assert_eq!(put(app, sig_upload, b"signature".to_vec()).await.status, StatusCode::OK);

    let binary_upload = create_platform(app, "linux", "amd64").await;
    let binary: Vec<u8> = (0..1024u32).map(|i| (i * 7 % 256) as u8).collect();
    assert_eq!(put(app, &binary_upload, binary.clone()).await.status, StatusCode::OK);
    binary
}

#[tokio::test]
async fn publish_then_resolve_package() {
    let (_dir, app) = app();
    let binary = publish_widget(&app).await;

    let reply = get(&app, "/v1/providers/acme/widget/1.0.0/download/linux/amd64").await;
    assert_eq!(reply.status, StatusCode::OK);
    let pkg = reply.json();
    assert_eq!(pkg["os"], "linux");
    assert_eq!(pkg["arch"], "amd64");
    assert_eq!(pkg["filename"], "terraform-provider-widget_1.0.0_linux_amd64.zip");
    assert_eq!(pkg["shasum"], depot_crypto::sha256_hex(&binary));
    assert_eq!(pkg["signing_keys"]["gpg_public_keys"][0]["key_id"], KEY_ID);
    assert_eq!(pkg["signing_keys"]["gpg_public_keys"][0]["ascii_armor"], ED25519);

    // Every URL in the descriptor resolves, and the binary hashes to the
    // advertised digest.
    let download = get(&app, pkg["download_url"].as_str().unwrap()).await;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(download.headers["content-type"], "application/zip");
    assert_eq!(depot_crypto::sha256_hex(&download.body), pkg["shasum"].as_str().unwrap());

    let sums = get(&app, pkg["shasums_url"].as_str().unwrap()).await;
    assert_eq!(sums.status, StatusCode::OK);
    assert_eq!(sums.body, vec![b'f'; 64]);

    let sig = get(&app, pkg["shasums_signature_url"].as_str().unwrap()).await;
    assert_eq!(sig.status, StatusCode::OK);
    assert_eq!(sig.body, b"signature");
}

#[tokio::test]
async fn lists_published_version() {
    let (_dir, app) = app();
    publish_widget(&app).await;

    let reply = get(&app, "/v1/providers/acme/widget/versions").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.json(),
        json!({"versions": [{
            "version": "1.0.0",
            "protocols": ["5.0"],
            "platforms": [{"os": "linux", "arch": "amd64"}],
        }]})
    );
}

#[tokio::test]
async fn non_pgp_key_is_a_client_error() {
    let (_dir, app) = app();
    let noise: String = (0..300u32).map(|i| char::from(b'!' + (i * 13 % 90) as u8)).collect();
    let reply = post(
        &app,
        "/v1/gpg-keys",
        "gpg-keys",
        json!({"namespace": "acme", "ascii-armor": noise}),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    let message = reply.json()["errors"][0].as_str().unwrap().to_string();
    assert!(message.starts_with("invalid signing key"), "{message}");

    // Nothing was stored.
    let reply = get(&app, "/v1/gpg-keys/acme/8442047DE3AAFF63").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_platform_and_missing_version_differ() {
    let (_dir, app) = app();
    publish_widget(&app).await;

    let reply = get(&app, "/v1/providers/acme/widget/1.0.0/download/darwin/arm64").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.json()["errors"][0], "provider binary does not exist");

    let reply = get(&app, "/v1/providers/acme/widget/2.0.0/download/linux/amd64").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.json()["errors"][0], "provider version does not exist");
}

#[tokio::test]
async fn recreating_keeps_artifacts() {
    let (_dir, app) = app();
    let binary = publish_widget(&app).await;

    publish_version(&app).await;
    create_platform(&app, "linux", "amd64").await;

    let reply = get(
        &app,
        "/v1/providers/acme/widget/versions/1.0.0/platforms/linux/amd64/binary",
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, binary);
}

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

pub const ED25519: &str = include_str!("../../../depot-crypto/tests/fixtures/ed25519_public.asc");
pub const KEY_ID: &str = "8442047DE3AAFF63";

pub struct Reply {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Reply {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    Reply {
        status,
        headers,
        body,
    }
}

pub async fn get(app: &Router, uri: &str) -> Reply {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn put(app: &Router, uri: &str, body: Vec<u8>) -> Reply {
    send(
        app,
        Request::builder()
            .method("PUT")
            .uri(uri)
            .body(Body::from(body))
            .unwrap(),
    )
    .await
}

pub async fn post(app: &Router, uri: &str, kind: &str, attributes: Value) -> Reply {
    let doc = json!({"data": {"type": kind, "attributes": attributes}});
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(doc.to_string()))
            .unwrap(),
    )
    .await
}

/// Register the signing key, the provider and version 1.0.0 of
/// `acme/widget`. Returns the version's upload links.
pub async fn publish_version(app: &Router) -> Value {
    let reply = post(
        app,
        "/v1/gpg-keys",
        "gpg-keys",
        json!({"namespace": "acme", "ascii-armor": ED25519}),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);

    let reply = post(
        app,
        "/v1/providers",
        "registry-providers",
        json!({"namespace": "acme", "name": "widget"}),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);

    let reply = post(
        app,
        "/v1/providers/acme/widget/versions",
        "registry-provider-versions",
        json!({"version": "1.0.0", "key-id": KEY_ID}),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    reply.json()["data"]["links"].clone()
}

pub async fn create_platform(app: &Router, os: &str, arch: &str) -> String {
    let reply = post(
        app,
        "/v1/providers/acme/widget/versions/1.0.0/platforms",
        "registry-provider-platforms",
        json!({"os": os, "arch": arch}),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    reply.json()["data"]["links"]["provider-binary-upload"]
        .as_str()
        .unwrap()
        .to_string()
}

//! Request handlers. Each one validates its coordinates, calls the storage
//! driver and shapes the protocol document; status mapping lives in
//! [`ServerError`](crate::error::ServerError).

pub mod gpg;
pub mod module;
pub mod provider;

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use depot_protocol::{HealthResponse, ServiceDiscovery};
use depot_store::ArtifactReader;
use depot_types::{ModuleRef, ModuleVersionRef, PlatformRef, ProviderRef, VersionRef};

use crate::error::ServerResult;
use crate::state::AppState;

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

pub async fn discovery_handler(State(state): State<AppState>) -> Json<ServiceDiscovery> {
    let config = state.config();
    Json(ServiceDiscovery::new(
        &config.base_url,
        config.enable_modules,
        config.enable_providers,
    ))
}

/// Stream a stored artifact back to the client.
fn stream(reader: ArtifactReader, content_type: &'static str) -> Response {
    (
        [(header::CONTENT_TYPE, content_type)],
        Body::from_stream(ReaderStream::new(reader)),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Path parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct NamespacePath {
    pub namespace: String,
}

#[derive(Debug, Deserialize)]
pub struct ProviderPath {
    pub namespace: String,
    pub name: String,
}

impl ProviderPath {
    fn provider(&self) -> ServerResult<ProviderRef> {
        Ok(ProviderRef::new(&self.namespace, &self.name)?)
    }
}

#[derive(Debug, Deserialize)]
pub struct VersionPath {
    pub namespace: String,
    pub name: String,
    pub version: String,
}

impl VersionPath {
    fn version(&self) -> ServerResult<VersionRef> {
        Ok(VersionRef::new(&self.namespace, &self.name, &self.version)?)
    }
}

#[derive(Debug, Deserialize)]
pub struct PlatformPath {
    pub namespace: String,
    pub name: String,
    pub version: String,
    pub os: String,
    pub arch: String,
}

impl PlatformPath {
    fn platform(&self) -> ServerResult<PlatformRef> {
        Ok(PlatformRef::new(
            &self.namespace,
            &self.name,
            &self.version,
            &self.os,
            &self.arch,
        )?)
    }
}

#[derive(Debug, Deserialize)]
pub struct ModulePath {
    pub namespace: String,
    pub name: String,
    pub provider: String,
}

impl ModulePath {
    fn module(&self) -> ServerResult<ModuleRef> {
        Ok(ModuleRef::new(&self.namespace, &self.name, &self.provider)?)
    }
}

#[derive(Debug, Deserialize)]
pub struct ModuleVersionPath {
    pub namespace: String,
    pub name: String,
    pub provider: String,
    pub version: String,
}

impl ModuleVersionPath {
    fn version(&self) -> ServerResult<ModuleVersionRef> {
        Ok(ModuleVersionRef::new(
            &self.namespace,
            &self.name,
            &self.provider,
            &self.version,
        )?)
    }
}

#[derive(Debug, Deserialize)]
pub struct GpgKeyPath {
    pub namespace: String,
    pub key_id: String,
}

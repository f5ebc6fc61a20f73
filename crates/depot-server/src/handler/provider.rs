use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use bytes::Bytes;
use tracing::info;

use depot_protocol::message::{
    ProviderAttributes, ProviderPlatformAttributes, ProviderPlatformLinks, ProviderVersionAttributes,
    ProviderVersionLinks, SelfLink,
};
use depot_protocol::{data_types, endpoints, ProviderVersionList, Request, Response as Document};
use depot_types::{coords, Package, ProviderRef, VersionMetadata};

use super::{stream, PlatformPath, ProviderPath, VersionPath};
use crate::error::ServerResult;
use crate::state::AppState;

const ZIP: &str = "application/zip";
const OCTET_STREAM: &str = "application/octet-stream";

// ---------------------------------------------------------------------------
// Provider registry protocol
// ---------------------------------------------------------------------------

pub async fn list_versions(
    State(state): State<AppState>,
    Path(path): Path<ProviderPath>,
) -> ServerResult<Json<ProviderVersionList>> {
    let provider = path.provider()?;
    let versions = state.driver().provider().list_available_versions(&provider).await?;
    Ok(Json(versions.into()))
}

pub async fn find_package(
    State(state): State<AppState>,
    Path(path): Path<PlatformPath>,
) -> ServerResult<Json<Package>> {
    let platform = path.platform()?;
    Ok(Json(state.driver().provider().find_package(&platform).await?))
}

// ---------------------------------------------------------------------------
// Publishing
// ---------------------------------------------------------------------------

pub async fn create_provider(
    State(state): State<AppState>,
    payload: Result<Json<Request<ProviderAttributes>>, JsonRejection>,
) -> ServerResult<Response> {
    let Json(request) = payload?;
    let attrs = request.into_attributes(data_types::REGISTRY_PROVIDERS)?;
    let provider = ProviderRef::new(&attrs.namespace, &attrs.name)?;
    state.driver().provider().create_provider(&provider).await?;
    info!(provider = %provider, "created provider");

    let links = SelfLink {
        self_link: endpoints::provider(provider.namespace(), provider.name()),
    };
    let doc = Document::new(data_types::REGISTRY_PROVIDERS, attrs, links).with_id(provider.to_string());
    Ok((StatusCode::CREATED, Json(doc)).into_response())
}

pub async fn create_version(
    State(state): State<AppState>,
    Path(path): Path<ProviderPath>,
    payload: Result<Json<Request<ProviderVersionAttributes>>, JsonRejection>,
) -> ServerResult<Response> {
    let Json(request) = payload?;
    let mut attrs = request.into_attributes(data_types::REGISTRY_PROVIDER_VERSIONS)?;
    attrs.validate()?;
    let version = path.provider()?.version(&attrs.version)?;
    attrs.key_id = coords::key_id(&attrs.key_id)?;

    let store = state.driver().provider();
    store.is_provider_created(version.provider()).await?;
    store.get_gpg_key(version.namespace(), &attrs.key_id).await?;
    let uploads = store.create_provider_version(&version).await?;
    store
        .save_version_metadata(&version, &VersionMetadata::new(&attrs.key_id))
        .await?;
    info!(version = %version, key_id = %attrs.key_id, "created provider version");

    let doc = Document::new(
        data_types::REGISTRY_PROVIDER_VERSIONS,
        attrs,
        ProviderVersionLinks::from(uploads),
    )
    .with_id(version.to_string());
    Ok((StatusCode::CREATED, Json(doc)).into_response())
}

pub async fn create_platform(
    State(state): State<AppState>,
    Path(path): Path<VersionPath>,
    payload: Result<Json<Request<ProviderPlatformAttributes>>, JsonRejection>,
) -> ServerResult<Response> {
    let Json(request) = payload?;
    let attrs = request.into_attributes(data_types::REGISTRY_PROVIDER_PLATFORMS)?;
    let platform = path.version()?.platform(&attrs.os, &attrs.arch)?;

    let store = state.driver().provider();
    store.is_provider_version_created(platform.version_ref()).await?;
    let upload = store.create_provider_platform(&platform).await?;
    info!(platform = %platform, "created provider platform");

    let doc = Document::new(
        data_types::REGISTRY_PROVIDER_PLATFORMS,
        attrs,
        ProviderPlatformLinks::from(upload),
    )
    .with_id(platform.to_string());
    Ok((StatusCode::CREATED, Json(doc)).into_response())
}

// ---------------------------------------------------------------------------
// Artifact transfer
// ---------------------------------------------------------------------------

pub async fn upload_shasums(
    State(state): State<AppState>,
    Path(path): Path<VersionPath>,
    body: Bytes,
) -> ServerResult<StatusCode> {
    let version = path.version()?;
    state.driver().provider().save_shasums(&version, body).await?;
    Ok(StatusCode::OK)
}

pub async fn download_shasums(
    State(state): State<AppState>,
    Path(path): Path<VersionPath>,
) -> ServerResult<Response> {
    let version = path.version()?;
    let reader = state.driver().provider().get_shasums(&version).await?;
    Ok(stream(reader, OCTET_STREAM))
}

pub async fn upload_shasums_sig(
    State(state): State<AppState>,
    Path(path): Path<VersionPath>,
    body: Bytes,
) -> ServerResult<StatusCode> {
    let version = path.version()?;
    state.driver().provider().save_shasums_sig(&version, body).await?;
    Ok(StatusCode::OK)
}

pub async fn download_shasums_sig(
    State(state): State<AppState>,
    Path(path): Path<VersionPath>,
) -> ServerResult<Response> {
    let version = path.version()?;
    let reader = state.driver().provider().get_shasums_sig(&version).await?;
    Ok(stream(reader, OCTET_STREAM))
}

pub async fn upload_binary(
    State(state): State<AppState>,
    Path(path): Path<PlatformPath>,
    body: Bytes,
) -> ServerResult<StatusCode> {
    let platform = path.platform()?;
    let size = body.len();
    state.driver().provider().save_platform_binary(&platform, body).await?;
    info!(platform = %platform, bytes = size, "stored provider binary");
    Ok(StatusCode::OK)
}

pub async fn download_binary(
    State(state): State<AppState>,
    Path(path): Path<PlatformPath>,
) -> ServerResult<Response> {
    let platform = path.platform()?;
    let reader = state.driver().provider().get_platform_binary(&platform).await?;
    Ok(stream(reader, ZIP))
}

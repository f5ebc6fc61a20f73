use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use bytes::Bytes;
use tracing::info;

use depot_protocol::message::{ModuleAttributes, ModuleVersionAttributes, ModuleVersionLinks, SelfLink};
use depot_protocol::{data_types, endpoints, ModuleVersionList, Request, Response as Document};
use depot_types::ModuleRef;

use super::{stream, ModulePath, ModuleVersionPath, NamespacePath};
use crate::error::ServerResult;
use crate::state::AppState;

/// Where the module registry protocol tells clients to fetch a package.
pub const TERRAFORM_GET: HeaderName = HeaderName::from_static("x-terraform-get");

const GZIP: &str = "application/gzip";

pub async fn list_versions(
    State(state): State<AppState>,
    Path(path): Path<ModulePath>,
) -> ServerResult<Json<ModuleVersionList>> {
    let module = path.module()?;
    let versions = state.driver().module().list_module_versions(&module).await?;
    Ok(Json(versions.into()))
}

pub async fn download(
    State(state): State<AppState>,
    Path(path): Path<ModuleVersionPath>,
) -> ServerResult<Response> {
    let version = path.version()?;
    let url = state.driver().module().module_download_url(&version).await?;
    Ok((StatusCode::NO_CONTENT, [(TERRAFORM_GET, url)]).into_response())
}

pub async fn create_module(
    State(state): State<AppState>,
    Path(path): Path<NamespacePath>,
    payload: Result<Json<Request<ModuleAttributes>>, JsonRejection>,
) -> ServerResult<Response> {
    let Json(request) = payload?;
    let attrs = request.into_attributes(data_types::REGISTRY_MODULES)?;
    let module = ModuleRef::new(&path.namespace, &attrs.name, &attrs.provider)?;
    state.driver().module().create_module(&module).await?;
    info!(module = %module, "created module");

    let links = SelfLink {
        self_link: endpoints::module_versions(module.namespace(), module.name(), module.provider()),
    };
    let doc = Document::new(data_types::REGISTRY_MODULES, attrs, links).with_id(module.to_string());
    Ok((StatusCode::CREATED, Json(doc)).into_response())
}

pub async fn create_version(
    State(state): State<AppState>,
    Path(path): Path<ModulePath>,
    payload: Result<Json<Request<ModuleVersionAttributes>>, JsonRejection>,
) -> ServerResult<Response> {
    let Json(request) = payload?;
    let attrs = request.into_attributes(data_types::REGISTRY_MODULE_VERSIONS)?;
    let version = path.module()?.version(&attrs.version)?;
    let upload = state.driver().module().create_module_version(&version).await?;
    info!(version = %version, "created module version");

    let doc = Document::new(
        data_types::REGISTRY_MODULE_VERSIONS,
        attrs,
        ModuleVersionLinks::from(upload),
    )
    .with_id(version.to_string());
    Ok((StatusCode::CREATED, Json(doc)).into_response())
}

pub async fn upload_package(
    State(state): State<AppState>,
    Path(path): Path<ModuleVersionPath>,
    body: Bytes,
) -> ServerResult<StatusCode> {
    let version = path.version()?;
    let size = body.len();
    state.driver().module().save_module_package(&version, body).await?;
    info!(version = %version, bytes = size, "stored module package");
    Ok(StatusCode::OK)
}

pub async fn download_package(
    State(state): State<AppState>,
    Path(path): Path<ModuleVersionPath>,
) -> ServerResult<Response> {
    let version = path.version()?;
    let reader = state.driver().module().get_module_package(&version).await?;
    Ok(stream(reader, GZIP))
}

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use tracing::info;

use depot_protocol::message::{GpgKeyAttributes, SelfLink};
use depot_protocol::{data_types, endpoints, Request, Response as Document};
use depot_types::{coords, GpgPublicKey};

use super::GpgKeyPath;
use crate::error::ServerResult;
use crate::state::AppState;

type KeyDocument = Document<GpgKeyAttributes, SelfLink>;

fn key_document(namespace: &str, key: GpgPublicKey) -> KeyDocument {
    let links = SelfLink {
        self_link: endpoints::gpg_key(namespace, &key.key_id),
    };
    let id = key.key_id.clone();
    let attrs = GpgKeyAttributes {
        namespace: namespace.to_string(),
        key_id: Some(key.key_id),
        ascii_armor: key.ascii_armor,
    };
    Document::new(data_types::GPG_KEYS, attrs, links).with_id(id)
}

/// Decode a submitted key and store it under its key ID. The armor is kept
/// exactly as submitted.
pub async fn add_key(
    State(state): State<AppState>,
    payload: Result<Json<Request<GpgKeyAttributes>>, JsonRejection>,
) -> ServerResult<Response> {
    let Json(request) = payload?;
    let attrs = request.into_attributes(data_types::GPG_KEYS)?;
    attrs.validate()?;
    let namespace = coords::namespace(&attrs.namespace)?;

    let key = depot_crypto::decode_public_key(&attrs.ascii_armor)?;
    state.driver().provider().save_gpg_key(namespace, &key).await?;
    info!(namespace, key_id = %key.key_id, "added signing key");

    Ok((StatusCode::CREATED, Json(key_document(namespace, key))).into_response())
}

pub async fn get_key(
    State(state): State<AppState>,
    Path(path): Path<GpgKeyPath>,
) -> ServerResult<Json<KeyDocument>> {
    let key = state
        .driver()
        .provider()
        .get_gpg_key(&path.namespace, &path.key_id)
        .await?;
    Ok(Json(key_document(&path.namespace, key)))
}

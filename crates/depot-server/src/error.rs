use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use depot_crypto::KeyError;
use depot_protocol::{ErrorResponse, ProtocolError};
use depot_store::StoreError;
use depot_types::TypeError;

const INTERNAL_MESSAGE: &str = "internal server error";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A submitted signing key did not decode.
    #[error("invalid signing key: {0}")]
    Key(#[from] KeyError),

    #[error(transparent)]
    Coordinate(#[from] TypeError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("invalid request body: {0}")]
    Body(#[from] JsonRejection),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(e) if e.is_not_exist() => StatusCode::NOT_FOUND,
            Self::Store(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Key(_) | Self::Coordinate(_) | Self::Protocol(_) => StatusCode::BAD_REQUEST,
            // Well-formed JSON of the wrong shape is malformed input too.
            Self::Body(JsonRejection::JsonDataError(_)) => StatusCode::BAD_REQUEST,
            // Oversized bodies keep 413, a missing content type 415.
            Self::Body(rejection) => rejection.status(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "request failed");
            INTERNAL_MESSAGE.to_string()
        } else {
            self.to_string()
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

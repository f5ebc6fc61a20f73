use std::fmt;
use std::io;

use depot_crypto::KeyError;
use depot_types::TypeError;

/// A stored resource whose absence callers must be able to tell apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Provider,
    ProviderVersion,
    ProviderBinary,
    ProviderGpgKey,
    ChecksumManifest,
    ManifestSignature,
    Module,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider => write!(f, "provider"),
            Self::ProviderVersion => write!(f, "provider version"),
            Self::ProviderBinary => write!(f, "provider binary"),
            Self::ProviderGpgKey => write!(f, "provider gpg key"),
            Self::ChecksumManifest => write!(f, "checksum manifest"),
            Self::ManifestSignature => write!(f, "manifest signature"),
            Self::Module => write!(f, "module"),
        }
    }
}

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested resource is not stored.
    #[error("{0} does not exist")]
    NotExist(Resource),

    /// The backend cannot perform this operation. Byte transfers on the
    /// object store go through presigned URLs instead.
    #[error("{operation} is not allowed on this backend")]
    NotAllowed { operation: &'static str },

    #[error(transparent)]
    InvalidCoordinate(#[from] TypeError),

    /// A stored signing key no longer decodes.
    #[error("stored key {key} is corrupt: {source}")]
    CorruptKey {
        key: String,
        #[source]
        source: KeyError,
    },

    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    pub fn not_allowed(operation: &'static str) -> Self {
        Self::NotAllowed { operation }
    }

    /// Map a filesystem error, turning "not found" into `missing`.
    pub fn from_io(err: io::Error, missing: Resource) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotExist(missing),
            _ => Self::Io(err),
        }
    }

    /// Map an object store error, turning "not found" into `missing`.
    pub fn from_object_store(err: object_store::Error, missing: Resource) -> Self {
        match err {
            object_store::Error::NotFound { .. } => Self::NotExist(missing),
            other => Self::ObjectStore(other),
        }
    }

    pub fn is_not_exist(&self) -> bool {
        matches!(self, Self::NotExist(_))
    }

    /// The missing resource, if this is a not-exist error.
    pub fn missing(&self) -> Option<Resource> {
        match self {
            Self::NotExist(resource) => Some(*resource),
            _ => None,
        }
    }

    pub fn is_not_allowed(&self) -> bool {
        matches!(self, Self::NotAllowed { .. })
    }

    /// Errors caused by the request rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NotAllowed { .. } | Self::InvalidCoordinate(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_not_found_maps_to_requested_resource() {
        let err = StoreError::from_io(
            io::Error::new(io::ErrorKind::NotFound, "gone"),
            Resource::ChecksumManifest,
        );
        assert_eq!(err.missing(), Some(Resource::ChecksumManifest));
        assert_eq!(err.to_string(), "checksum manifest does not exist");
    }

    #[test]
    fn other_io_errors_propagate() {
        let err = StoreError::from_io(
            io::Error::new(io::ErrorKind::PermissionDenied, "nope"),
            Resource::ProviderBinary,
        );
        assert!(matches!(err, StoreError::Io(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn object_store_not_found_maps_to_requested_resource() {
        let err = StoreError::from_object_store(
            object_store::Error::NotFound {
                path: "providers/acme/widget".into(),
                source: "missing".into(),
            },
            Resource::ManifestSignature,
        );
        assert_eq!(err.missing(), Some(Resource::ManifestSignature));
    }

    #[test]
    fn classification() {
        assert!(StoreError::not_allowed("upload").is_not_allowed());
        assert!(StoreError::not_allowed("upload").is_client_error());
        assert!(StoreError::NotExist(Resource::Module).is_not_exist());
        assert!(!StoreError::Config("x".into()).is_client_error());
    }
}

//! Results of the create operations: where a client should send bytes next,
//! plus the one per-version record the registry persists.

use serde::{Deserialize, Serialize};

/// Upload locations returned when a provider version is created.
///
/// On the local backend these are paths served by the registry itself; on
/// the object store they are presigned PUT URLs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderVersionUploads {
    pub shasums_upload: String,
    pub shasums_sig_upload: String,
}

/// Upload location returned when a provider platform is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderPlatformUpload {
    pub provider_binary_upload: String,
}

/// Upload location returned when a module version is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleVersionUpload {
    pub upload: String,
}

/// Stored as `metadata.json` in a provider version root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMetadata {
    #[serde(rename = "key-id")]
    pub key_id: String,
}

impl VersionMetadata {
    pub fn new(key_id: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
        }
    }
}

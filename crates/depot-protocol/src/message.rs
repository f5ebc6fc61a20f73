use serde::{Deserialize, Serialize};

use depot_types::{
    AvailableVersion, ModuleVersionUpload, Platform, ProviderPlatformUpload,
    ProviderVersionUploads,
};

use crate::error::{ProtocolError, ProtocolResult};

/// Provider protocol versions advertised for every published version.
pub const PROVIDER_PROTOCOLS: &[&str] = &["5.0"];

/// JSON:API `data.type` values.
pub mod data_types {
    pub const GPG_KEYS: &str = "gpg-keys";
    pub const REGISTRY_PROVIDERS: &str = "registry-providers";
    pub const REGISTRY_PROVIDER_VERSIONS: &str = "registry-provider-versions";
    pub const REGISTRY_PROVIDER_PLATFORMS: &str = "registry-provider-platforms";
    pub const REGISTRY_MODULES: &str = "registry-modules";
    pub const REGISTRY_MODULE_VERSIONS: &str = "registry-module-versions";
}

/// A JSON:API request document: `{"data": {"type", "attributes"}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request<A> {
    pub data: RequestData<A>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestData<A> {
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: A,
}

impl<A> Request<A> {
    pub fn new(kind: impl Into<String>, attributes: A) -> Self {
        Self {
            data: RequestData {
                kind: kind.into(),
                attributes,
            },
        }
    }

    /// Unwrap the attributes, checking the document's `type`.
    pub fn into_attributes(self, expected: &'static str) -> ProtocolResult<A> {
        if self.data.kind != expected {
            return Err(ProtocolError::UnexpectedType {
                expected,
                found: self.data.kind,
            });
        }
        Ok(self.data.attributes)
    }
}

/// A JSON:API response document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response<A, L> {
    pub data: ResponseData<A, L>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseData<A, L> {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub attributes: A,
    pub links: L,
}

impl<A, L> Response<A, L> {
    pub fn new(kind: impl Into<String>, attributes: A, links: L) -> Self {
        Self {
            data: ResponseData {
                kind: kind.into(),
                id: None,
                attributes,
                links,
            },
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.data.id = Some(id.into());
        self
    }
}

fn require(name: &'static str, value: &str) -> ProtocolResult<()> {
    if value.trim().is_empty() {
        return Err(ProtocolError::InvalidAttribute {
            name,
            reason: "is required".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderAttributes {
    pub namespace: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderVersionAttributes {
    pub version: String,
    /// The key that signs this version's checksum manifest.
    #[serde(rename = "key-id")]
    pub key_id: String,
}

impl ProviderVersionAttributes {
    pub fn validate(&self) -> ProtocolResult<()> {
        require("version", &self.version)?;
        require("key-id", &self.key_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderPlatformAttributes {
    pub os: String,
    pub arch: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleAttributes {
    pub name: String,
    pub provider: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleVersionAttributes {
    pub version: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpgKeyAttributes {
    pub namespace: String,
    /// Set by the server in responses; ignored on submission.
    #[serde(rename = "key-id", default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(rename = "ascii-armor")]
    pub ascii_armor: String,
}

impl GpgKeyAttributes {
    pub fn validate(&self) -> ProtocolResult<()> {
        require("namespace", &self.namespace)?;
        require("ascii-armor", &self.ascii_armor)
    }
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfLink {
    #[serde(rename = "self")]
    pub self_link: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderVersionLinks {
    #[serde(rename = "shasums-upload")]
    pub shasums_upload: String,
    #[serde(rename = "shasums-sig-upload")]
    pub shasums_sig_upload: String,
}

impl From<ProviderVersionUploads> for ProviderVersionLinks {
    fn from(uploads: ProviderVersionUploads) -> Self {
        Self {
            shasums_upload: uploads.shasums_upload,
            shasums_sig_upload: uploads.shasums_sig_upload,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderPlatformLinks {
    #[serde(rename = "provider-binary-upload")]
    pub provider_binary_upload: String,
}

impl From<ProviderPlatformUpload> for ProviderPlatformLinks {
    fn from(upload: ProviderPlatformUpload) -> Self {
        Self {
            provider_binary_upload: upload.provider_binary_upload,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleVersionLinks {
    pub upload: String,
}

impl From<ModuleVersionUpload> for ModuleVersionLinks {
    fn from(upload: ModuleVersionUpload) -> Self {
        Self {
            upload: upload.upload,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry protocol documents
// ---------------------------------------------------------------------------

/// `GET /v1/providers/:namespace/:name/versions`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderVersionList {
    pub versions: Vec<ProviderVersionEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderVersionEntry {
    pub version: String,
    pub protocols: Vec<String>,
    pub platforms: Vec<Platform>,
}

impl From<Vec<AvailableVersion>> for ProviderVersionList {
    fn from(versions: Vec<AvailableVersion>) -> Self {
        let protocols: Vec<String> = PROVIDER_PROTOCOLS.iter().map(|p| p.to_string()).collect();
        Self {
            versions: versions
                .into_iter()
                .map(|v| ProviderVersionEntry {
                    version: v.version,
                    protocols: protocols.clone(),
                    platforms: v.platforms,
                })
                .collect(),
        }
    }
}

/// `GET /v1/modules/:namespace/:name/:provider/versions`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleVersionList {
    pub modules: Vec<ModuleVersions>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleVersions {
    pub versions: Vec<ModuleVersionEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleVersionEntry {
    pub version: String,
}

impl From<Vec<String>> for ModuleVersionList {
    fn from(versions: Vec<String>) -> Self {
        Self {
            modules: vec![ModuleVersions {
                versions: versions
                    .into_iter()
                    .map(|version| ModuleVersionEntry { version })
                    .collect(),
            }],
        }
    }
}

/// Body of every error response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub errors: Vec<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpg_key_request_parses() {
        let body = r#"{"data":{"type":"gpg-keys","attributes":{"namespace":"acme","ascii-armor":"-----BEGIN"}}}"#;
        let req: Request<GpgKeyAttributes> = serde_json::from_str(body).unwrap();
        let attrs = req.into_attributes(data_types::GPG_KEYS).unwrap();
        assert_eq!(attrs.namespace, "acme");
        assert!(attrs.key_id.is_none());
        attrs.validate().unwrap();
    }

    #[test]
    fn wrong_data_type_rejected() {
        let req = Request::new("registry-modules", ModuleVersionAttributes {
            version: "1.0.0".into(),
        });
        assert_eq!(
            req.into_attributes(data_types::REGISTRY_MODULE_VERSIONS),
            Err(ProtocolError::UnexpectedType {
                expected: "registry-module-versions",
                found: "registry-modules".into(),
            })
        );
    }

    #[test]
    fn provider_version_requires_key_id() {
        let body = r#"{"data":{"type":"registry-provider-versions","attributes":{"version":"1.0.0","key-id":""}}}"#;
        let req: Request<ProviderVersionAttributes> = serde_json::from_str(body).unwrap();
        let attrs = req
            .into_attributes(data_types::REGISTRY_PROVIDER_VERSIONS)
            .unwrap();
        assert!(matches!(
            attrs.validate(),
            Err(ProtocolError::InvalidAttribute { name: "key-id", .. })
        ));
    }

    #[test]
    fn provider_version_response_links() {
        let resp = Response::new(
            data_types::REGISTRY_PROVIDER_VERSIONS,
            ProviderVersionAttributes {
                version: "1.0.0".into(),
                key_id: "ABCD".into(),
            },
            ProviderVersionLinks::from(ProviderVersionUploads {
                shasums_upload: "/a".into(),
                shasums_sig_upload: "/b".into(),
            }),
        );
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["data"]["type"], "registry-provider-versions");
        assert_eq!(json["data"]["links"]["shasums-upload"], "/a");
        assert_eq!(json["data"]["links"]["shasums-sig-upload"], "/b");
        assert_eq!(json["data"]["attributes"]["key-id"], "ABCD");
        assert!(json["data"].get("id").is_none());
    }

    #[test]
    fn provider_version_list_advertises_protocols() {
        let mut v = AvailableVersion::new("1.0.0");
        v.add_platform(Platform::new("linux", "amd64").unwrap());
        let json = serde_json::to_value(ProviderVersionList::from(vec![v])).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "versions": [{
                    "version": "1.0.0",
                    "protocols": ["5.0"],
                    "platforms": [{"os": "linux", "arch": "amd64"}]
                }]
            })
        );
    }

    #[test]
    fn module_version_list_shape() {
        let list = ModuleVersionList::from(vec!["0.1.0".to_string(), "0.2.0".to_string()]);
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["modules"][0]["versions"][1]["version"], "0.2.0");
    }

    #[test]
    fn error_response_shape() {
        let json = serde_json::to_string(&ErrorResponse::new("internal server error")).unwrap();
        assert_eq!(json, r#"{"errors":["internal server error"]}"#);
    }
}

/// HTTP endpoint paths.
///
/// Constants are route patterns (`:param` segments); functions build the
/// concrete path for one artifact.
pub mod endpoints {
    pub const DISCOVERY: &str = "/.well-known/terraform.json";
    pub const HEALTH: &str = "/healthz";

    pub const MODULES_V1: &str = "/v1/modules/";
    pub const PROVIDERS_V1: &str = "/v1/providers/";

    pub const MODULE_CREATE: &str = "/v1/modules/:namespace";
    pub const MODULE_VERSIONS: &str = "/v1/modules/:namespace/:name/:provider/versions";
    pub const MODULE_DOWNLOAD: &str = "/v1/modules/:namespace/:name/:provider/:version/download";
    pub const MODULE_PACKAGE: &str =
        "/v1/modules/:namespace/:name/:provider/versions/:version/package";

    pub const PROVIDERS: &str = "/v1/providers";
    pub const PROVIDER_VERSIONS: &str = "/v1/providers/:namespace/:name/versions";
    pub const PROVIDER_DOWNLOAD: &str =
        "/v1/providers/:namespace/:name/:version/download/:os/:arch";
    pub const PROVIDER_PLATFORMS: &str =
        "/v1/providers/:namespace/:name/versions/:version/platforms";
    pub const PROVIDER_SHASUMS: &str = "/v1/providers/:namespace/:name/versions/:version/shasums";
    pub const PROVIDER_SHASUMS_SIG: &str =
        "/v1/providers/:namespace/:name/versions/:version/shasums-sig";
    pub const PROVIDER_BINARY: &str =
        "/v1/providers/:namespace/:name/versions/:version/platforms/:os/:arch/binary";

    pub const GPG_KEYS: &str = "/v1/gpg-keys";
    pub const GPG_KEY: &str = "/v1/gpg-keys/:namespace/:key_id";

    pub fn provider(namespace: &str, name: &str) -> String {
        format!("/v1/providers/{namespace}/{name}")
    }

    pub fn provider_versions(namespace: &str, name: &str) -> String {
        format!("/v1/providers/{namespace}/{name}/versions")
    }

    pub fn provider_platforms(namespace: &str, name: &str, version: &str) -> String {
        format!("/v1/providers/{namespace}/{name}/versions/{version}/platforms")
    }

    pub fn provider_shasums(namespace: &str, name: &str, version: &str) -> String {
        format!("/v1/providers/{namespace}/{name}/versions/{version}/shasums")
    }

    pub fn provider_shasums_sig(namespace: &str, name: &str, version: &str) -> String {
        format!("/v1/providers/{namespace}/{name}/versions/{version}/shasums-sig")
    }

    pub fn provider_binary(namespace: &str, name: &str, version: &str, os: &str, arch: &str) -> String {
        format!("/v1/providers/{namespace}/{name}/versions/{version}/platforms/{os}/{arch}/binary")
    }

    pub fn module_versions(namespace: &str, name: &str, provider: &str) -> String {
        format!("/v1/modules/{namespace}/{name}/{provider}/versions")
    }

    pub fn module_package(namespace: &str, name: &str, provider: &str, version: &str) -> String {
        format!("/v1/modules/{namespace}/{name}/{provider}/versions/{version}/package")
    }

    pub fn gpg_key(namespace: &str, key_id: &str) -> String {
        format!("/v1/gpg-keys/{namespace}/{key_id}")
    }
}

/// Health check response.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

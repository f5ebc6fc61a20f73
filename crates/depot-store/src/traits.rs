use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncRead;

use depot_types::{
    AvailableVersion, GpgPublicKey, ModuleRef, ModuleVersionRef, ModuleVersionUpload, Package,
    PlatformRef, ProviderPlatformUpload, ProviderRef, ProviderVersionUploads, VersionMetadata,
    VersionRef,
};

use crate::error::StoreResult;

/// A stored artifact opened for streaming to a client.
pub type ArtifactReader = Box<dyn AsyncRead + Send + Unpin>;

/// Provider artifacts: versions, platform binaries, checksum manifests and
/// namespace signing keys.
///
/// All implementations must satisfy these invariants:
/// - Every key comes from [`crate::layout`].
/// - Creating something that already exists succeeds and leaves stored
///   artifacts untouched.
/// - A missing resource is reported as `StoreError::NotExist` naming that
///   resource; other failures propagate unchanged.
/// - Backends that cannot stream bytes through the registry return
///   `StoreError::NotAllowed` from the `save_*`/`get_*` byte operations and
///   hand out presigned URLs from the create operations instead.
#[async_trait]
pub trait ProviderStore: Send + Sync {
    async fn create_provider(&self, provider: &ProviderRef) -> StoreResult<()>;

    /// Create a version container and return where its checksum manifest and
    /// signature should be uploaded.
    async fn create_provider_version(&self, version: &VersionRef) -> StoreResult<ProviderVersionUploads>;

    /// Create a platform container and return where its binary should be
    /// uploaded.
    async fn create_provider_platform(&self, platform: &PlatformRef) -> StoreResult<ProviderPlatformUpload>;

    async fn is_provider_created(&self, provider: &ProviderRef) -> StoreResult<()>;

    async fn is_provider_version_created(&self, version: &VersionRef) -> StoreResult<()>;

    /// Succeeds when the namespace holds at least one signing key.
    async fn is_gpg_key_created(&self, namespace: &str) -> StoreResult<()>;

    /// Store a decoded key under its key ID, replacing any previous copy.
    async fn save_gpg_key(&self, namespace: &str, key: &GpgPublicKey) -> StoreResult<()>;

    async fn get_gpg_key(&self, namespace: &str, key_id: &str) -> StoreResult<GpgPublicKey>;

    async fn save_version_metadata(&self, version: &VersionRef, metadata: &VersionMetadata) -> StoreResult<()>;

    async fn version_metadata(&self, version: &VersionRef) -> StoreResult<VersionMetadata>;

    async fn save_platform_binary(&self, platform: &PlatformRef, body: Bytes) -> StoreResult<()>;

    async fn save_shasums(&self, version: &VersionRef, body: Bytes) -> StoreResult<()>;

    async fn save_shasums_sig(&self, version: &VersionRef, body: Bytes) -> StoreResult<()>;

    async fn get_platform_binary(&self, platform: &PlatformRef) -> StoreResult<ArtifactReader>;

    async fn get_shasums(&self, version: &VersionRef) -> StoreResult<ArtifactReader>;

    async fn get_shasums_sig(&self, version: &VersionRef) -> StoreResult<ArtifactReader>;

    /// Versions of a provider and the platforms that have a binary. Entries
    /// that do not fit the layout are skipped.
    async fn list_available_versions(&self, provider: &ProviderRef) -> StoreResult<Vec<AvailableVersion>>;

    /// Resolve the full package descriptor for one platform binary.
    async fn find_package(&self, platform: &PlatformRef) -> StoreResult<Package>;
}

/// Module artifacts: one source package per module version.
#[async_trait]
pub trait ModuleStore: Send + Sync {
    async fn create_module(&self, module: &ModuleRef) -> StoreResult<()>;

    /// Create a version and return where its package should be uploaded.
    async fn create_module_version(&self, version: &ModuleVersionRef) -> StoreResult<ModuleVersionUpload>;

    async fn save_module_package(&self, version: &ModuleVersionRef, body: Bytes) -> StoreResult<()>;

    async fn get_module_package(&self, version: &ModuleVersionRef) -> StoreResult<ArtifactReader>;

    /// The URL a client should fetch the package from.
    async fn module_download_url(&self, version: &ModuleVersionRef) -> StoreResult<String>;

    async fn list_module_versions(&self, module: &ModuleRef) -> StoreResult<Vec<String>>;
}

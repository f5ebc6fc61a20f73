use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info, instrument, warn};

use depot_protocol::endpoints;
use depot_types::coords;
use depot_types::{
    AvailableVersion, GpgPublicKey, Package, PlatformRef, ProviderPlatformUpload, ProviderRef,
    ProviderVersionUploads, SigningKeys, VersionMetadata, VersionRef,
};

use super::{
    ensure_dir, hash_file, open, read_key, read_keys, require_dir, require_file, subdirectories, write_file,
    LocalBackend,
};
use crate::error::{Resource, StoreError, StoreResult};
use crate::layout::{self, sort_versions};
use crate::resolver::{resolve_package, PackageSource};
use crate::traits::{ArtifactReader, ProviderStore};

fn shasums_route(version: &VersionRef) -> String {
    endpoints::provider_shasums(version.namespace(), version.name(), version.version())
}

fn shasums_sig_route(version: &VersionRef) -> String {
    endpoints::provider_shasums_sig(version.namespace(), version.name(), version.version())
}

fn binary_route(platform: &PlatformRef) -> String {
    endpoints::provider_binary(
        platform.namespace(),
        platform.name(),
        platform.version(),
        platform.os(),
        platform.arch(),
    )
}

impl LocalBackend {
    /// Platforms of one version directory that hold their binary.
    async fn version_platforms(
        &self,
        provider: &ProviderRef,
        version: &str,
    ) -> StoreResult<AvailableVersion> {
        let version_ref = provider.version(version)?;
        let dir = self.path(&layout::version_root(&version_ref));
        let mut available = AvailableVersion::new(version);

        for entry in subdirectories(&dir, Resource::ProviderVersion).await? {
            let Some(platform) = self.patterns().parse_platform_dir(&entry) else {
                debug!(version, entry = %entry, "skipping non-platform directory");
                continue;
            };
            let platform_ref = version_ref.platform(&platform.os, &platform.arch)?;
            let binary = self.path(&layout::binary_key(&platform_ref));
            match require_file(&binary, Resource::ProviderBinary).await {
                Ok(()) => available.add_platform(platform),
                Err(StoreError::NotExist(_)) => {
                    debug!(platform = %platform_ref, "platform has no binary yet");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(available)
    }
}

#[async_trait]
impl ProviderStore for LocalBackend {
    #[instrument(skip(self), fields(provider = %provider))]
    async fn create_provider(&self, provider: &ProviderRef) -> StoreResult<()> {
        ensure_dir(&self.path(&layout::provider_root(provider))).await
    }

    #[instrument(skip(self), fields(version = %version))]
    async fn create_provider_version(&self, version: &VersionRef) -> StoreResult<ProviderVersionUploads> {
        ensure_dir(&self.path(&layout::version_root(version))).await?;
        Ok(ProviderVersionUploads {
            shasums_upload: shasums_route(version),
            shasums_sig_upload: shasums_sig_route(version),
        })
    }

    #[instrument(skip(self), fields(platform = %platform))]
    async fn create_provider_platform(&self, platform: &PlatformRef) -> StoreResult<ProviderPlatformUpload> {
        self.is_provider_version_created(platform.version_ref()).await?;
        ensure_dir(&self.path(&layout::platform_root(platform))).await?;
        Ok(ProviderPlatformUpload {
            provider_binary_upload: binary_route(platform),
        })
    }

    async fn is_provider_created(&self, provider: &ProviderRef) -> StoreResult<()> {
        require_dir(&self.path(&layout::provider_root(provider)), Resource::Provider).await
    }

    async fn is_provider_version_created(&self, version: &VersionRef) -> StoreResult<()> {
        require_dir(
            &self.path(&layout::version_root(version)),
            Resource::ProviderVersion,
        )
        .await
    }

    async fn is_gpg_key_created(&self, namespace: &str) -> StoreResult<()> {
        let namespace = coords::namespace(namespace)?;
        let keys = read_keys(&self.path(&layout::keys_root(namespace))).await?;
        if keys.is_empty() {
            return Err(StoreError::NotExist(Resource::ProviderGpgKey));
        }
        Ok(())
    }

    #[instrument(skip(self, key), fields(key_id = %key.key_id))]
    async fn save_gpg_key(&self, namespace: &str, key: &GpgPublicKey) -> StoreResult<()> {
        let namespace = coords::namespace(namespace)?;
        let key_id = coords::key_id(&key.key_id)?;
        let path = self.path(&layout::key_path(namespace, &key_id));
        write_file(path, Bytes::from(key.ascii_armor.clone())).await?;
        info!(namespace, key_id = %key_id, "stored signing key");
        Ok(())
    }

    async fn get_gpg_key(&self, namespace: &str, key_id: &str) -> StoreResult<GpgPublicKey> {
        let namespace = coords::namespace(namespace)?;
        let key_id = coords::key_id(key_id)?;
        read_key(&self.path(&layout::key_path(namespace, &key_id))).await
    }

    async fn save_version_metadata(&self, version: &VersionRef, metadata: &VersionMetadata) -> StoreResult<()> {
        self.is_provider_version_created(version).await?;
        let body = serde_json::to_vec(metadata)?;
        write_file(self.path(&layout::metadata_key(version)), Bytes::from(body)).await
    }

    async fn version_metadata(&self, version: &VersionRef) -> StoreResult<VersionMetadata> {
        let raw = tokio::fs::read(self.path(&layout::metadata_key(version)))
            .await
            .map_err(|e| StoreError::from_io(e, Resource::ProviderVersion))?;
        Ok(serde_json::from_slice(&raw)?)
    }

    #[instrument(skip(self, body), fields(platform = %platform, bytes = body.len()))]
    async fn save_platform_binary(&self, platform: &PlatformRef, body: Bytes) -> StoreResult<()> {
        self.is_provider_version_created(platform.version_ref()).await?;
        write_file(self.path(&layout::binary_key(platform)), body).await
    }

    #[instrument(skip(self, body), fields(version = %version, bytes = body.len()))]
    async fn save_shasums(&self, version: &VersionRef, body: Bytes) -> StoreResult<()> {
        self.is_provider_version_created(version).await?;
        write_file(self.path(&layout::shasums_key(version)), body).await
    }

    #[instrument(skip(self, body), fields(version = %version, bytes = body.len()))]
    async fn save_shasums_sig(&self, version: &VersionRef, body: Bytes) -> StoreResult<()> {
        self.is_provider_version_created(version).await?;
        write_file(self.path(&layout::shasums_sig_key(version)), body).await
    }

    async fn get_platform_binary(&self, platform: &PlatformRef) -> StoreResult<ArtifactReader> {
        self.is_provider_version_created(platform.version_ref()).await?;
        open(&self.path(&layout::binary_key(platform)), Resource::ProviderBinary).await
    }

    async fn get_shasums(&self, version: &VersionRef) -> StoreResult<ArtifactReader> {
        self.is_provider_version_created(version).await?;
        open(&self.path(&layout::shasums_key(version)), Resource::ChecksumManifest).await
    }

    async fn get_shasums_sig(&self, version: &VersionRef) -> StoreResult<ArtifactReader> {
        self.is_provider_version_created(version).await?;
        open(
            &self.path(&layout::shasums_sig_key(version)),
            Resource::ManifestSignature,
        )
        .await
    }

    #[instrument(skip(self), fields(provider = %provider))]
    async fn list_available_versions(&self, provider: &ProviderRef) -> StoreResult<Vec<AvailableVersion>> {
        self.is_provider_created(provider).await?;
        let dir = self.path(&layout::versions_root(provider));
        // No versions directory until the first version is created.
        let entries = match subdirectories(&dir, Resource::Provider).await {
            Err(e) if e.is_not_exist() => Vec::new(),
            other => other?,
        };

        let mut versions = Vec::new();
        for entry in entries {
            if semver::Version::parse(&entry).is_err() {
                warn!(entry = %entry, "skipping non-version directory");
                continue;
            }
            let available = self.version_platforms(provider, &entry).await?;
            if available.platforms.is_empty() {
                debug!(version = %entry, "version has no binaries");
                continue;
            }
            versions.push(available);
        }

        sort_versions(&mut versions, |v| v.version.as_str());
        debug!(count = versions.len(), "listed provider versions");
        Ok(versions)
    }

    async fn find_package(&self, platform: &PlatformRef) -> StoreResult<Package> {
        self.is_provider_version_created(platform.version_ref()).await?;
        resolve_package(self, platform).await
    }
}

#[async_trait]
impl PackageSource for LocalBackend {
    async fn signing_keys(&self, namespace: &str) -> StoreResult<SigningKeys> {
        let keys = read_keys(&self.path(&layout::keys_root(namespace))).await?;
        Ok(SigningKeys::new(keys))
    }

    async fn binary_digest(&self, platform: &PlatformRef) -> StoreResult<String> {
        hash_file(&self.path(&layout::binary_key(platform)), Resource::ProviderBinary).await
    }

    async fn binary_url(&self, platform: &PlatformRef) -> StoreResult<String> {
        Ok(binary_route(platform))
    }

    async fn shasums_url(&self, version: &VersionRef) -> StoreResult<String> {
        Ok(shasums_route(version))
    }

    async fn shasums_signature_url(&self, version: &VersionRef) -> StoreResult<String> {
        Ok(shasums_sig_route(version))
    }
}

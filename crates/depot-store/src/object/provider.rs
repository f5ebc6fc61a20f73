use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{future, StreamExt};
use http::Method;
use object_store::path::Path;
use tracing::{debug, instrument};

use depot_crypto::{decode_public_key, KeyError, Sha256Hasher};
use depot_types::coords;
use depot_types::{
    AvailableVersion, GpgPublicKey, Package, PlatformRef, ProviderPlatformUpload, ProviderRef,
    ProviderVersionUploads, SigningKeys, VersionMetadata, VersionRef,
};

use super::ObjectStorageBackend;
use crate::error::{Resource, StoreError, StoreResult};
use crate::layout::{self, sort_versions};
use crate::resolver::{resolve_package, PackageSource};
use crate::traits::{ArtifactReader, ProviderStore};

impl ObjectStorageBackend {
    /// Fetch and decode one stored key object.
    async fn read_key(&self, location: Path) -> StoreResult<GpgPublicKey> {
        let corrupt = |source: KeyError| StoreError::CorruptKey {
            key: location.to_string(),
            source,
        };
        let raw = self
            .store
            .get(&location)
            .await
            .map_err(|e| StoreError::from_object_store(e, Resource::ProviderGpgKey))?
            .bytes()
            .await?;
        let armored =
            std::str::from_utf8(&raw).map_err(|e| corrupt(KeyError::Armor(e.to_string())))?;
        decode_public_key(armored).map_err(corrupt)
    }
}

#[async_trait]
impl ProviderStore for ObjectStorageBackend {
    async fn create_provider(&self, provider: &ProviderRef) -> StoreResult<()> {
        debug!(provider = %provider, "providers have no objects until a version is published");
        Ok(())
    }

    #[instrument(skip(self), fields(version = %version))]
    async fn create_provider_version(&self, version: &VersionRef) -> StoreResult<ProviderVersionUploads> {
        let shasums = layout::shasums_key(version);
        let shasums_sig = layout::shasums_sig_key(version);
        let (shasums_upload, shasums_sig_upload) = tokio::try_join!(
            self.sign(Method::PUT, &shasums),
            self.sign(Method::PUT, &shasums_sig),
        )?;
        Ok(ProviderVersionUploads {
            shasums_upload,
            shasums_sig_upload,
        })
    }

    #[instrument(skip(self), fields(platform = %platform))]
    async fn create_provider_platform(&self, platform: &PlatformRef) -> StoreResult<ProviderPlatformUpload> {
        Ok(ProviderPlatformUpload {
            provider_binary_upload: self.sign(Method::PUT, &layout::binary_key(platform)).await?,
        })
    }

    async fn is_provider_created(&self, _provider: &ProviderRef) -> StoreResult<()> {
        Ok(())
    }

    async fn is_provider_version_created(&self, version: &VersionRef) -> StoreResult<()> {
        if self.any_below(&layout::version_root(version)).await? {
            Ok(())
        } else {
            Err(StoreError::NotExist(Resource::ProviderVersion))
        }
    }

    async fn is_gpg_key_created(&self, namespace: &str) -> StoreResult<()> {
        let namespace = coords::namespace(namespace)?;
        if self.any_below(&layout::keys_root(namespace)).await? {
            Ok(())
        } else {
            Err(StoreError::NotExist(Resource::ProviderGpgKey))
        }
    }

    #[instrument(skip(self, key), fields(key_id = %key.key_id))]
    async fn save_gpg_key(&self, namespace: &str, key: &GpgPublicKey) -> StoreResult<()> {
        let namespace = coords::namespace(namespace)?;
        let key_id = coords::key_id(&key.key_id)?;
        self.put(
            &layout::key_path(namespace, &key_id),
            Bytes::from(key.ascii_armor.clone()),
        )
        .await
    }

    async fn get_gpg_key(&self, namespace: &str, key_id: &str) -> StoreResult<GpgPublicKey> {
        let namespace = coords::namespace(namespace)?;
        let key_id = coords::key_id(key_id)?;
        self.read_key(Path::from(layout::key_path(namespace, &key_id)))
            .await
    }

    async fn save_version_metadata(&self, version: &VersionRef, metadata: &VersionMetadata) -> StoreResult<()> {
        let body = serde_json::to_vec(metadata)?;
        self.put(&layout::metadata_key(version), Bytes::from(body)).await
    }

    async fn version_metadata(&self, version: &VersionRef) -> StoreResult<VersionMetadata> {
        let raw = self
            .store
            .get(&Path::from(layout::metadata_key(version)))
            .await
            .map_err(|e| StoreError::from_object_store(e, Resource::ProviderVersion))?
            .bytes()
            .await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    async fn save_platform_binary(&self, _platform: &PlatformRef, _body: Bytes) -> StoreResult<()> {
        Err(StoreError::not_allowed("uploading a provider binary"))
    }

    async fn save_shasums(&self, _version: &VersionRef, _body: Bytes) -> StoreResult<()> {
        Err(StoreError::not_allowed("uploading a checksum manifest"))
    }

    async fn save_shasums_sig(&self, _version: &VersionRef, _body: Bytes) -> StoreResult<()> {
        Err(StoreError::not_allowed("uploading a manifest signature"))
    }

    async fn get_platform_binary(&self, _platform: &PlatformRef) -> StoreResult<ArtifactReader> {
        Err(StoreError::not_allowed("downloading a provider binary"))
    }

    async fn get_shasums(&self, _version: &VersionRef) -> StoreResult<ArtifactReader> {
        Err(StoreError::not_allowed("downloading a checksum manifest"))
    }

    async fn get_shasums_sig(&self, _version: &VersionRef) -> StoreResult<ArtifactReader> {
        Err(StoreError::not_allowed("downloading a manifest signature"))
    }

    #[instrument(skip(self), fields(provider = %provider))]
    async fn list_available_versions(&self, provider: &ProviderRef) -> StoreResult<Vec<AvailableVersion>> {
        let mut grouped: BTreeMap<String, AvailableVersion> = BTreeMap::new();

        for object in self.list(&layout::versions_root(provider)).await? {
            let Some(filename) = object.location.filename() else {
                continue;
            };
            let Some(parsed) = self.patterns().parse_binary(filename) else {
                continue;
            };
            if parsed.name != provider.name() {
                debug!(location = %object.location, "binary belongs to another provider");
                continue;
            }
            let platform = provider
                .version(&parsed.version)?
                .platform(&parsed.platform.os, &parsed.platform.arch)?;
            if object.location.as_ref() != layout::binary_key(&platform) {
                debug!(location = %object.location, "binary outside its platform directory");
                continue;
            }
            grouped
                .entry(parsed.version.clone())
                .or_insert_with(|| AvailableVersion::new(parsed.version))
                .add_platform(parsed.platform);
        }

        let mut versions: Vec<_> = grouped.into_values().collect();
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
impl PackageSource for ObjectStorageBackend {
    async fn signing_keys(&self, namespace: &str) -> StoreResult<SigningKeys> {
        let objects = self.list(&layout::keys_root(namespace)).await?;
        let mut keys =
            future::try_join_all(objects.into_iter().map(|o| self.read_key(o.location))).await?;
        keys.sort_by(|a, b| a.key_id.cmp(&b.key_id));
        Ok(SigningKeys::new(keys))
    }

    async fn binary_digest(&self, platform: &PlatformRef) -> StoreResult<String> {
        let mut stream = self
            .store
            .get(&Path::from(layout::binary_key(platform)))
            .await
            .map_err(|e| StoreError::from_object_store(e, Resource::ProviderBinary))?
            .into_stream();

        let mut hasher = Sha256Hasher::new();
        while let Some(chunk) = stream.next().await {
            hasher.update(&chunk?);
        }
        debug!(bytes = hasher.len(), "hashed binary object");
        Ok(hasher.finalize_hex())
    }

    async fn binary_url(&self, platform: &PlatformRef) -> StoreResult<String> {
        let key = layout::binary_key(platform);
        self.head(&key, Resource::ProviderBinary).await?;
        self.sign(Method::GET, &key).await
    }

    async fn shasums_url(&self, version: &VersionRef) -> StoreResult<String> {
        let key = layout::shasums_key(version);
        self.head(&key, Resource::ChecksumManifest).await?;
        self.sign(Method::GET, &key).await
    }

    async fn shasums_signature_url(&self, version: &VersionRef) -> StoreResult<String> {
        let key = layout::shasums_sig_key(version);
        self.head(&key, Resource::ManifestSignature).await?;
        self.sign(Method::GET, &key).await
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;
    use object_store::ObjectStore;

    use super::super::testing::*;
    use super::*;

    const ED25519: &str = include_str!("../../../depot-crypto/tests/fixtures/ed25519_public.asc");
    const RSA: &str = include_str!("../../../depot-crypto/tests/fixtures/rsa_public.asc");

    fn version() -> VersionRef {
        VersionRef::new("acme", "widget", "1.0.0").unwrap()
    }

    fn platform() -> PlatformRef {
        version().platform("linux", "amd64").unwrap()
    }

    #[tokio::test]
    async fn create_issues_put_urls_and_writes_nothing() {
        let (store, backend) = backend();
        backend.create_provider(version().provider()).await.unwrap();
        let uploads = backend.create_provider_version(&version()).await.unwrap();
        assert_eq!(
            uploads.shasums_upload,
            format!("{BASE}/providers/acme/widget/versions/1.0.0/terraform-provider-widget_1.0.0_SHA256SUMS")
        );
        assert!(uploads.shasums_sig_upload.ends_with("_SHA256SUMS.sig"));

        let upload = backend.create_provider_platform(&platform()).await.unwrap();
        assert!(upload
            .provider_binary_upload
            .ends_with("/linux-amd64/terraform-provider-widget_1.0.0_linux_amd64.zip"));

        // A second create is a no-op too.
        backend.create_provider_version(&version()).await.unwrap();
        let listed: Vec<_> = store.list(None).try_collect().await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn byte_transfers_are_not_allowed() {
        let (_store, backend) = backend();
        let err = backend
            .save_platform_binary(&platform(), Bytes::from_static(b"zip"))
            .await
            .unwrap_err();
        assert!(err.is_not_allowed());
        assert!(backend
            .save_shasums(&version(), Bytes::new())
            .await
            .unwrap_err()
            .is_not_allowed());
        assert!(backend.get_shasums_sig(&version()).await.err().unwrap().is_not_allowed());
        assert!(backend.get_platform_binary(&platform()).await.err().unwrap().is_not_allowed());
    }

    #[tokio::test]
    async fn version_exists_once_metadata_is_written() {
        let (_store, backend) = backend();
        backend.is_provider_created(version().provider()).await.unwrap();
        assert_eq!(
            backend
                .is_provider_version_created(&version())
                .await
                .unwrap_err()
                .missing(),
            Some(Resource::ProviderVersion)
        );
        backend
            .save_version_metadata(&version(), &VersionMetadata::new("8442047DE3AAFF63"))
            .await
            .unwrap();
        backend.is_provider_version_created(&version()).await.unwrap();
        assert_eq!(
            backend.version_metadata(&version()).await.unwrap().key_id,
            "8442047DE3AAFF63"
        );
    }

    #[tokio::test]
    async fn keys_round_trip_verbatim() {
        let (_store, backend) = backend();
        assert!(backend.is_gpg_key_created("acme").await.is_err());

        let key = decode_public_key(ED25519).unwrap();
        backend.save_gpg_key("acme", &key).await.unwrap();
        backend.is_gpg_key_created("acme").await.unwrap();
        let stored = backend.get_gpg_key("acme", &key.key_id).await.unwrap();
        assert_eq!(stored.ascii_armor, ED25519);
        assert_eq!(stored.key_id, key.key_id);

        let err = backend.get_gpg_key("acme", "0000000000000000").await.unwrap_err();
        assert_eq!(err.missing(), Some(Resource::ProviderGpgKey));
    }

    #[tokio::test]
    async fn lists_binaries_grouped_by_version() {
        let (store, backend) = backend();
        let root = "providers/acme/widget/versions";
        put_raw(&store, &format!("{root}/1.10.0/linux-amd64/terraform-provider-widget_1.10.0_linux_amd64.zip"), b"a").await;
        put_raw(&store, &format!("{root}/1.2.0/linux-amd64/terraform-provider-widget_1.2.0_linux_amd64.zip"), b"b").await;
        put_raw(&store, &format!("{root}/1.2.0/darwin-arm64/terraform-provider-widget_1.2.0_darwin_arm64.zip"), b"c").await;
        put_raw(&store, &format!("{root}/1.2.0/terraform-provider-widget_1.2.0_SHA256SUMS"), b"d").await;
        put_raw(&store, &format!("{root}/1.2.0/metadata.json"), b"{}").await;
        // Misplaced or foreign binaries are skipped.
        put_raw(&store, &format!("{root}/1.2.0/terraform-provider-widget_1.2.0_windows_amd64.zip"), b"e").await;
        put_raw(&store, &format!("{root}/1.3.0/linux-amd64/terraform-provider-gadget_1.3.0_linux_amd64.zip"), b"f").await;

        let listed = backend
            .list_available_versions(version().provider())
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].version, "1.2.0");
        let mut platforms: Vec<_> = listed[0].platforms.iter().map(|p| p.to_string()).collect();
        platforms.sort();
        assert_eq!(platforms, vec!["darwin_arm64", "linux_amd64"]);
        assert_eq!(listed[1].version, "1.10.0");
    }

    #[tokio::test]
    async fn empty_provider_lists_nothing() {
        let (_store, backend) = backend();
        assert!(backend
            .list_available_versions(version().provider())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn resolves_package_with_presigned_urls() {
        let (store, backend) = backend();
        let body = vec![42u8; 1024];
        backend
            .save_version_metadata(&version(), &VersionMetadata::new("8442047DE3AAFF63"))
            .await
            .unwrap();
        put_raw(&store, &layout::binary_key(&platform()), &body).await;
        put_raw(&store, &layout::shasums_key(&version()), &[b'0'; 64]).await;
        put_raw(&store, &layout::shasums_sig_key(&version()), b"sig").await;
        backend
            .save_gpg_key("acme", &decode_public_key(RSA).unwrap())
            .await
            .unwrap();

        let pkg = backend.find_package(&platform()).await.unwrap();
        assert_eq!(pkg.shasum, depot_crypto::sha256_hex(&body));
        assert_eq!(
            pkg.download_url,
            format!("{BASE}/{}", layout::binary_key(&platform()))
        );
        assert_eq!(
            pkg.shasums_signature_url,
            format!("{BASE}/{}", layout::shasums_sig_key(&version()))
        );
        assert!(pkg.signing_keys.contains("C04521F4E263C3C4"));
    }

    #[tokio::test]
    async fn missing_objects_surface_as_not_exist() {
        let (store, backend) = backend();
        let err = backend.find_package(&platform()).await.unwrap_err();
        assert_eq!(err.missing(), Some(Resource::ProviderVersion));

        backend
            .save_version_metadata(&version(), &VersionMetadata::new("8442047DE3AAFF63"))
            .await
            .unwrap();
        put_raw(&store, &layout::shasums_key(&version()), b"sums").await;
        put_raw(&store, &layout::shasums_sig_key(&version()), b"sig").await;
        let err = backend.find_package(&platform()).await.unwrap_err();
        assert_eq!(err.missing(), Some(Resource::ProviderBinary));

        put_raw(&store, &layout::binary_key(&platform()), b"zip").await;
        store
            .delete(&Path::from(layout::shasums_sig_key(&version())))
            .await
            .unwrap();
        let err = backend.find_package(&platform()).await.unwrap_err();
        assert_eq!(err.missing(), Some(Resource::ManifestSignature));
    }

    #[tokio::test]
    async fn corrupt_key_object_fails_resolution() {
        let (store, backend) = backend();
        put_raw(&store, &layout::binary_key(&platform()), b"zip").await;
        put_raw(&store, &layout::shasums_key(&version()), b"sums").await;
        put_raw(&store, &layout::shasums_sig_key(&version()), b"sig").await;
        put_raw(&store, &layout::key_path("acme", "DEADBEEFDEADBEEF"), b"\xff\xfe").await;

        let err = backend.find_package(&platform()).await.unwrap_err();
        assert!(matches!(err, StoreError::CorruptKey { .. }));
    }
}

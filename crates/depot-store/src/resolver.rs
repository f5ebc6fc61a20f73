//! Package resolution.
//!
//! A [`Package`] is assembled from five independent lookups: the namespace's
//! signing keys, the binary's digest, and access URLs for the binary, the
//! checksum manifest and its signature. They run concurrently and the first
//! failure ends the whole resolution. The lookups still in flight are dropped,
//! which cancels their I/O.

use async_trait::async_trait;
use tracing::{debug, instrument};

use depot_types::{Package, PlatformRef, SigningKeys, VersionRef};

use crate::error::StoreResult;
use crate::layout;

/// The five lookups a backend provides for resolution.
#[async_trait]
pub trait PackageSource: Send + Sync {
    /// Every signing key of the namespace. A key that fails to decode fails
    /// the call.
    async fn signing_keys(&self, namespace: &str) -> StoreResult<SigningKeys>;

    /// Lowercase hex SHA-256 of the stored binary.
    async fn binary_digest(&self, platform: &PlatformRef) -> StoreResult<String>;

    async fn binary_url(&self, platform: &PlatformRef) -> StoreResult<String>;

    async fn shasums_url(&self, version: &VersionRef) -> StoreResult<String>;

    async fn shasums_signature_url(&self, version: &VersionRef) -> StoreResult<String>;
}

/// Resolve a package descriptor. Never returns a partial result.
#[instrument(skip_all, fields(platform = %platform))]
pub async fn resolve_package<S>(source: &S, platform: &PlatformRef) -> StoreResult<Package>
where
    S: PackageSource + ?Sized,
{
    let version = platform.version_ref();
    let (signing_keys, shasum, download_url, shasums_url, shasums_signature_url) = tokio::try_join!(
        source.signing_keys(platform.namespace()),
        source.binary_digest(platform),
        source.binary_url(platform),
        source.shasums_url(version),
        source.shasums_signature_url(version),
    )?;

    debug!(
        shasum = %shasum,
        keys = signing_keys.gpg_public_keys.len(),
        "resolved package"
    );

    Ok(Package {
        os: platform.os().to_string(),
        arch: platform.arch().to_string(),
        filename: layout::binary_filename(platform),
        download_url,
        shasums_url,
        shasums_signature_url,
        shasum,
        signing_keys,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use depot_types::GpgPublicKey;

    use super::*;
    use crate::error::{Resource, StoreError};

    #[derive(Default)]
    struct FakeSource {
        fail_keys: bool,
        missing_binary: bool,
        hang_digest: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PackageSource for FakeSource {
        async fn signing_keys(&self, namespace: &str) -> StoreResult<SigningKeys> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_keys {
                return Err(StoreError::Config(format!("corrupt keys in {namespace}")));
            }
            Ok(SigningKeys::new(vec![GpgPublicKey {
                key_id: "8442047DE3AAFF63".into(),
                ascii_armor: "armor".into(),
            }]))
        }

        async fn binary_digest(&self, _platform: &PlatformRef) -> StoreResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang_digest {
                std::future::pending::<()>().await;
            }
            if self.missing_binary {
                return Err(StoreError::NotExist(Resource::ProviderBinary));
            }
            Ok("ab".repeat(32))
        }

        async fn binary_url(&self, platform: &PlatformRef) -> StoreResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("/bin/{}", platform.os()))
        }

        async fn shasums_url(&self, version: &VersionRef) -> StoreResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("/sums/{}", version.version()))
        }

        async fn shasums_signature_url(&self, version: &VersionRef) -> StoreResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("/sig/{}", version.version()))
        }
    }

    fn platform() -> PlatformRef {
        PlatformRef::new("acme", "widget", "1.0.0", "linux", "amd64").unwrap()
    }

    #[tokio::test]
    async fn assembles_package() {
        let source = FakeSource::default();
        let pkg = resolve_package(&source, &platform()).await.unwrap();
        assert_eq!(pkg.filename, "terraform-provider-widget_1.0.0_linux_amd64.zip");
        assert_eq!(pkg.download_url, "/bin/linux");
        assert_eq!(pkg.shasums_url, "/sums/1.0.0");
        assert_eq!(pkg.shasums_signature_url, "/sig/1.0.0");
        assert_eq!(pkg.shasum, "ab".repeat(32));
        assert!(pkg.signing_keys.contains("8442047DE3AAFF63"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn key_failure_fails_whole_resolution() {
        let source = FakeSource {
            fail_keys: true,
            ..Default::default()
        };
        let err = resolve_package(&source, &platform()).await.unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[tokio::test]
    async fn first_error_cancels_pending_lookups() {
        let source = FakeSource {
            fail_keys: true,
            hang_digest: true,
            ..Default::default()
        };
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            resolve_package(&source, &platform()),
        )
        .await
        .expect("resolution must not wait for the stalled lookup");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn missing_binary_is_reported_as_such() {
        let source = FakeSource {
            missing_binary: true,
            ..Default::default()
        };
        let err = resolve_package(&source, &platform()).await.unwrap_err();
        assert_eq!(err.missing(), Some(Resource::ProviderBinary));
    }

    #[tokio::test]
    async fn works_through_trait_object() {
        let source: Box<dyn PackageSource> = Box::new(FakeSource::default());
        assert!(resolve_package(source.as_ref(), &platform()).await.is_ok());
    }
}

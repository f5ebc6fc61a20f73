//! Object storage backend.
//!
//! Bytes never pass through the registry here. Create operations hand out
//! presigned PUT URLs, resolution hands out presigned GET URLs, and the byte
//! operations return [`StoreError::NotAllowed`]. Only signing keys and
//! version metadata are written directly.

mod module;
mod provider;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use http::Method;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::{ObjectMeta, ObjectStore, PutPayload};
use tracing::{debug, info};
use url::Url;

use crate::config::S3Config;
use crate::error::{Resource, StoreError, StoreResult};
use crate::layout::FilenamePatterns;

/// How long presigned URLs stay valid.
pub const PRESIGN_EXPIRY: Duration = Duration::from_secs(15 * 60);

/// Artifacts stored as objects in a bucket.
#[derive(Clone, Debug)]
pub struct ObjectStorageBackend {
    store: Arc<dyn ObjectStore>,
    signer: Arc<dyn Signer>,
    patterns: Arc<FilenamePatterns>,
}

impl ObjectStorageBackend {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        signer: Arc<dyn Signer>,
        patterns: Arc<FilenamePatterns>,
    ) -> Self {
        Self {
            store,
            signer,
            patterns,
        }
    }

    /// Connect to an S3 or S3-compatible bucket. The client also signs URLs.
    pub fn from_s3(config: &S3Config, patterns: Arc<FilenamePatterns>) -> StoreResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(&config.bucket)
            .with_allow_http(config.allow_http)
            .with_virtual_hosted_style_request(!config.use_path_style && config.endpoint.is_none());

        if let Some(region) = &config.region {
            builder = builder.with_region(region);
        }
        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint);
        }
        if let Some(access_key) = &config.access_key {
            builder = builder.with_access_key_id(access_key);
        }
        if let Some(secret_key) = &config.secret_key {
            builder = builder.with_secret_access_key(secret_key);
        }

        let s3 = Arc::new(
            builder
                .build()
                .map_err(|e| StoreError::Config(format!("failed to create S3 client: {e}")))?,
        );
        info!(bucket = %config.bucket, endpoint = ?config.endpoint, "connected object storage");
        Ok(Self::new(s3.clone(), s3, patterns))
    }

    fn patterns(&self) -> &FilenamePatterns {
        &self.patterns
    }

    /// A presigned URL for `method` on `key`.
    async fn sign(&self, method: Method, key: &str) -> StoreResult<String> {
        let url = self
            .signer
            .signed_url(method.clone(), &Path::from(key), PRESIGN_EXPIRY)
            .await?;
        debug!(%method, key, "presigned url");
        Ok(url.to_string())
    }

    /// Fail with `missing` unless `key` exists.
    async fn head(&self, key: &str, missing: Resource) -> StoreResult<ObjectMeta> {
        self.store
            .head(&Path::from(key))
            .await
            .map_err(|e| StoreError::from_object_store(e, missing))
    }

    async fn put(&self, key: &str, body: impl Into<PutPayload>) -> StoreResult<()> {
        self.store.put(&Path::from(key), body.into()).await?;
        debug!(key, "put object");
        Ok(())
    }

    /// Every object below `prefix`. The prefix matches whole path segments.
    async fn list(&self, prefix: &str) -> StoreResult<Vec<ObjectMeta>> {
        let prefix = Path::from(prefix);
        Ok(self.store.list(Some(&prefix)).try_collect().await?)
    }

    /// Whether anything exists below `prefix`, without listing all of it.
    async fn any_below(&self, prefix: &str) -> StoreResult<bool> {
        let prefix = Path::from(prefix);
        let first = self.store.list(Some(&prefix)).try_next().await?;
        Ok(first.is_some())
    }
}

/// Issues plain, unsigned URLs below a base URL.
///
/// For stores that are publicly readable or sit behind an authenticating
/// proxy, and for tests against in-memory stores.
#[derive(Clone, Debug)]
pub struct PassthroughSigner {
    base_url: Url,
}

impl PassthroughSigner {
    pub fn new(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { base_url }
    }
}

#[async_trait]
impl Signer for PassthroughSigner {
    async fn signed_url(
        &self,
        _method: Method,
        path: &Path,
        _expires_in: Duration,
    ) -> object_store::Result<Url> {
        self.base_url
            .join(path.as_ref())
            .map_err(|e| object_store::Error::Generic {
                store: "passthrough",
                source: Box::new(e),
            })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use object_store::memory::InMemory;

    use super::*;

    pub(crate) const BASE: &str = "http://bucket.test/depot";

    pub(crate) fn backend() -> (Arc<InMemory>, ObjectStorageBackend) {
        let store = Arc::new(InMemory::new());
        let signer = Arc::new(PassthroughSigner::new(Url::parse(BASE).unwrap()));
        let backend =
            ObjectStorageBackend::new(store.clone(), signer, Arc::new(FilenamePatterns::new()));
        (store, backend)
    }

    pub(crate) async fn put_raw(store: &InMemory, key: &str, body: &[u8]) {
        store
            .put(&Path::from(key), PutPayload::from(body.to_vec()))
            .await
            .unwrap();
    }
}

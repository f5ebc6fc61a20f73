use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use tracing::{debug, instrument};

use depot_types::{ModuleRef, ModuleVersionRef, ModuleVersionUpload};

use super::ObjectStorageBackend;
use crate::error::{Resource, StoreError, StoreResult};
use crate::layout::{self, sort_versions};
use crate::traits::{ArtifactReader, ModuleStore};

/// Recover the version from a `terraform-{provider}-{name}-{version}.tar.gz`
/// filename belonging to `module`.
fn package_version<'a>(module: &ModuleRef, filename: &'a str) -> Option<&'a str> {
    let prefix = format!("terraform-{}-{}-", module.provider(), module.name());
    let version = filename.strip_prefix(&prefix)?.strip_suffix(".tar.gz")?;
    semver::Version::parse(version).ok()?;
    Some(version)
}

#[async_trait]
impl ModuleStore for ObjectStorageBackend {
    async fn create_module(&self, module: &ModuleRef) -> StoreResult<()> {
        debug!(module = %module, "modules have no objects until a package is uploaded");
        Ok(())
    }

    #[instrument(skip(self), fields(version = %version))]
    async fn create_module_version(&self, version: &ModuleVersionRef) -> StoreResult<ModuleVersionUpload> {
        Ok(ModuleVersionUpload {
            upload: self
                .sign(Method::PUT, &layout::module_package_key(version))
                .await?,
        })
    }

    async fn save_module_package(&self, _version: &ModuleVersionRef, _body: Bytes) -> StoreResult<()> {
        Err(StoreError::not_allowed("uploading a module package"))
    }

    async fn get_module_package(&self, _version: &ModuleVersionRef) -> StoreResult<ArtifactReader> {
        Err(StoreError::not_allowed("downloading a module package"))
    }

    async fn module_download_url(&self, version: &ModuleVersionRef) -> StoreResult<String> {
        let key = layout::module_package_key(version);
        self.head(&key, Resource::Module).await?;
        self.sign(Method::GET, &key).await
    }

    async fn list_module_versions(&self, module: &ModuleRef) -> StoreResult<Vec<String>> {
        let mut versions: Vec<String> = self
            .list(&layout::module_versions_root(module))
            .await?
            .iter()
            .filter_map(|object| package_version(module, object.location.filename()?))
            .map(str::to_string)
            .collect();
        sort_versions(&mut versions, |v| v.as_str());
        versions.dedup();
        Ok(versions)
    }
}

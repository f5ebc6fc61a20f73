use async_trait::async_trait;
use bytes::Bytes;
use tracing::{instrument, warn};

use depot_protocol::endpoints;
use depot_types::{ModuleRef, ModuleVersionRef, ModuleVersionUpload};

use super::{ensure_dir, open, require_dir, require_file, subdirectories, write_file, LocalBackend};
use crate::error::{Resource, StoreResult};
use crate::layout::{self, sort_versions};
use crate::traits::{ArtifactReader, ModuleStore};

fn package_route(version: &ModuleVersionRef) -> String {
    endpoints::module_package(
        version.namespace(),
        version.name(),
        version.provider(),
        version.version(),
    )
}

#[async_trait]
impl ModuleStore for LocalBackend {
    #[instrument(skip(self), fields(module = %module))]
    async fn create_module(&self, module: &ModuleRef) -> StoreResult<()> {
        ensure_dir(&self.path(&layout::module_root(module))).await
    }

    #[instrument(skip(self), fields(version = %version))]
    async fn create_module_version(&self, version: &ModuleVersionRef) -> StoreResult<ModuleVersionUpload> {
        ensure_dir(&self.path(&layout::module_version_root(version))).await?;
        Ok(ModuleVersionUpload {
            upload: package_route(version),
        })
    }

    #[instrument(skip(self, body), fields(version = %version, bytes = body.len()))]
    async fn save_module_package(&self, version: &ModuleVersionRef, body: Bytes) -> StoreResult<()> {
        require_dir(
            &self.path(&layout::module_version_root(version)),
            Resource::Module,
        )
        .await?;
        write_file(self.path(&layout::module_package_key(version)), body).await
    }

    async fn get_module_package(&self, version: &ModuleVersionRef) -> StoreResult<ArtifactReader> {
        open(&self.path(&layout::module_package_key(version)), Resource::Module).await
    }

    async fn module_download_url(&self, version: &ModuleVersionRef) -> StoreResult<String> {
        require_file(&self.path(&layout::module_package_key(version)), Resource::Module).await?;
        Ok(package_route(version))
    }

    async fn list_module_versions(&self, module: &ModuleRef) -> StoreResult<Vec<String>> {
        let dir = self.path(&layout::module_versions_root(module));
        let mut versions: Vec<String> = subdirectories(&dir, Resource::Module)
            .await?
            .into_iter()
            .filter(|entry| {
                let valid = semver::Version::parse(entry).is_ok();
                if !valid {
                    warn!(module = %module, entry = %entry, "skipping non-version directory");
                }
                valid
            })
            .collect();
        sort_versions(&mut versions, |v| v.as_str());
        Ok(versions)
    }
}

use std::sync::Arc;

use tracing::info;

use crate::backend::Backend;
use crate::config::BackendConfig;
use crate::error::StoreResult;
use crate::layout::FilenamePatterns;
use crate::local::LocalBackend;
use crate::object::ObjectStorageBackend;
use crate::traits::{ModuleStore, ProviderStore};

/// Entry point for the HTTP layer: one configured backend, shared by every
/// request and never reconfigured.
#[derive(Clone, Debug)]
pub struct Driver {
    backend: Arc<Backend>,
}

impl Driver {
    pub fn new(backend: impl Into<Backend>) -> Self {
        Self {
            backend: Arc::new(backend.into()),
        }
    }

    /// Build the backend a configuration names. Filename patterns are
    /// compiled here, once per process.
    pub fn from_config(config: &BackendConfig) -> StoreResult<Self> {
        let patterns = Arc::new(FilenamePatterns::new());
        let backend = match config {
            BackendConfig::Local(local) => {
                Backend::Local(LocalBackend::new(&local.root_path, patterns))
            }
            BackendConfig::S3(s3) => {
                Backend::ObjectStorage(ObjectStorageBackend::from_s3(s3, patterns)?)
            }
        };
        info!(backend = backend.kind(), "storage driver ready");
        Ok(Self::new(backend))
    }

    pub fn provider(&self) -> &dyn ProviderStore {
        self.backend.provider()
    }

    pub fn module(&self) -> &dyn ModuleStore {
        self.backend.module()
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }
}

use crate::local::LocalBackend;
use crate::object::ObjectStorageBackend;
use crate::traits::{ModuleStore, ProviderStore};

/// The storage backend, chosen once at startup.
#[derive(Clone, Debug)]
pub enum Backend {
    Local(LocalBackend),
    ObjectStorage(ObjectStorageBackend),
}

impl Backend {
    pub fn provider(&self) -> &dyn ProviderStore {
        match self {
            Self::Local(b) => b,
            Self::ObjectStorage(b) => b,
        }
    }

    pub fn module(&self) -> &dyn ModuleStore {
        match self {
            Self::Local(b) => b,
            Self::ObjectStorage(b) => b,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::ObjectStorage(_) => "s3",
        }
    }
}

impl From<LocalBackend> for Backend {
    fn from(backend: LocalBackend) -> Self {
        Self::Local(backend)
    }
}

impl From<ObjectStorageBackend> for Backend {
    fn from(backend: ObjectStorageBackend) -> Self {
        Self::ObjectStorage(backend)
    }
}

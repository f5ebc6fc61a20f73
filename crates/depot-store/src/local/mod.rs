//! Local filesystem backend.
//!
//! Keys from [`crate::layout`] are paths below a root directory. Containers
//! are real directories, bytes are streamed through the registry, and the
//! URLs handed out are the registry's own routes.

mod module;
mod provider;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use depot_crypto::{decode_public_key, KeyError, Sha256Hasher};
use depot_types::GpgPublicKey;

use crate::error::{Resource, StoreError, StoreResult};
use crate::layout::FilenamePatterns;
use crate::traits::ArtifactReader;

const READ_CHUNK: usize = 64 * 1024;
const UPLOAD_PREFIX: &str = ".upload-";

/// Artifacts stored in a directory tree.
#[derive(Clone, Debug)]
pub struct LocalBackend {
    root: PathBuf,
    patterns: Arc<FilenamePatterns>,
}

impl LocalBackend {
    pub fn new(root: impl Into<PathBuf>, patterns: Arc<FilenamePatterns>) -> Self {
        Self {
            root: root.into(),
            patterns,
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn patterns(&self) -> &FilenamePatterns {
        &self.patterns
    }
}

async fn ensure_dir(path: &Path) -> StoreResult<()> {
    tokio::fs::create_dir_all(path).await?;
    debug!(path = %path.display(), "ensured directory");
    Ok(())
}

/// Succeed when `path` is an existing directory.
async fn require_dir(path: &Path, missing: Resource) -> StoreResult<()> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| StoreError::from_io(e, missing))?;
    if !meta.is_dir() {
        return Err(StoreError::NotExist(missing));
    }
    Ok(())
}

/// Succeed when `path` is an existing regular file.
async fn require_file(path: &Path, missing: Resource) -> StoreResult<()> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| StoreError::from_io(e, missing))?;
    if !meta.is_file() {
        return Err(StoreError::NotExist(missing));
    }
    Ok(())
}

/// Replace `path` with `body`. The bytes go to a temporary file in the same
/// directory first, so readers see either the old file or the new one.
async fn write_file(path: PathBuf, body: Bytes) -> StoreResult<()> {
    let len = body.len();
    let target = path.clone();
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let dir = target
            .parent()
            .ok_or_else(|| std::io::Error::other("artifact path has no parent"))?;
        std::fs::create_dir_all(dir)?;
        let mut tmp = tempfile::Builder::new()
            .prefix(UPLOAD_PREFIX)
            .tempfile_in(dir)?;
        tmp.write_all(&body)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| StoreError::Io(std::io::Error::other(e)))??;
    debug!(path = %path.display(), bytes = len, "wrote artifact");
    Ok(())
}

async fn open(path: &Path, missing: Resource) -> StoreResult<ArtifactReader> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| StoreError::from_io(e, missing))?;
    Ok(Box::new(file))
}

/// Stream a file through SHA-256.
async fn hash_file(path: &Path, missing: Resource) -> StoreResult<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| StoreError::from_io(e, missing))?;
    let mut hasher = Sha256Hasher::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    debug!(path = %path.display(), bytes = hasher.len(), "hashed artifact");
    Ok(hasher.finalize_hex())
}

/// Read and decode one stored key. Bytes that are not UTF-8 count as a
/// corrupt key, the same as bad armor.
async fn read_key(path: &Path) -> StoreResult<GpgPublicKey> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| StoreError::from_io(e, Resource::ProviderGpgKey))?;
    let corrupt = |source| StoreError::CorruptKey {
        key: path.display().to_string(),
        source,
    };
    let armored = std::str::from_utf8(&raw).map_err(|e| corrupt(KeyError::Armor(e.to_string())))?;
    decode_public_key(armored).map_err(corrupt)
}

/// Decode every key file in `dir`. A missing directory means no keys; a key
/// that fails to decode fails the whole read.
async fn read_keys(dir: &Path) -> StoreResult<Vec<GpgPublicKey>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut keys = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') {
            continue;
        }
        if !entry.file_type().await?.is_file() {
            warn!(path = %entry.path().display(), "skipping non-file in key directory");
            continue;
        }
        keys.push(read_key(&entry.path()).await?);
    }
    keys.sort_by(|a, b| a.key_id.cmp(&b.key_id));
    Ok(keys)
}

/// Names of the subdirectories of `dir`.
async fn subdirectories(dir: &Path, missing: Resource) -> StoreResult<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| StoreError::from_io(e, missing))?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_file_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/file.bin");
        write_file(path.clone(), Bytes::from_static(b"first")).await.unwrap();
        write_file(path.clone(), Bytes::from_static(b"second")).await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"second");

        // No temporary files are left behind.
        let names = subdirectories(dir.path(), Resource::Provider).await.unwrap();
        assert_eq!(names, vec!["a".to_string()]);
        let mut entries = std::fs::read_dir(dir.path().join("a/b")).unwrap();
        assert!(entries.next().is_some());
        assert!(entries.next().is_none());
    }

    #[tokio::test]
    async fn missing_paths_map_to_resource() {
        let dir = tempfile::tempdir().unwrap();
        let err = require_dir(&dir.path().join("nope"), Resource::ProviderVersion)
            .await
            .unwrap_err();
        assert_eq!(err.missing(), Some(Resource::ProviderVersion));

        let err = hash_file(&dir.path().join("nope.zip"), Resource::ProviderBinary)
            .await
            .unwrap_err();
        assert_eq!(err.missing(), Some(Resource::ProviderBinary));
    }

    #[tokio::test]
    async fn file_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain");
        tokio::fs::write(&path, b"x").await.unwrap();
        assert!(require_dir(&path, Resource::Provider).await.is_err());
        assert!(require_file(&path, Resource::Provider).await.is_ok());
    }

    #[tokio::test]
    async fn hash_matches_one_shot_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        tokio::fs::write(&path, &data).await.unwrap();
        assert_eq!(
            hash_file(&path, Resource::ProviderBinary).await.unwrap(),
            depot_crypto::sha256_hex(&data)
        );
    }

    #[tokio::test]
    async fn missing_key_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_keys(&dir.path().join("keys")).await.unwrap().is_empty());
    }
}

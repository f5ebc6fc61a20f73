//! Storage drivers for the Depot registry.
//!
//! This crate maps artifact coordinates onto a fixed key layout and stores
//! provider binaries, checksum manifests, signing keys and module packages in
//! either a local directory tree or an S3-compatible object store.
//!
//! # Structure
//!
//! - [`layout`]: pure functions from coordinates to storage keys
//! - [`ProviderStore`] / [`ModuleStore`]: the capability contract every
//!   backend implements
//! - [`LocalBackend`]: files under a root directory, served by the registry
//! - [`ObjectStorageBackend`]: objects in a bucket, reached through presigned URLs
//! - [`resolve_package`]: concurrent assembly of a verifiable [`Package`](depot_types::Package)
//! - [`Driver`]: the configured backend, built once at startup
//!
//! # Design Rules
//!
//! 1. Every backend uses the same key layout, so migrating between them is a
//!    plain copy.
//! 2. Binary digests are computed from stored bytes at resolution time, never
//!    read from metadata.
//! 3. Missing objects surface as [`StoreError::NotExist`] naming the resource
//!    the caller asked for.
//! 4. Nothing is retried here. Every failure goes straight back to the caller.
//! 5. Writes are last-writer-wins.

pub mod backend;
pub mod config;
pub mod driver;
pub mod error;
pub mod layout;
pub mod local;
pub mod object;
pub mod resolver;
pub mod traits;

pub use backend::Backend;
pub use config::{BackendConfig, LocalConfig, S3Config};
pub use driver::Driver;
pub use error::{Resource, StoreError, StoreResult};
pub use layout::FilenamePatterns;
pub use local::LocalBackend;
pub use object::{ObjectStorageBackend, PassthroughSigner};
pub use resolver::{resolve_package, PackageSource};
pub use traits::{ArtifactReader, ModuleStore, ProviderStore};

//! Foundation types for the Depot registry.
//!
//! Every other Depot crate depends on `depot-types`. The types here carry no
//! behaviour beyond validation and serialization: storage, hashing and key
//! decoding live in `depot-store` and `depot-crypto`.
//!
//! # Key Types
//!
//! - [`ProviderRef`], [`VersionRef`], [`PlatformRef`]: validated provider coordinates
//! - [`ModuleRef`], [`ModuleVersionRef`]: validated module coordinates
//! - [`Package`]: the resolved, verifiable provider package descriptor
//! - [`GpgPublicKey`]: a namespace-scoped signing key in its original armor
//! - [`AvailableVersion`]: a version and the platforms published for it

pub mod coords;
pub mod error;
pub mod package;
pub mod upload;

pub use coords::{ModuleRef, ModuleVersionRef, Platform, PlatformRef, ProviderRef, VersionRef};
pub use error::TypeError;
pub use package::{AvailableVersion, GpgPublicKey, Package, SigningKeys};
pub use upload::{ModuleVersionUpload, ProviderPlatformUpload, ProviderVersionUploads, VersionMetadata};

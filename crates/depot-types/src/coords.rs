//! Validated artifact coordinates.
//!
//! Coordinates become storage keys and filenames verbatim, so every segment
//! is checked once, at construction, against a conservative grammar:
//!
//! - namespace, module name, module provider: `[A-Za-z0-9][A-Za-z0-9_-]*`
//! - provider registry name: `[A-Za-z0-9][A-Za-z0-9-]*`, not `keys`
//! - version: a semantic version
//! - os, arch: `[a-z0-9]+`
//!
//! `_` is excluded from registry names, versions and platforms because it
//! separates the fields of a provider binary filename.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Longest accepted namespace/name segment.
pub const MAX_SEGMENT_LEN: usize = 64;

/// Registry names that collide with namespace-level containers.
const RESERVED_REGISTRY_NAMES: &[&str] = &["keys"];

fn invalid(field: &'static str, value: &str, reason: impl Into<String>) -> TypeError {
    TypeError::InvalidCoordinate {
        field,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn validate_segment(field: &'static str, value: &str, allow_underscore: bool) -> Result<(), TypeError> {
    if value.is_empty() {
        return Err(invalid(field, value, "must not be empty"));
    }
    if value.len() > MAX_SEGMENT_LEN {
        return Err(invalid(
            field,
            value,
            format!("must be at most {MAX_SEGMENT_LEN} characters"),
        ));
    }
    if !value.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Err(invalid(field, value, "must start with a letter or digit"));
    }
    if let Some(ch) = value
        .chars()
        .find(|&c| !(c.is_ascii_alphanumeric() || c == '-' || (allow_underscore && c == '_')))
    {
        return Err(invalid(field, value, format!("contains forbidden character: {ch:?}")));
    }
    Ok(())
}

fn validate_namespace(value: &str) -> Result<(), TypeError> {
    validate_segment("namespace", value, true)
}

fn validate_registry_name(value: &str) -> Result<(), TypeError> {
    validate_segment("registry name", value, false)?;
    if RESERVED_REGISTRY_NAMES.contains(&value) {
        return Err(invalid("registry name", value, "is reserved"));
    }
    Ok(())
}

fn validate_version(value: &str) -> Result<(), TypeError> {
    semver::Version::parse(value)
        .map(|_| ())
        .map_err(|e| invalid("version", value, e.to_string()))
}

fn validate_platform_part(field: &'static str, value: &str) -> Result<(), TypeError> {
    if value.is_empty() {
        return Err(invalid(field, value, "must not be empty"));
    }
    if value.len() > MAX_SEGMENT_LEN {
        return Err(invalid(
            field,
            value,
            format!("must be at most {MAX_SEGMENT_LEN} characters"),
        ));
    }
    if let Some(ch) = value
        .chars()
        .find(|&c| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
    {
        return Err(invalid(field, value, format!("contains forbidden character: {ch:?}")));
    }
    Ok(())
}

/// An `(os, arch)` pair identifying one compiled binary of a provider version.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    /// Build a validated platform.
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Result<Self, TypeError> {
        let (os, arch) = (os.into(), arch.into());
        validate_platform_part("os", &os)?;
        validate_platform_part("arch", &arch)?;
        Ok(Self { os, arch })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.os, self.arch)
    }
}

/// A provider line: `(namespace, registry name)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProviderRef {
    namespace: String,
    name: String,
}

impl ProviderRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self, TypeError> {
        let (namespace, name) = (namespace.into(), name.into());
        validate_namespace(&namespace)?;
        validate_registry_name(&name)?;
        Ok(Self { namespace, name })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The registry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scope a version to this provider.
    pub fn version(&self, version: impl Into<String>) -> Result<VersionRef, TypeError> {
        let version = version.into();
        validate_version(&version)?;
        Ok(VersionRef {
            provider: self.clone(),
            version,
        })
    }
}

impl fmt::Display for ProviderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// One version of a provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VersionRef {
    provider: ProviderRef,
    version: String,
}

impl VersionRef {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self, TypeError> {
        ProviderRef::new(namespace, name)?.version(version)
    }

    pub fn provider(&self) -> &ProviderRef {
        &self.provider
    }

    pub fn namespace(&self) -> &str {
        self.provider.namespace()
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Scope a platform to this version.
    pub fn platform(&self, os: impl Into<String>, arch: impl Into<String>) -> Result<PlatformRef, TypeError> {
        Ok(PlatformRef {
            version: self.clone(),
            platform: Platform::new(os, arch)?,
        })
    }
}

impl fmt::Display for VersionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.provider, self.version)
    }
}

/// One platform binary of a provider version.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PlatformRef {
    version: VersionRef,
    platform: Platform,
}

impl PlatformRef {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        os: impl Into<String>,
        arch: impl Into<String>,
    ) -> Result<Self, TypeError> {
        VersionRef::new(namespace, name, version)?.platform(os, arch)
    }

    pub fn version_ref(&self) -> &VersionRef {
        &self.version
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn namespace(&self) -> &str {
        self.version.namespace()
    }

    pub fn name(&self) -> &str {
        self.version.name()
    }

    pub fn version(&self) -> &str {
        self.version.version()
    }

    pub fn os(&self) -> &str {
        &self.platform.os
    }

    pub fn arch(&self) -> &str {
        &self.platform.arch
    }
}

impl fmt::Display for PlatformRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.version, self.platform)
    }
}

/// A module line: `(namespace, name, provider)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModuleRef {
    namespace: String,
    name: String,
    provider: String,
}

impl ModuleRef {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
    ) -> Result<Self, TypeError> {
        let (namespace, name, provider) = (namespace.into(), name.into(), provider.into());
        validate_namespace(&namespace)?;
        validate_segment("module name", &name, true)?;
        validate_segment("module provider", &provider, true)?;
        Ok(Self {
            namespace,
            name,
            provider,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The target system the module is written for (e.g. `aws`).
    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn version(&self, version: impl Into<String>) -> Result<ModuleVersionRef, TypeError> {
        let version = version.into();
        validate_version(&version)?;
        Ok(ModuleVersionRef {
            module: self.clone(),
            version,
        })
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.name, self.provider)
    }
}

/// One version of a module.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModuleVersionRef {
    module: ModuleRef,
    version: String,
}

impl ModuleVersionRef {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self, TypeError> {
        ModuleRef::new(namespace, name, provider)?.version(version)
    }

    pub fn module(&self) -> &ModuleRef {
        &self.module
    }

    pub fn namespace(&self) -> &str {
        self.module.namespace()
    }

    pub fn name(&self) -> &str {
        self.module.name()
    }

    pub fn provider(&self) -> &str {
        self.module.provider()
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for ModuleVersionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.module, self.version)
    }
}

/// Validate a namespace on its own (namespace-scoped operations such as
/// signing-key storage take no other coordinate).
pub fn namespace(value: &str) -> Result<&str, TypeError> {
    validate_namespace(value)?;
    Ok(value)
}

/// Validate an OpenPGP key ID (16 hex digits) and return it uppercased, the
/// form keys are stored under.
pub fn key_id(value: &str) -> Result<String, TypeError> {
    if value.len() != 16 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("key id", value, "must be 16 hexadecimal digits"));
    }
    Ok(value.to_ascii_uppercase())
}

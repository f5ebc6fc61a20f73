//! The storage key layout.
//!
//! ```text
//! providers/{ns}/{name}/versions/{version}/{os}-{arch}/terraform-provider-{name}_{version}_{os}_{arch}.zip
//! providers/{ns}/{name}/versions/{version}/terraform-provider-{name}_{version}_SHA256SUMS[.sig]
//! providers/{ns}/{name}/versions/{version}/metadata.json
//! providers/{ns}/keys/{key_id}
//! modules/{ns}/{provider}/{name}/versions/{version}/terraform-{provider}-{name}-{version}.tar.gz
//! ```
//!
//! Keys always use `/`. Nothing here touches storage.

use regex::Regex;

use depot_types::{ModuleRef, ModuleVersionRef, Platform, PlatformRef, ProviderRef, VersionRef};

pub const PROVIDERS_DIR: &str = "providers";
pub const MODULES_DIR: &str = "modules";
pub const VERSIONS_DIR: &str = "versions";
pub const KEYS_DIR: &str = "keys";
pub const METADATA_FILE: &str = "metadata.json";

pub fn provider_root(provider: &ProviderRef) -> String {
    format!(
        "{PROVIDERS_DIR}/{}/{}",
        provider.namespace(),
        provider.name()
    )
}

pub fn versions_root(provider: &ProviderRef) -> String {
    format!("{}/{VERSIONS_DIR}", provider_root(provider))
}

pub fn version_root(version: &VersionRef) -> String {
    format!("{}/{}", versions_root(version.provider()), version.version())
}

pub fn platform_root(platform: &PlatformRef) -> String {
    format!(
        "{}/{}",
        version_root(platform.version_ref()),
        platform_dir(platform.platform())
    )
}

/// `{os}-{arch}`
pub fn platform_dir(platform: &Platform) -> String {
    format!("{}-{}", platform.os, platform.arch)
}

pub fn binary_filename(platform: &PlatformRef) -> String {
    format!(
        "terraform-provider-{}_{}_{}_{}.zip",
        platform.name(),
        platform.version(),
        platform.os(),
        platform.arch()
    )
}

pub fn binary_key(platform: &PlatformRef) -> String {
    format!("{}/{}", platform_root(platform), binary_filename(platform))
}

pub fn shasums_filename(version: &VersionRef) -> String {
    format!(
        "terraform-provider-{}_{}_SHA256SUMS",
        version.name(),
        version.version()
    )
}

pub fn shasums_key(version: &VersionRef) -> String {
    format!("{}/{}", version_root(version), shasums_filename(version))
}

pub fn shasums_sig_key(version: &VersionRef) -> String {
    format!("{}.sig", shasums_key(version))
}

pub fn metadata_key(version: &VersionRef) -> String {
    format!("{}/{METADATA_FILE}", version_root(version))
}

/// Signing keys live beside the namespace's providers. `keys` is reserved as
/// a registry name so the two cannot collide.
pub fn keys_root(namespace: &str) -> String {
    format!("{PROVIDERS_DIR}/{namespace}/{KEYS_DIR}")
}

pub fn key_path(namespace: &str, key_id: &str) -> String {
    format!("{}/{key_id}", keys_root(namespace))
}

pub fn module_root(module: &ModuleRef) -> String {
    format!(
        "{MODULES_DIR}/{}/{}/{}",
        module.namespace(),
        module.provider(),
        module.name()
    )
}

pub fn module_versions_root(module: &ModuleRef) -> String {
    format!("{}/{VERSIONS_DIR}", module_root(module))
}

pub fn module_version_root(version: &ModuleVersionRef) -> String {
    format!("{}/{}", module_versions_root(version.module()), version.version())
}

pub fn module_package_filename(version: &ModuleVersionRef) -> String {
    format!(
        "terraform-{}-{}-{}.tar.gz",
        version.provider(),
        version.name(),
        version.version()
    )
}

pub fn module_package_key(version: &ModuleVersionRef) -> String {
    format!(
        "{}/{}",
        module_version_root(version),
        module_package_filename(version)
    )
}

/// The fields recovered from a provider binary filename.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryFilename {
    pub name: String,
    pub version: String,
    pub platform: Platform,
}

/// Compiled filename patterns, built once per process and shared by every
/// backend.
#[derive(Clone, Debug)]
pub struct FilenamePatterns {
    binary: Regex,
    platform_dir: Regex,
}

impl FilenamePatterns {
    pub fn new() -> Self {
        Self {
            // Registry names, versions and platforms never contain `_`.
            binary: Regex::new(
                r"^terraform-provider-([A-Za-z0-9][A-Za-z0-9-]*)_([^_/]+)_([a-z0-9]+)_([a-z0-9]+)\.zip$",
            )
            .expect("binary filename pattern compiles"),
            platform_dir: Regex::new(r"^([a-z0-9]+)-([a-z0-9]+)$")
                .expect("platform directory pattern compiles"),
        }
    }

    /// Parse a provider binary filename. Returns `None` for anything that is
    /// not one, including names carrying an invalid version.
    pub fn parse_binary(&self, filename: &str) -> Option<BinaryFilename> {
        let caps = self.binary.captures(filename)?;
        let version = caps.get(2)?.as_str();
        semver::Version::parse(version).ok()?;
        Some(BinaryFilename {
            name: caps.get(1)?.as_str().to_string(),
            version: version.to_string(),
            platform: Platform {
                os: caps.get(3)?.as_str().to_string(),
                arch: caps.get(4)?.as_str().to_string(),
            },
        })
    }

    /// Parse an `{os}-{arch}` directory name.
    pub fn parse_platform_dir(&self, dir: &str) -> Option<Platform> {
        let caps = self.platform_dir.captures(dir)?;
        Some(Platform {
            os: caps.get(1)?.as_str().to_string(),
            arch: caps.get(2)?.as_str().to_string(),
        })
    }
}

impl Default for FilenamePatterns {
    fn default() -> Self {
        Self::new()
    }
}

/// Order version strings by semantic version. Unparseable strings sort last.
pub(crate) fn sort_versions<T>(items: &mut [T], version: impl Fn(&T) -> &str) {
    items.sort_by_cached_key(|item| {
        let v = version(item);
        match semver::Version::parse(v) {
            Ok(parsed) => (false, Some(parsed), String::new()),
            Err(_) => (true, None, v.to_string()),
        }
    });
}

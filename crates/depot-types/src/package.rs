use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coords::Platform;

/// A namespace-scoped signing key.
///
/// `ascii_armor` is the armored text exactly as it was submitted; clients
/// verify manifest signatures against these bytes, so it is never
/// re-serialized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpgPublicKey {
    /// Uppercase hex key ID (16 characters).
    pub key_id: String,
    pub ascii_armor: String,
}

impl fmt::Display for GpgPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gpg:{}", self.key_id)
    }
}

/// The keys a client may use to verify a version's manifest signature.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKeys {
    pub gpg_public_keys: Vec<GpgPublicKey>,
}

impl SigningKeys {
    pub fn new(gpg_public_keys: Vec<GpgPublicKey>) -> Self {
        Self { gpg_public_keys }
    }

    pub fn is_empty(&self) -> bool {
        self.gpg_public_keys.is_empty()
    }

    pub fn contains(&self, key_id: &str) -> bool {
        self.gpg_public_keys.iter().any(|k| k.key_id == key_id)
    }
}

/// A resolved provider package: everything a client needs to download one
/// platform binary and verify it.
///
/// Built fresh on every resolution and never persisted. `shasum` is always
/// the digest of the stored binary as it is at resolution time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub os: String,
    pub arch: String,
    pub filename: String,
    pub download_url: String,
    pub shasums_url: String,
    pub shasums_signature_url: String,
    /// Lowercase hex SHA-256 of the binary.
    pub shasum: String,
    pub signing_keys: SigningKeys,
}

impl Package {
    pub fn platform(&self) -> Platform {
        Platform {
            os: self.os.clone(),
            arch: self.arch.clone(),
        }
    }
}

/// One published version and the platforms that have a binary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableVersion {
    pub version: String,
    pub platforms: Vec<Platform>,
}

impl AvailableVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            platforms: Vec::new(),
        }
    }

    /// Record a platform, ignoring duplicates.
    pub fn add_platform(&mut self, platform: Platform) {
        if !self.platforms.contains(&platform) {
            self.platforms.push(platform);
        }
    }
}

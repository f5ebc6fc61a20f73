//! Public-key decoding shared by key submission and package resolution.
//!
//! [`decode_public_key`] is the single entry point both call sites use, so a
//! key accepted on upload is guaranteed to decode again when it is read back.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use depot_types::GpgPublicKey;

use crate::armor::{self, PUBLIC_KEY_BLOCK};
use crate::error::{KeyError, KeyResult};
use crate::packet::{self, TAG_PUBLIC_KEY};

/// Public-key algorithm identifiers (RFC 9580 §9.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyAlgorithm {
    Rsa,
    Elgamal,
    Dsa,
    Ecdh,
    Ecdsa,
    EddsaLegacy,
    X25519,
    X448,
    Ed25519,
    Ed448,
    Unknown(u8),
}

impl From<u8> for KeyAlgorithm {
    fn from(id: u8) -> Self {
        match id {
            1..=3 => Self::Rsa,
            16 | 20 => Self::Elgamal,
            17 => Self::Dsa,
            18 => Self::Ecdh,
            19 => Self::Ecdsa,
            22 => Self::EddsaLegacy,
            25 => Self::X25519,
            26 => Self::X448,
            27 => Self::Ed25519,
            28 => Self::Ed448,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rsa => write!(f, "RSA"),
            Self::Elgamal => write!(f, "Elgamal"),
            Self::Dsa => write!(f, "DSA"),
            Self::Ecdh => write!(f, "ECDH"),
            Self::Ecdsa => write!(f, "ECDSA"),
            Self::EddsaLegacy => write!(f, "EdDSA"),
            Self::X25519 => write!(f, "X25519"),
            Self::X448 => write!(f, "X448"),
            Self::Ed25519 => write!(f, "Ed25519"),
            Self::Ed448 => write!(f, "Ed448"),
            Self::Unknown(id) => write!(f, "unknown({id})"),
        }
    }
}

/// What the registry knows about a decoded public key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PublicKeyInfo {
    /// Uppercase hex, 16 characters.
    pub key_id: String,
    /// Uppercase hex. `None` for v3 keys, whose fingerprint is MD5-based.
    pub fingerprint: Option<String>,
    pub version: u8,
    pub algorithm: KeyAlgorithm,
    pub created_at: DateTime<Utc>,
}

/// Decode an armored public key and derive its identifiers.
pub fn inspect_public_key(armored: &str) -> KeyResult<PublicKeyInfo> {
    let block = armor::decode(armored)?;
    if block.block_type != PUBLIC_KEY_BLOCK {
        return Err(KeyError::NotPublicKeyBlock {
            found: block.block_type,
        });
    }

    let header = packet::parse_header(&block.data)?;
    if header.tag != TAG_PUBLIC_KEY {
        return Err(KeyError::NotPublicKeyPacket { tag: header.tag });
    }
    let body = &block.data[header.header_len..header.header_len + header.body_len];
    let key = packet::parse_public_key(body)?;

    let (key_id, fingerprint) = match (key.version, key.rsa_modulus) {
        (2 | 3, Some(modulus)) => {
            if modulus.len() < 8 {
                return Err(KeyError::Packet("RSA modulus shorter than 64 bits".into()));
            }
            (hex::encode_upper(&modulus[modulus.len() - 8..]), None)
        }
        (4, _) => {
            let len = u16::try_from(key.body.len())
                .map_err(|_| KeyError::Packet("v4 key packet longer than 65535 bytes".into()))?;
            let mut hasher = Sha1::new();
            hasher.update([0x99]);
            hasher.update(len.to_be_bytes());
            hasher.update(key.body);
            let fp = hasher.finalize();
            (hex::encode_upper(&fp[12..]), Some(hex::encode_upper(fp)))
        }
        (version @ (5 | 6), _) => {
            let prefix = if version == 5 { 0x9A } else { 0x9B };
            let len = u32::try_from(key.body.len())
                .map_err(|_| KeyError::Packet("key packet too long".into()))?;
            let mut hasher = Sha256::new();
            hasher.update([prefix]);
            hasher.update(len.to_be_bytes());
            hasher.update(key.body);
            let fp = hasher.finalize();
            (hex::encode_upper(&fp[..8]), Some(hex::encode_upper(fp)))
        }
        (version, _) => return Err(KeyError::UnsupportedVersion(version)),
    };

    let created_at = DateTime::<Utc>::from_timestamp(i64::from(key.created), 0)
        .ok_or_else(|| KeyError::Packet("creation time out of range".into()))?;

    Ok(PublicKeyInfo {
        key_id,
        fingerprint,
        version: key.version,
        algorithm: KeyAlgorithm::from(key.algorithm),
        created_at,
    })
}

/// Decode an armored public key into the record the registry stores and
/// serves. The armor text is kept verbatim.
pub fn decode_public_key(armored: &str) -> KeyResult<GpgPublicKey> {
    let info = inspect_public_key(armored)?;
    Ok(GpgPublicKey {
        key_id: info.key_id,
        ascii_armor: armored.to_string(),
    })
}

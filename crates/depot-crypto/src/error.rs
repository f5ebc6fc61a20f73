use thiserror::Error;

/// Errors from decoding armored OpenPGP key material.
///
/// Every variant describes malformed input; none is a storage failure.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("malformed armor: {0}")]
    Armor(String),

    #[error("armored block is {found:?}, expected a public key block")]
    NotPublicKeyBlock { found: String },

    #[error("invalid base64 in armor body: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("armor checksum mismatch: expected {expected:06X}, computed {actual:06X}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("armored block has no data")]
    EmptyBody,

    #[error("packet truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("malformed packet: {0}")]
    Packet(String),

    #[error("partial body lengths are not supported in key packets")]
    PartialLength,

    #[error("first packet has tag {tag}, expected a public key (6)")]
    NotPublicKeyPacket { tag: u8 },

    #[error("unsupported public key version {0}")]
    UnsupportedVersion(u8),
}

pub type KeyResult<T> = Result<T, KeyError>;

//! Cryptographic primitives for the Depot registry.
//!
//! Provides SHA-256 content digests for provider binaries and a decoder for
//! ASCII-armored OpenPGP public keys. The decoder only reads what the registry
//! needs (block type, first packet, key ID); it never verifies signatures.
//!
//! Digests wrap `sha2`/`sha1`; the armor and packet framing follow RFC 4880
//! and RFC 9580.

pub mod armor;
pub mod digest;
pub mod error;
pub mod key;
pub mod packet;

pub use digest::{sha256_hex, Sha256Hasher};
pub use error::{KeyError, KeyResult};
pub use key::{decode_public_key, inspect_public_key, KeyAlgorithm, PublicKeyInfo};

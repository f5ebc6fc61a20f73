use sha2::{Digest, Sha256};

/// Incremental SHA-256 over a stream of chunks.
///
/// Binaries are hashed while they are read, so large uploads never have to
/// sit in memory in one piece.
#[derive(Clone, Default)]
pub struct Sha256Hasher {
    inner: Sha256,
    len: u64,
}

impl Sha256Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
        self.len += chunk.len() as u64;
    }

    /// Bytes consumed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Lowercase hex digest, the form used in `SHA256SUMS` manifests.
    pub fn finalize_hex(self) -> String {
        hex::encode(self.inner.finalize())
    }
}

/// One-shot lowercase hex SHA-256.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

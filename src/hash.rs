//! Integrity hashing over a container's uncompressed payload.
//!
//! CRC32C is the default (cheap, computed with the dedicated `crc32c`
//! crate, which targets the Castagnoli polynomial directly); SHA-256 is
//! opt-in via `use_sha256` in the settings. The digest covers only the
//! payload, never the header it's stored alongside, so a container
//! never hashes itself.

use sha2::{Digest, Sha256};

/// Which algorithm protects a container's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    Crc32c,
    Sha256,
}

impl HashKind {
    pub fn from_flag(use_sha256: bool) -> Self {
        if use_sha256 {
            HashKind::Sha256
        } else {
            HashKind::Crc32c
        }
    }

    /// Size in bytes of this algorithm's digest.
    pub fn digest_len(self) -> usize {
        match self {
            HashKind::Crc32c => 4,
            HashKind::Sha256 => 32,
        }
    }

    /// Digest `data`, little-endian for CRC32C, raw big-endian bytes for SHA-256.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        let digest = match self {
            HashKind::Crc32c => crc32c::crc32c(data).to_le_bytes().to_vec(),
            HashKind::Sha256 => Sha256::digest(data).to_vec(),
        };
        tracing::trace!(kind = ?self, len = data.len(), "computed payload digest");
        digest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32c_matches_known_vector() {
        // "123456789" is the standard CRC32C/Castagnoli check vector: 0xE3069283.
        let digest = HashKind::Crc32c.digest(b"123456789");
        assert_eq!(digest, 0xE3069283u32.to_le_bytes().to_vec());
    }

    #[test]
    fn sha256_matches_known_vector() {
        let digest = HashKind::Sha256.digest(b"abc");
        let expected =
            hex_literal("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
        assert_eq!(digest, expected);
    }

    fn hex_literal(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn digest_len_matches_output() {
        assert_eq!(HashKind::Crc32c.digest_len(), HashKind::Crc32c.digest(b"x").len());
        assert_eq!(HashKind::Sha256.digest_len(), HashKind::Sha256.digest(b"x").len());
    }
}

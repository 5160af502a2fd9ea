//! AES-256-GCM with the serialized container header bound as additional
//! authenticated data, rather than nonce-prepended-to-ciphertext.

use crate::error::{DlcaError, Result};
use aes_gcm::{
    aead::{Aead, Payload},
    Aes256Gcm, KeyInit, Nonce,
};
use rand::RngCore;

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Supplies cryptographically secure random bytes for IV/key generation.
///
/// The default implementation delegates to `rand`'s `OsRng`.
pub trait RandomSource {
    fn fill(&self, buf: &mut [u8]);
}

/// The crate's default, OS-backed random source.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, buf: &mut [u8]) {
        rand::rngs::OsRng.fill_bytes(buf);
    }
}

/// Output of an encrypt call: ciphertext plus whatever was generated.
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub iv: [u8; IV_LEN],
    pub tag: [u8; TAG_LEN],
    pub key: Option<[u8; KEY_LEN]>,
}

/// Encrypt `plaintext` under `key` (generating one if absent) with `aad`
/// bound as additional authenticated data. `aad` is the fully-populated
/// plaintext header with its IV/tag/hash slots still zeroed.
pub fn encrypt(
    plaintext: &[u8],
    aad: &[u8],
    key: Option<[u8; KEY_LEN]>,
    iv: Option<[u8; IV_LEN]>,
    rng: &dyn RandomSource,
) -> Result<Sealed> {
    let mut generated_key = None;
    let key_bytes = match key {
        Some(k) => k,
        None => {
            let mut k = [0u8; KEY_LEN];
            rng.fill(&mut k);
            generated_key = Some(k);
            k
        }
    };

    let iv_bytes = match iv {
        Some(iv) => iv,
        None => {
            let mut iv = [0u8; IV_LEN];
            rng.fill(&mut iv);
            iv
        }
    };

    let cipher = Aes256Gcm::new((&key_bytes).into());
    #[allow(deprecated)]
    let nonce = Nonce::from_slice(&iv_bytes);

    let sealed = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| DlcaError::AuthenticationFailed)?;

    if sealed.len() < TAG_LEN {
        return Err(DlcaError::AuthenticationFailed);
    }
    let split_at = sealed.len() - TAG_LEN;
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&sealed[split_at..]);

    Ok(Sealed {
        ciphertext: sealed[..split_at].to_vec(),
        iv: iv_bytes,
        tag,
        key: generated_key,
    })
}

/// Decrypt `ciphertext` under `key`/`iv`/`tag`, verifying `aad` (the header
/// with IV/tag/hash slots zeroed). Fails with [`DlcaError::AuthenticationFailed`]
/// on any tag mismatch — no partial plaintext is ever returned.
pub fn decrypt(
    ciphertext: &[u8],
    aad: &[u8],
    key: &[u8; KEY_LEN],
    iv: &[u8; IV_LEN],
    tag: &[u8; TAG_LEN],
) -> Result<Vec<u8>> {
    let mut combined = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    combined.extend_from_slice(ciphertext);
    combined.extend_from_slice(tag);

    let cipher = Aes256Gcm::new(key.into());
    #[allow(deprecated)]
    let nonce = Nonce::from_slice(iv);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: &combined,
                aad,
            },
        )
        .map_err(|_| DlcaError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRandom(u8);
    impl RandomSource for FixedRandom {
        fn fill(&self, buf: &mut [u8]) {
            buf.fill(self.0);
        }
    }

    #[test]
    fn roundtrip_with_generated_key_and_iv() {
        let rng = FixedRandom(0x42);
        let plaintext = b"hello, archive";
        let aad = b"header-bytes";

        let sealed = encrypt(plaintext, aad, None, None, &rng).unwrap();
        assert!(sealed.key.is_some());

        let decrypted = decrypt(
            &sealed.ciphertext,
            aad,
            &sealed.key.unwrap(),
            &sealed.iv,
            &sealed.tag,
        )
        .unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn aad_binding_flips_fail_decryption() {
        let rng = FixedRandom(0x7);
        let key = [0x42u8; KEY_LEN];
        let plaintext = b"payload";
        let mut aad = vec![1u8, 2, 3, 4];

        let sealed = encrypt(plaintext, &aad, Some(key), None, &rng).unwrap();

        aad[0] ^= 0xFF;
        let result = decrypt(&sealed.ciphertext, &aad, &key, &sealed.iv, &sealed.tag);
        assert!(matches!(result, Err(DlcaError::AuthenticationFailed)));
    }

    #[test]
    fn wrong_key_fails_decryption() {
        let rng = FixedRandom(0x9);
        let key = [0x11u8; KEY_LEN];
        let wrong_key = [0x22u8; KEY_LEN];
        let aad = b"aad";

        let sealed = encrypt(b"secret", aad, Some(key), None, &rng).unwrap();
        let result = decrypt(&sealed.ciphertext, aad, &wrong_key, &sealed.iv, &sealed.tag);
        assert!(matches!(result, Err(DlcaError::AuthenticationFailed)));
    }
}

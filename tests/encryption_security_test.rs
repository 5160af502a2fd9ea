//! Container-level encryption properties: the header is bound as AAD,
//! so tampering with any header byte or the IV/tag must be caught, and
//! a decrypted container must never be returned without a key.

use dlca::aead::{self, OsRandom};
use dlca::ca::{self, CaSettings};
use dlca::dl::{self, DlEntry, DlSettings};
use dlca::{Archive, ArchiveEntry, DlcaError, EncryptionKind};

fn encrypted_ca(key: [u8; aead::KEY_LEN]) -> Vec<u8> {
    let mut archive = Archive::new();
    archive
        .add_file(ArchiveEntry::file("secret.txt", b"classified".to_vec()))
        .unwrap();

    let settings = CaSettings {
        encryption: EncryptionKind::Aes256Gcm,
        key: Some(key),
        ..Default::default()
    };
    let mut buf = Vec::new();
    ca::write(&mut buf, &archive, &settings, &OsRandom).unwrap();
    buf
}

#[test]
fn ca_decryption_without_a_key_is_rejected() {
    let key = [0xAAu8; aead::KEY_LEN];
    let buf = encrypted_ca(key);
    assert!(matches!(
        ca::read(&mut &buf[..], None),
        Err(DlcaError::InvalidOperation(_))
    ));
}

#[test]
fn ca_decryption_with_the_wrong_key_fails_authentication() {
    let key = [0xAAu8; aead::KEY_LEN];
    let wrong = [0xBBu8; aead::KEY_LEN];
    let buf = encrypted_ca(key);
    assert!(matches!(
        ca::read(&mut &buf[..], Some(&wrong)),
        Err(DlcaError::AuthenticationFailed)
    ));
}

#[test]
fn flipping_a_header_byte_breaks_the_aad_binding() {
    let key = [0xAAu8; aead::KEY_LEN];
    let mut buf = encrypted_ca(key);
    // Byte 5 is the header's flags byte, well before any ciphertext
    // begins; flipping a non-reserved bit still lets the header parse,
    // but the AAD it contributes to no longer matches what was sealed.
    buf[5] ^= 0x01;
    assert!(matches!(
        ca::read(&mut &buf[..], Some(&key)),
        Err(DlcaError::AuthenticationFailed)
    ));
}

#[test]
fn flipping_the_iv_breaks_decryption() {
    let key = [0xAAu8; aead::KEY_LEN];
    let mut buf = encrypted_ca(key);
    // The IV immediately follows the directory/file tables and precedes
    // the tag and ciphertext; flip a byte well into the tail of the
    // buffer, inside the IV/tag/ciphertext region.
    let tail = buf.len() - 5;
    buf[tail] ^= 0xFF;
    assert!(matches!(
        ca::read(&mut &buf[..], Some(&key)),
        Err(DlcaError::AuthenticationFailed)
    ));
}

#[test]
fn dl_encryption_roundtrips_and_rejects_tamper() {
    let key = [0x07u8; aead::KEY_LEN];
    let entries = vec![DlEntry::Raw(b"top secret entry".to_vec())];
    let settings = DlSettings {
        encryption: EncryptionKind::Aes256Gcm,
        key: Some(key),
        ..Default::default()
    };
    let mut buf = Vec::new();
    dl::write(&mut buf, &entries, &settings, &OsRandom).unwrap();

    let decoded = dl::read(&mut &buf[..], Some(&key)).unwrap();
    assert_eq!(decoded.entries, entries);

    let last = buf.len() - 1;
    buf[last] ^= 0xFF;
    assert!(matches!(
        dl::read(&mut &buf[..], Some(&key)),
        Err(DlcaError::AuthenticationFailed)
    ));
}

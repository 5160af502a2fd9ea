//! The DL ("data list") container: an ordered list of same-kind entries
//! (raw bytes, ASCII strings, or UTF-8 strings) under one optional
//! compression/encryption/hash envelope.
//!
//! Grounded in `oiDL.c`'s write pipeline: validate entries for the
//! declared kind, concatenate them, hash the concatenation, optionally
//! compress then encrypt, and only then touch the header.

use crate::aead;
use crate::compression::{self, CompressionKind};
use crate::container::{
    assert_little_endian, ContainerHeader, EncryptionKind, SizeTypes, FLAG_USE_SHA256,
    FORMAT_VERSION_MAJOR, FORMAT_VERSION_MINOR,
};
use crate::error::{DlcaError, Result};
use crate::hash::HashKind;
use crate::size;
use std::io::{Read, Write};

pub const MAGIC: [u8; 4] = *b"oiDL";

const FLAG_IS_STRING: u8 = 1 << 1;
const FLAG_UTF8: u8 = 1 << 2;
/// Bits 3-4 are reserved for a future per-chunk AES block-size class;
/// bits 5-7 are unused. Both halves must be zero until that extension
/// is specified.
const FLAG_RESERVED_MASK: u8 = 0b1111_1000;

/// What kind of data every entry in a DL holds. Fixed per-file: a DL
/// cannot mix raw entries with string entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DlDataKind {
    Raw,
    Ascii,
    Utf8,
}

impl DlDataKind {
    fn flag_bits(self) -> u8 {
        match self {
            DlDataKind::Raw => 0,
            DlDataKind::Ascii => FLAG_IS_STRING,
            DlDataKind::Utf8 => FLAG_IS_STRING | FLAG_UTF8,
        }
    }

    fn from_flag_bits(flags: u8) -> Result<Self> {
        let is_string = flags & FLAG_IS_STRING != 0;
        let utf8 = flags & FLAG_UTF8 != 0;
        match (is_string, utf8) {
            (false, false) => Ok(DlDataKind::Raw),
            (false, true) => Err(DlcaError::InvalidParameter {
                arg: "flags",
                sub: 0,
                index: 0,
                reason: "utf8 bit set without is_string bit".to_string(),
            }),
            (true, false) => Ok(DlDataKind::Ascii),
            (true, true) => Ok(DlDataKind::Utf8),
        }
    }
}

/// One entry of a DL, already validated against its file's [`DlDataKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DlEntry {
    Raw(Vec<u8>),
    Ascii(String),
    Utf8(String),
}

impl DlEntry {
    fn kind(&self) -> DlDataKind {
        match self {
            DlEntry::Raw(_) => DlDataKind::Raw,
            DlEntry::Ascii(_) => DlDataKind::Ascii,
            DlEntry::Utf8(_) => DlDataKind::Utf8,
        }
    }

    fn bytes(&self) -> &[u8] {
        match self {
            DlEntry::Raw(b) => b,
            DlEntry::Ascii(s) => s.as_bytes(),
            DlEntry::Utf8(s) => s.as_bytes(),
        }
    }
}

/// Settings controlling how a DL is written.
#[derive(Debug, Clone, Copy)]
pub struct DlSettings {
    pub data_kind: DlDataKind,
    pub hash: HashKind,
    pub compression: CompressionKind,
    pub encryption: EncryptionKind,
    /// Ignored when `encryption` is `None`. When `encryption` is
    /// `Aes256Gcm`, `Some` uses the given key; `None` has `write` generate
    /// one and hand it back (the only place it's ever recoverable).
    pub key: Option<[u8; aead::KEY_LEN]>,
}

impl Default for DlSettings {
    fn default() -> Self {
        DlSettings {
            data_kind: DlDataKind::Raw,
            hash: HashKind::Crc32c,
            compression: CompressionKind::None,
            encryption: EncryptionKind::None,
            key: None,
        }
    }
}

/// A fully decoded DL file: its entries plus the settings it was read with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DlFile {
    pub entries: Vec<DlEntry>,
}

/// Serialize `entries` (all of the same kind, matching `settings.data_kind`)
/// to `writer`. Returns the generated key when `settings.encryption` is
/// `Aes256Gcm` and `settings.key` was `None` — the caller's only chance to
/// recover it, since nothing else retains it.
pub fn write<W: Write>(
    writer: &mut W,
    entries: &[DlEntry],
    settings: &DlSettings,
    rng: &dyn aead::RandomSource,
) -> Result<Option<[u8; aead::KEY_LEN]>> {
    assert_little_endian()?;

    for (i, entry) in entries.iter().enumerate() {
        if entry.kind() != settings.data_kind {
            return Err(DlcaError::InvalidParameter {
                arg: "entries",
                sub: 0,
                index: i as u32,
                reason: "entry kind does not match settings.data_kind".to_string(),
            });
        }
        if let DlEntry::Ascii(s) = entry {
            if !s.is_ascii() {
                return Err(DlcaError::InvalidAscii(i as u64));
            }
        }
    }

    let lengths: Vec<u64> = entries.iter().map(|e| e.bytes().len() as u64).collect();
    let max_len = lengths.iter().copied().max().unwrap_or(0);
    let entry_len_class = size::required_class(max_len);

    // The payload that gets compressed, hashed, and encrypted is the N
    // per-entry size fields followed by the concatenated entry bytes
    // (spec step: "N per-entry size fields in chosen class, then the
    // concatenated entry bytes") — not the entry bytes alone. Only the
    // entry count stays outside it, since a reader needs it before it
    // can even size the decrypted/decompressed payload's size-field run.
    let mut payload = Vec::new();
    for len in &lengths {
        size::write(&mut payload, entry_len_class, *len)?;
    }
    for entry in entries {
        payload.extend_from_slice(entry.bytes());
    }
    let total_len = payload.len() as u64;

    // The uncompressed-size field and the integrity hash only exist when
    // the payload is actually compressed: uncompressed, the AEAD tag (if
    // encrypted) already authenticates the bytes, and plain
    // unencrypted/uncompressed payloads carry no integrity field.
    let is_compressed = settings.compression != CompressionKind::None;
    let digest = is_compressed.then(|| settings.hash.digest(&payload));
    let compressed = compression::compress(settings.compression, &payload)?;

    let flags = settings.data_kind.flag_bits() | if settings.hash == HashKind::Sha256 {
        FLAG_USE_SHA256
    } else {
        0
    };

    let size_types = SizeTypes {
        entry_count: size::required_class(entries.len() as u64),
        entry_len: entry_len_class,
        total_len: size::required_class(total_len),
    };

    let header = ContainerHeader {
        magic: MAGIC,
        version_major: FORMAT_VERSION_MAJOR,
        version_minor: FORMAT_VERSION_MINOR,
        flags,
        compression: settings.compression,
        encryption: settings.encryption,
        size_types,
    };

    let mut header_bytes = Vec::new();
    header.write_to(&mut header_bytes)?;

    let (final_payload, iv, tag, generated_key) = match settings.encryption {
        EncryptionKind::None => (compressed, None, None, None),
        EncryptionKind::Aes256Gcm => {
            let sealed = aead::encrypt(&compressed, &header_bytes, settings.key, None, rng)?;
            (sealed.ciphertext, Some(sealed.iv), Some(sealed.tag), sealed.key)
        }
    };

    writer.write_all(&header_bytes)?;
    size::write(writer, size_types.entry_count, entries.len() as u64)?;
    if is_compressed {
        size::write(writer, size_types.total_len, total_len)?;
        writer.write_all(digest.as_deref().unwrap_or(&[]))?;
    }
    if let (Some(iv), Some(tag)) = (iv, tag) {
        writer.write_all(&iv)?;
        writer.write_all(&tag)?;
    }
    writer.write_all(&final_payload)?;

    tracing::debug!(
        entries = entries.len(),
        compressed = is_compressed,
        encrypted = settings.encryption != EncryptionKind::None,
        "wrote DL container"
    );

    Ok(generated_key)
}

/// Deserialize a DL file from `reader`. `key` is required when the
/// header declares AES-256-GCM encryption.
pub fn read<R: Read>(reader: &mut R, key: Option<&[u8; aead::KEY_LEN]>) -> Result<DlFile> {
    assert_little_endian()?;

    let mut raw_header = Vec::new();
    // The header is fixed-size; peek it by reading into a sized buffer
    // via a cloned reader isn't possible over a generic `Read`, so read
    // the header through `ContainerHeader::read_from`, then separately
    // re-serialize it to recover the exact AAD bytes the writer bound.
    let header = ContainerHeader::read_from(reader, MAGIC)?;
    header.write_to(&mut raw_header)?;

    if header.flags & FLAG_RESERVED_MASK != 0 {
        return Err(DlcaError::InvalidParameter {
            arg: "flags",
            sub: 0,
            index: 0,
            reason: "reserved DL flag bits must be zero".to_string(),
        });
    }
    let data_kind = DlDataKind::from_flag_bits(header.flags)?;
    let hash_kind = HashKind::from_flag(header.flags & FLAG_USE_SHA256 != 0);

    // Only the entry count sits outside the protected payload; the
    // per-entry size fields travel inside it, alongside the entry bytes,
    // so tampering with either one is caught by the hash or the AEAD tag.
    let entry_count = size::read(reader, header.size_types.entry_count)?;

    let is_compressed = header.compression != CompressionKind::None;
    let digest = if is_compressed {
        let total_len = size::read(reader, header.size_types.total_len)?;
        let mut digest = vec![0u8; hash_kind.digest_len()];
        reader.read_exact(&mut digest)?;
        Some((total_len, digest))
    } else {
        None
    };
    let total_len = digest.as_ref().map(|(len, _)| *len).unwrap_or(0);

    let payload = match header.encryption {
        EncryptionKind::None => {
            let mut compressed = Vec::new();
            reader.read_to_end(&mut compressed)?;
            compression::decompress(header.compression, &compressed, total_len)?
        }
        EncryptionKind::Aes256Gcm => {
            let key = key.ok_or(DlcaError::InvalidOperation(
                "AES-256-GCM decryption requires a key",
            ))?;
            let mut iv = [0u8; aead::IV_LEN];
            reader.read_exact(&mut iv)?;
            let mut tag = [0u8; aead::TAG_LEN];
            reader.read_exact(&mut tag)?;
            let mut ciphertext = Vec::new();
            reader.read_to_end(&mut ciphertext)?;
            let compressed = aead::decrypt(&ciphertext, &raw_header, key, &iv, &tag)?;
            compression::decompress(header.compression, &compressed, total_len)?
        }
    };

    if let Some((_, expected_digest)) = &digest {
        if &hash_kind.digest(&payload) != expected_digest {
            tracing::warn!("DL payload failed integrity hash check");
            return Err(DlcaError::HashMismatch);
        }
    }

    let mut payload_cursor = &payload[..];
    let mut lengths = Vec::with_capacity(entry_count as usize);
    for _ in 0..entry_count {
        lengths.push(size::read(&mut payload_cursor, header.size_types.entry_len)?);
    }
    let data_start = payload.len() - payload_cursor.len();

    let mut entries = Vec::with_capacity(lengths.len());
    let mut offset = data_start;
    for (i, len) in lengths.iter().enumerate() {
        let len = *len as usize;
        let slice = payload
            .get(offset..offset + len)
            .ok_or(DlcaError::InvalidState("payload shorter than declared entry lengths"))?;
        let entry = match data_kind {
            DlDataKind::Raw => DlEntry::Raw(slice.to_vec()),
            DlDataKind::Ascii => {
                if !slice.is_ascii() {
                    return Err(DlcaError::InvalidAscii(i as u64));
                }
                DlEntry::Ascii(String::from_utf8_lossy(slice).into_owned())
            }
            DlDataKind::Utf8 => {
                let s = std::str::from_utf8(slice)
                    .map_err(|_| DlcaError::InvalidUtf8(i as u64))?;
                DlEntry::Utf8(s.to_string())
            }
        };
        entries.push(entry);
        offset += len;
    }

    tracing::debug!(entries = entries.len(), "read DL container");
    Ok(DlFile { entries })
}

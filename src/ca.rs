//! The CA ("archive") container: a directory table, a file table, and a
//! concatenated data region, wrapped in the same compression/encryption/
//! hash envelope as [`crate::dl`].
//!
//! Grounded in `oiCA.h`'s directory-table-then-file-table-then-data
//! layout; parent links are by table index with an all-ones sentinel
//! for "no parent" (root), mirroring the reference format's `0xFFFF`
//! convention generalized to whatever [`crate::size::SizeClass`] the
//! table needs.

use crate::aead;
use crate::archive::{Archive, ArchiveEntry, EntryKind};
use crate::compression::{self, CompressionKind};
use crate::container::{
    assert_little_endian, ContainerHeader, EncryptionKind, SizeTypes, FLAG_USE_SHA256,
    FORMAT_VERSION_MAJOR, FORMAT_VERSION_MINOR,
};
use crate::error::{DlcaError, Result};
use crate::hash::HashKind;
use crate::size::{self, SizeClass};
use std::io::{Read, Write};

pub const MAGIC: [u8; 4] = *b"oiCA";

const FLAG_LONG_NAMES: u8 = 1 << 1;
const FLAG_TIMESTAMP_SHORT: u8 = 1 << 2;
const FLAG_TIMESTAMP_FULL: u8 = 1 << 3;
const FLAG_RESERVED_MASK: u8 = 0b1111_0000;

const SHORT_NAME_MAX: usize = 32;
const LONG_NAME_MAX: usize = 255;

/// First representable year of the packed short date, matching the
/// classic DOS date range (1980-2107 in a 7-bit year offset).
const SHORT_DATE_EPOCH_YEAR: i64 = 1980;

/// How (or whether) an entry's modification time is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampKind {
    None,
    /// Packed DOS-style date+time, 4 bytes, 2-second resolution.
    /// Timestamps outside 1980-01-01..=2107-12-31 are clamped to the
    /// nearest representable endpoint.
    Short,
    /// Nanoseconds since the Unix epoch, stored in 8 bytes.
    Full,
}

/// Settings controlling how a CA is written. Whether names use the
/// 1-byte or 2-byte length prefix is decided automatically from the
/// longest name actually present, not configured here.
#[derive(Debug, Clone, Copy)]
pub struct CaSettings {
    pub hash: HashKind,
    pub compression: CompressionKind,
    pub encryption: EncryptionKind,
    /// Ignored when `encryption` is `None`. When `encryption` is
    /// `Aes256Gcm`, `Some` uses the given key; `None` has `write` generate
    /// one and hand it back (the only place it's ever recoverable).
    pub key: Option<[u8; aead::KEY_LEN]>,
    pub timestamp: TimestampKind,
}

impl Default for CaSettings {
    fn default() -> Self {
        CaSettings {
            hash: HashKind::Crc32c,
            compression: CompressionKind::None,
            encryption: EncryptionKind::None,
            key: None,
            timestamp: TimestampKind::None,
        }
    }
}

struct DirRecord<'a> {
    path: &'a str,
    parent: Option<usize>,
}

struct FileRecord<'a> {
    entry: &'a ArchiveEntry,
    parent: Option<usize>,
}

fn parent_path(path: &str) -> Option<&str> {
    path.rfind('/').map(|i| &path[..i])
}

/// Split an archive into its directory and file tables, resolving each
/// entry's parent to an index into the directory table (or `None` for
/// root). Relies on [`Archive`]'s topological-order invariant: a
/// directory's parent always appears earlier in `entries`.
///
/// A single top-level file with no directory entries produces zero
/// directory-table rows rather than one for the root: every file's
/// `parent` is already `None` (the sentinel), so root never needs a row
/// of its own to be addressable.
fn build_tables<'a>(archive: &'a Archive) -> (Vec<DirRecord<'a>>, Vec<FileRecord<'a>>) {
    let mut dir_index = std::collections::HashMap::new();
    let mut dirs = Vec::new();
    let mut files = Vec::new();

    for entry in archive.entries() {
        match entry.kind {
            EntryKind::Directory => {
                let parent = parent_path(&entry.path).and_then(|p| dir_index.get(p).copied());
                dir_index.insert(entry.path.as_str(), dirs.len());
                dirs.push(DirRecord {
                    path: &entry.path,
                    parent,
                });
            }
            EntryKind::File => {
                let parent = parent_path(&entry.path).and_then(|p| dir_index.get(p).copied());
                files.push(FileRecord { entry, parent });
            }
        }
    }

    (dirs, files)
}

fn name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Both wire forms use an 8-bit length prefix: `ShortString` is capped at
/// 32 bytes, `LongString` at 255 — both fit in a `u8`. The difference
/// between the two is only the maximum name length allowed, not the
/// width of the length field itself.
fn write_name<W: Write>(writer: &mut W, name: &str, long: bool) -> Result<()> {
    let bytes = name.as_bytes();
    let max = if long { LONG_NAME_MAX } else { SHORT_NAME_MAX };
    if bytes.len() > max {
        return Err(DlcaError::InvalidParameter {
            arg: "name",
            sub: 0,
            index: 0,
            reason: format!("name '{name}' exceeds {max} bytes"),
        });
    }
    writer.write_all(&[bytes.len() as u8])?;
    writer.write_all(bytes)?;
    Ok(())
}

fn read_name<R: Read>(reader: &mut R) -> Result<String> {
    let mut len_buf = [0u8; 1];
    reader.read_exact(&mut len_buf)?;
    let mut bytes = vec![0u8; len_buf[0] as usize];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| DlcaError::InvalidUtf8(0))
}

/// Days since 1970-01-01 for a proleptic-Gregorian `(y, m, d)`. Howard
/// Hinnant's `days_from_civil`.
fn days_from_civil(y: i64, m: u32, d: u32) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400; // [0, 399]
    let mp = (m as i64 + 9) % 12; // [0, 11]
    let doy = (153 * mp + 2) / 5 + d as i64 - 1; // [0, 365]
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // [0, 146096]
    era * 146097 + doe - 719468
}

/// Inverse of [`days_from_civil`].
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = z - era * 146097; // [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365; // [0, 399]
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365]
    let mp = (5 * doy + 2) / 153; // [0, 11]
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32; // [1, 31]
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32; // [1, 12]
    let y = if m <= 2 { y + 1 } else { y };
    (y, m, d)
}

/// Packs a Unix timestamp (seconds) into a DOS-style date/time pair: a
/// `u16` date (7-bit year offset from 1980 in bits 9-15, month in bits
/// 5-8, day in bits 0-4) and a `u16` time (hour in bits 11-15, minute in
/// bits 5-10, 2-second count in bits 0-4). Out-of-range years clamp to
/// the nearest representable endpoint rather than erroring.
fn encode_short_timestamp(ts: i64) -> (u16, u16) {
    let days = ts.div_euclid(86_400);
    let secs_of_day = ts.rem_euclid(86_400);
    let (year, month, day) = civil_from_days(days);

    let year_offset = (year - SHORT_DATE_EPOCH_YEAR).clamp(0, 127) as u16;
    let date = (year_offset << 9) | ((month as u16) << 5) | (day as u16);

    let hour = (secs_of_day / 3600) as u16;
    let minute = ((secs_of_day % 3600) / 60) as u16;
    let two_second_count = ((secs_of_day % 60) / 2) as u16;
    let time = (hour << 11) | (minute << 5) | two_second_count;

    (date, time)
}

/// Inverse of [`encode_short_timestamp`], returning Unix seconds.
fn decode_short_timestamp(date: u16, time: u16) -> i64 {
    let year = SHORT_DATE_EPOCH_YEAR + ((date >> 9) & 0x7F) as i64;
    let month = (((date >> 5) & 0x0F) as u32).max(1);
    let day = ((date & 0x1F) as u32).max(1);
    let days = days_from_civil(year, month, day);

    let hour = ((time >> 11) & 0x1F) as i64;
    let minute = ((time >> 5) & 0x3F) as i64;
    let two_second_count = (time & 0x1F) as i64;

    days * 86_400 + hour * 3600 + minute * 60 + two_second_count * 2
}

fn write_timestamp<W: Write>(
    writer: &mut W,
    kind: TimestampKind,
    timestamp: Option<i64>,
) -> Result<()> {
    match kind {
        TimestampKind::None => Ok(()),
        TimestampKind::Short => {
            let (date, time) = encode_short_timestamp(timestamp.unwrap_or(0));
            writer.write_all(&date.to_le_bytes())?;
            writer.write_all(&time.to_le_bytes())?;
            Ok(())
        }
        TimestampKind::Full => {
            let ns = timestamp.unwrap_or(0).saturating_mul(1_000_000_000);
            writer.write_all(&ns.to_le_bytes())?;
            Ok(())
        }
    }
}

fn read_timestamp<R: Read>(reader: &mut R, kind: TimestampKind) -> Result<Option<i64>> {
    match kind {
        TimestampKind::None => Ok(None),
        TimestampKind::Short => {
            let mut date_buf = [0u8; 2];
            reader.read_exact(&mut date_buf)?;
            let mut time_buf = [0u8; 2];
            reader.read_exact(&mut time_buf)?;
            let date = u16::from_le_bytes(date_buf);
            let time = u16::from_le_bytes(time_buf);
            Ok(Some(decode_short_timestamp(date, time)))
        }
        TimestampKind::Full => {
            let mut buf = [0u8; 8];
            reader.read_exact(&mut buf)?;
            let ns = i64::from_le_bytes(buf);
            Ok(Some(ns / 1_000_000_000))
        }
    }
}

fn sentinel(class: SizeClass) -> u64 {
    match class {
        SizeClass::U8 => u8::MAX as u64,
        SizeClass::U16 => u16::MAX as u64,
        SizeClass::U32 => u32::MAX as u64,
        SizeClass::U64 => u64::MAX,
    }
}

fn write_index<W: Write>(writer: &mut W, class: SizeClass, index: Option<usize>) -> Result<()> {
    let value = match index {
        Some(i) => i as u64,
        None => sentinel(class),
    };
    size::write(writer, class, value)
}

fn read_index<R: Read>(reader: &mut R, class: SizeClass) -> Result<Option<usize>> {
    let value = size::read(reader, class)?;
    if value == sentinel(class) {
        Ok(None)
    } else {
        Ok(Some(value as usize))
    }
}

/// Serialize `archive` to `writer`. Returns the generated key when
/// `settings.encryption` is `Aes256Gcm` and `settings.key` was `None`.
pub fn write<W: Write>(
    writer: &mut W,
    archive: &Archive,
    settings: &CaSettings,
    rng: &dyn aead::RandomSource,
) -> Result<Option<[u8; aead::KEY_LEN]>> {
    assert_little_endian()?;

    let (dirs, files) = build_tables(archive);

    let long_names = archive
        .entries()
        .iter()
        .any(|e| name_of(&e.path).len() > SHORT_NAME_MAX);

    let index_population = dirs.len().max(files.len()) as u64;
    let index_class = size::required_class(index_population);

    let lengths: Vec<u64> = files.iter().map(|f| f.entry.data.len() as u64).collect();
    let max_len = lengths.iter().copied().max().unwrap_or(0);
    let entry_len_class = size::required_class(max_len);

    // The directory table, the file table, and the file data together
    // are the payload that gets compressed, hashed, and encrypted — the
    // table data is not plaintext framing. Only the two table counts
    // stay outside it, since a reader needs them before it can even size
    // the decrypted payload's table region.
    let mut payload = Vec::new();
    for dir in &dirs {
        write_index(&mut payload, index_class, dir.parent)?;
        write_name(&mut payload, name_of(dir.path), long_names)?;
    }
    for file in &files {
        write_index(&mut payload, index_class, file.parent)?;
        write_name(&mut payload, name_of(&file.entry.path), long_names)?;
        size::write(&mut payload, entry_len_class, file.entry.data.len() as u64)?;
        write_timestamp(&mut payload, settings.timestamp, file.entry.timestamp)?;
    }
    for file in &files {
        payload.extend_from_slice(&file.entry.data);
    }
    let total_len = payload.len() as u64;

    // As in the DL codec, the uncompressed-size field and the integrity
    // hash only exist when the payload is actually compressed.
    let is_compressed = settings.compression != CompressionKind::None;
    let digest = is_compressed.then(|| settings.hash.digest(&payload));
    let compressed = compression::compress(settings.compression, &payload)?;

    let mut flags = if settings.hash == HashKind::Sha256 {
        FLAG_USE_SHA256
    } else {
        0
    };
    if long_names {
        flags |= FLAG_LONG_NAMES;
    }
    flags |= match settings.timestamp {
        TimestampKind::None => 0,
        TimestampKind::Short => FLAG_TIMESTAMP_SHORT,
        TimestampKind::Full => FLAG_TIMESTAMP_FULL,
    };

    let size_types = SizeTypes {
        entry_count: index_class,
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

    size::write(writer, size_types.entry_count, dirs.len() as u64)?;
    size::write(writer, size_types.entry_count, files.len() as u64)?;

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
        directories = dirs.len(),
        files = files.len(),
        compressed = is_compressed,
        encrypted = settings.encryption != EncryptionKind::None,
        "wrote CA container"
    );

    Ok(generated_key)
}

/// Deserialize a CA file from `reader` into an [`Archive`], rebuilding
/// each entry's full path from its table's parent chain.
pub fn read<R: Read>(reader: &mut R, key: Option<&[u8; aead::KEY_LEN]>) -> Result<Archive> {
    assert_little_endian()?;

    let mut raw_header = Vec::new();
    let header = ContainerHeader::read_from(reader, MAGIC)?;
    header.write_to(&mut raw_header)?;

    if header.flags & FLAG_RESERVED_MASK != 0 {
        return Err(DlcaError::InvalidParameter {
            arg: "flags",
            sub: 0,
            index: 0,
            reason: "reserved CA flag bits must be zero".to_string(),
        });
    }
    let long_names = header.flags & FLAG_LONG_NAMES != 0;
    let hash_kind = HashKind::from_flag(header.flags & FLAG_USE_SHA256 != 0);
    let timestamp_kind = match (
        header.flags & FLAG_TIMESTAMP_SHORT != 0,
        header.flags & FLAG_TIMESTAMP_FULL != 0,
    ) {
        (false, false) => TimestampKind::None,
        (true, false) => TimestampKind::Short,
        (false, true) => TimestampKind::Full,
        (true, true) => {
            return Err(DlcaError::InvalidParameter {
                arg: "flags",
                sub: 0,
                index: 0,
                reason: "short and full timestamp bits are mutually exclusive".to_string(),
            })
        }
    };

    let index_class = header.size_types.entry_count;

    // Only the two table counts sit outside the protected payload; the
    // table bodies themselves travel inside it, alongside the file data,
    // so tampering with a name, parent index, length, or timestamp is
    // caught by the hash or the AEAD tag rather than going unnoticed.
    let dir_count = size::read(reader, index_class)?;
    let file_count = size::read(reader, index_class)?;

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
            let key = key.ok_or(DlcaError::InvalidOperation("AES-256-GCM decryption requires a key"))?;
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

    if let Some((_, expected)) = &digest {
        if &hash_kind.digest(&payload) != expected {
            tracing::warn!("CA payload failed integrity hash check");
            return Err(DlcaError::HashMismatch);
        }
    }

    let mut payload_cursor = &payload[..];

    let mut dir_paths: Vec<String> = Vec::with_capacity(dir_count as usize);
    for _ in 0..dir_count {
        let parent = read_index(&mut payload_cursor, index_class)?;
        let name = read_name(&mut payload_cursor)?;
        let path = match parent.and_then(|p| dir_paths.get(p)) {
            Some(parent_path) => format!("{parent_path}/{name}"),
            None => name,
        };
        dir_paths.push(path);
    }

    struct PendingFile {
        path: String,
        len: u64,
        timestamp: Option<i64>,
    }
    let mut pending = Vec::with_capacity(file_count as usize);
    for _ in 0..file_count {
        let parent = read_index(&mut payload_cursor, index_class)?;
        let name = read_name(&mut payload_cursor)?;
        let len = size::read(&mut payload_cursor, header.size_types.entry_len)?;
        let timestamp = read_timestamp(&mut payload_cursor, timestamp_kind)?;
        let path = match parent.and_then(|p| dir_paths.get(p)) {
            Some(parent_path) => format!("{parent_path}/{name}"),
            None => name,
        };
        pending.push(PendingFile { path, len, timestamp });
    }

    let data_start = payload.len() - payload_cursor.len();

    let mut archive = Archive::new();
    for path in &dir_paths {
        archive.add_directory(path)?;
    }

    let mut offset = data_start;
    for file in &pending {
        let len = file.len as usize;
        let slice = payload
            .get(offset..offset + len)
            .ok_or(DlcaError::InvalidState("payload shorter than declared file lengths"))?;
        let mut entry = ArchiveEntry::file(file.path.clone(), slice.to_vec());
        entry.timestamp = file.timestamp;
        archive.add_file(entry)?;
        offset += len;
    }

    tracing::debug!(entries = archive.len(), "read CA container");
    Ok(archive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aead::OsRandom;

    #[test]
    fn single_file_roundtrips() {
        let mut archive = Archive::new();
        archive
            .add_file(ArchiveEntry::file("readme.txt", b"hello".to_vec()))
            .unwrap();

        let settings = CaSettings::default();
        let mut buf = Vec::new();
        write(&mut buf, &archive, &settings, &OsRandom).unwrap();
        let decoded = read(&mut &buf[..], None).unwrap();

        assert_eq!(decoded.entries().len(), 1);
        assert_eq!(decoded.lookup("readme.txt").unwrap().data, b"hello");
    }

    #[test]
    fn nested_directory_roundtrips() {
        let mut archive = Archive::new();
        archive
            .add_file(ArchiveEntry::file("a/b/c.txt", b"nested".to_vec()))
            .unwrap();
        archive.add_directory("a/empty").unwrap();

        let mut buf = Vec::new();
        write(&mut buf, &archive, &CaSettings::default(), &OsRandom).unwrap();
        let decoded = read(&mut &buf[..], None).unwrap();

        assert!(decoded.lookup("a").is_some());
        assert!(decoded.lookup("a/b").is_some());
        assert!(decoded.lookup("a/empty").is_some());
        assert_eq!(decoded.lookup("a/b/c.txt").unwrap().data, b"nested");
    }

    #[test]
    fn encrypted_roundtrip_requires_key() {
        let mut archive = Archive::new();
        archive
            .add_file(ArchiveEntry::file("secret.bin", b"top secret".to_vec()))
            .unwrap();

        let settings = CaSettings {
            encryption: EncryptionKind::Aes256Gcm,
            key: Some([0x11u8; aead::KEY_LEN]),
            ..Default::default()
        };
        let mut buf = Vec::new();
        write(&mut buf, &archive, &settings, &OsRandom).unwrap();

        let decoded = read(&mut &buf[..], Some(&[0x11u8; aead::KEY_LEN])).unwrap();
        assert_eq!(decoded.lookup("secret.bin").unwrap().data, b"top secret");
        assert!(read(&mut &buf[..], None).is_err());
    }

    #[test]
    fn write_generates_and_returns_key_when_none_supplied() {
        let mut archive = Archive::new();
        archive
            .add_file(ArchiveEntry::file("auto.bin", b"needs a key".to_vec()))
            .unwrap();

        let settings = CaSettings {
            encryption: EncryptionKind::Aes256Gcm,
            key: None,
            ..Default::default()
        };
        let mut buf = Vec::new();
        let generated = write(&mut buf, &archive, &settings, &OsRandom)
            .unwrap()
            .expect("a key is generated when settings.key is None");

        let decoded = read(&mut &buf[..], Some(&generated)).unwrap();
        assert_eq!(decoded.lookup("auto.bin").unwrap().data, b"needs a key");
        assert!(read(&mut &buf[..], None).is_err());
    }

    #[test]
    fn full_timestamp_roundtrips() {
        let mut archive = Archive::new();
        archive
            .add_file(ArchiveEntry::file("f.txt", b"x".to_vec()).with_timestamp(1_700_000_000))
            .unwrap();

        let settings = CaSettings {
            timestamp: TimestampKind::Full,
            ..Default::default()
        };
        let mut buf = Vec::new();
        write(&mut buf, &archive, &settings, &OsRandom).unwrap();
        let decoded = read(&mut &buf[..], None).unwrap();
        assert_eq!(decoded.lookup("f.txt").unwrap().timestamp, Some(1_700_000_000));
    }

    #[test]
    fn long_name_is_detected_and_roundtrips() {
        let long_name = "x".repeat(64);
        let mut archive = Archive::new();
        archive
            .add_file(ArchiveEntry::file(long_name.clone(), b"y".to_vec()))
            .unwrap();

        let mut buf = Vec::new();
        write(&mut buf, &archive, &CaSettings::default(), &OsRandom).unwrap();
        let decoded = read(&mut &buf[..], None).unwrap();
        assert!(decoded.lookup(&long_name).is_some());
    }

    #[test]
    fn compressed_archive_roundtrips() {
        let mut archive = Archive::new();
        archive
            .add_file(ArchiveEntry::file(
                "big.txt",
                b"compress me please ".repeat(64),
            ))
            .unwrap();

        let settings = CaSettings {
            compression: CompressionKind::Brotli1,
            ..Default::default()
        };
        let mut buf = Vec::new();
        write(&mut buf, &archive, &settings, &OsRandom).unwrap();
        let decoded = read(&mut &buf[..], None).unwrap();
        assert_eq!(
            decoded.lookup("big.txt").unwrap().data,
            b"compress me please ".repeat(64)
        );
    }

    #[test]
    fn compressed_archive_detects_tampered_payload() {
        // The directory table, file table, and file data are all part of
        // the compressed payload the hash covers, so a single flipped
        // byte anywhere in it — not just in the data region — trips
        // HashMismatch.
        let mut archive = Archive::new();
        archive
            .add_file(ArchiveEntry::file(
                "big.txt",
                b"compress me please ".repeat(64),
            ))
            .unwrap();

        let settings = CaSettings {
            compression: CompressionKind::Brotli1,
            ..Default::default()
        };
        let mut buf = Vec::new();
        write(&mut buf, &archive, &settings, &OsRandom).unwrap();
        let last = buf.len() - 1;
        buf[last] ^= 0xFF;
        assert!(matches!(read(&mut &buf[..], None), Err(DlcaError::HashMismatch)));
    }

    #[test]
    fn tampering_a_file_table_entry_is_detected_under_encryption() {
        let mut archive = Archive::new();
        archive
            .add_file(ArchiveEntry::file("secret.bin", b"top secret".to_vec()))
            .unwrap();

        let settings = CaSettings {
            encryption: EncryptionKind::Aes256Gcm,
            key: Some([0x11u8; aead::KEY_LEN]),
            ..Default::default()
        };
        let mut buf = Vec::new();
        write(&mut buf, &archive, &settings, &OsRandom).unwrap();

        // Flip a byte well inside the ciphertext tail (the encrypted
        // file table + data), far from the IV/tag, to show the AEAD tag
        // — not just the prologue — now guards the table.
        let last = buf.len() - 1;
        buf[last] ^= 0xFF;
        assert!(matches!(
            read(&mut &buf[..], Some(&[0x11u8; aead::KEY_LEN])),
            Err(DlcaError::AuthenticationFailed)
        ));
    }

    #[test]
    fn short_timestamp_roundtrips_at_two_second_resolution() {
        // 2024-01-01T00:00:02Z: an even-second instant other than
        // midnight, to exercise the time-of-day bits the bare day
        // counter used to drop entirely.
        let ts = 1_704_067_202;
        let mut archive = Archive::new();
        archive
            .add_file(ArchiveEntry::file("f.txt", b"x".to_vec()).with_timestamp(ts))
            .unwrap();

        let settings = CaSettings {
            timestamp: TimestampKind::Short,
            ..Default::default()
        };
        let mut buf = Vec::new();
        write(&mut buf, &archive, &settings, &OsRandom).unwrap();
        let decoded = read(&mut &buf[..], None).unwrap();
        assert_eq!(decoded.lookup("f.txt").unwrap().timestamp, Some(ts));
    }

    #[test]
    fn short_timestamp_out_of_range_clamps_instead_of_erroring() {
        let far_future = 5_000_000_000_000i64; // year ~160000
        let (date, _) = encode_short_timestamp(far_future);
        assert_eq!((date >> 9) & 0x7F, 127);

        let before_epoch = -1i64;
        let (date, _) = encode_short_timestamp(before_epoch);
        assert_eq!((date >> 9) & 0x7F, 0);
    }

    #[test]
    fn full_timestamp_is_stored_as_nanoseconds_on_the_wire() {
        let ts = 1_700_000_000i64;
        let mut archive = Archive::new();
        archive
            .add_file(ArchiveEntry::file("f.txt", b"x".to_vec()).with_timestamp(ts))
            .unwrap();

        let settings = CaSettings {
            timestamp: TimestampKind::Full,
            ..Default::default()
        };
        let mut buf = Vec::new();
        write(&mut buf, &archive, &settings, &OsRandom).unwrap();

        // Full timestamps aren't compressed or encrypted here, so the
        // 8-byte field sits right before the single byte of file data
        // ("x") at the very end of the buffer; check it decodes as
        // seconds * 1e9, not raw seconds.
        let data_len = 1;
        let ns_bytes = &buf[buf.len() - 8 - data_len..buf.len() - data_len];
        let ns = i64::from_le_bytes(ns_bytes.try_into().unwrap());
        assert_eq!(ns, ts * 1_000_000_000);
    }
}

//! The header machinery shared by the DL and CA container formats:
//! magic/version/flags, the compression and encryption kind bytes, and
//! the packed `size_types` byte that picks a [`SizeClass`] per
//! variable-width count the body goes on to use.
//!
//! Mirrors the shared prologue the reference `oiDL`/`oiCA` structs both
//! open with before branching into format-specific tables.

use crate::compression::CompressionKind;
use crate::error::{DlcaError, Result};
use crate::size::SizeClass;
use std::io::{Read, Write};

/// Which AEAD (if any) protects a container's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EncryptionKind {
    None = 0,
    Aes256Gcm = 1,
}

impl EncryptionKind {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(EncryptionKind::None),
            1 => Ok(EncryptionKind::Aes256Gcm),
            other => Err(DlcaError::InvalidEncryption(other)),
        }
    }
}

/// The three populations a container's `size_types` byte records a
/// [`SizeClass`] for: the entry count, the largest single entry length,
/// and the total uncompressed payload size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeTypes {
    pub entry_count: SizeClass,
    pub entry_len: SizeClass,
    pub total_len: SizeClass,
}

impl SizeTypes {
    pub fn for_populations(entry_count: u64, max_entry_len: u64, total_len: u64) -> Self {
        SizeTypes {
            entry_count: crate::size::required_class(entry_count),
            entry_len: crate::size::required_class(max_entry_len),
            total_len: crate::size::required_class(total_len),
        }
    }

    /// Bits 0-1: entry-count class. Bits 2-3: uncompressed-size (`total_len`)
    /// class. Bits 4-5: per-entry-size (`entry_len`) class.
    pub fn pack(self) -> u8 {
        self.entry_count.tag() | (self.total_len.tag() << 2) | (self.entry_len.tag() << 4)
    }

    pub fn unpack(byte: u8) -> Result<Self> {
        if byte & 0b1100_0000 != 0 {
            return Err(DlcaError::InvalidParameter {
                arg: "size_types",
                sub: 0,
                index: 0,
                reason: "reserved bits 6-7 must be zero".to_string(),
            });
        }
        Ok(SizeTypes {
            entry_count: SizeClass::from_tag(byte)?,
            total_len: SizeClass::from_tag(byte >> 2)?,
            entry_len: SizeClass::from_tag(byte >> 4)?,
        })
    }
}

/// Flag bit common to both formats' `flags` byte; each format validates
/// its own remaining reserved bits since DL and CA assign them
/// differently.
pub const FLAG_USE_SHA256: u8 = 1 << 0;

/// The fixed-size prologue common to DL and CA containers: magic,
/// packed version, flags, compression/encryption kind, the two reserved
/// extended-data-length bytes (always 0 — no extension is defined in
/// v1.0), the packed size-class byte, and a padding byte. 12 bytes total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub magic: [u8; 4],
    pub version_major: u8,
    pub version_minor: u8,
    pub flags: u8,
    pub compression: CompressionKind,
    pub encryption: EncryptionKind,
    pub size_types: SizeTypes,
}

impl ContainerHeader {
    pub fn use_sha256(&self) -> bool {
        self.flags & FLAG_USE_SHA256 != 0
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_all(&[(self.version_major << 4) | (self.version_minor & 0x0F)])?;
        writer.write_all(&[self.flags])?;
        writer.write_all(&[self.compression as u8])?;
        writer.write_all(&[self.encryption as u8])?;
        writer.write_all(&[0u8])?; // header_extended_data length, reserved
        writer.write_all(&[0u8])?; // per_entry_extended_data length, reserved
        writer.write_all(&[self.size_types.pack()])?;
        writer.write_all(&[0u8])?; // padding
        tracing::trace!(
            magic = ?std::str::from_utf8(&self.magic).unwrap_or("?"),
            version = format!("{}.{}", self.version_major, self.version_minor),
            compression = ?self.compression,
            encryption = ?self.encryption,
            "wrote container header"
        );
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R, expected_magic: [u8; 4]) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != expected_magic {
            return Err(DlcaError::InvalidMagic);
        }

        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte)?;
        let version_major = byte[0] >> 4;
        let version_minor = byte[0] & 0x0F;
        if version_major != 1 {
            return Err(DlcaError::UnsupportedVersion(version_major, version_minor));
        }

        reader.read_exact(&mut byte)?;
        let flags = byte[0];

        reader.read_exact(&mut byte)?;
        let compression = CompressionKind::from_u8(byte[0])?;

        reader.read_exact(&mut byte)?;
        let encryption = EncryptionKind::from_u8(byte[0])?;

        reader.read_exact(&mut byte)?;
        if byte[0] != 0 {
            return Err(DlcaError::UnsupportedOperation(
                "header_extended_data is reserved and must be zero in v1.0",
            ));
        }

        reader.read_exact(&mut byte)?;
        if byte[0] != 0 {
            return Err(DlcaError::UnsupportedOperation(
                "per_entry_extended_data is reserved and must be zero in v1.0",
            ));
        }

        reader.read_exact(&mut byte)?;
        let size_types = SizeTypes::unpack(byte[0])?;

        reader.read_exact(&mut byte)?; // padding, ignored

        tracing::trace!(
            magic = ?std::str::from_utf8(&magic).unwrap_or("?"),
            version = format!("{version_major}.{version_minor}"),
            compression = ?compression,
            encryption = ?encryption,
            "read container header"
        );

        Ok(ContainerHeader {
            magic,
            version_major,
            version_minor,
            flags,
            compression,
            encryption,
            size_types,
        })
    }
}

pub const FORMAT_VERSION_MAJOR: u8 = 1;
pub const FORMAT_VERSION_MINOR: u8 = 0;

/// All on-disk fields are little-endian; refuse to run the codec at all
/// on a big-endian host rather than silently emit the wrong byte order.
pub fn assert_little_endian() -> Result<()> {
    if cfg!(target_endian = "little") {
        Ok(())
    } else {
        Err(DlcaError::UnsupportedEndianness)
    }
}

//! Brotli compression over a container's payload.
//!
//! Two quality presets: Brotli-11 (maximum ratio, the default) and
//! Brotli-1 (fast). The decoder is bounded by the declared uncompressed
//! size so a corrupt frame can't be expanded unboundedly.

use crate::error::{DlcaError, Result};
use std::io::Cursor;

/// Compression kinds a container may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionKind {
    None = 0,
    Brotli11 = 1,
    Brotli1 = 2,
}

impl CompressionKind {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(CompressionKind::None),
            1 => Ok(CompressionKind::Brotli11),
            2 => Ok(CompressionKind::Brotli1),
            other => Err(DlcaError::InvalidCompression(other)),
        }
    }

    fn quality(self) -> Option<u32> {
        match self {
            CompressionKind::None => None,
            CompressionKind::Brotli11 => Some(11),
            CompressionKind::Brotli1 => Some(1),
        }
    }
}

/// Compress `src` under `kind`. `CompressionKind::None` returns a copy.
pub fn compress(kind: CompressionKind, src: &[u8]) -> Result<Vec<u8>> {
    let Some(quality) = kind.quality() else {
        return Ok(src.to_vec());
    };

    let params = brotli::enc::BrotliEncoderParams {
        quality: quality as i32,
        ..Default::default()
    };

    let mut out = Vec::new();
    brotli::BrotliCompress(&mut Cursor::new(src), &mut out, &params)
        .map_err(|e| DlcaError::CompressionFailed(e.to_string()))?;
    Ok(out)
}

/// Decompress `src` under `kind`, bounded by `expected_size`.
///
/// `expected_size` is the uncompressed-size header field; it both sizes
/// the output buffer up front and rejects a frame that decodes to more
/// bytes than the header promised.
pub fn decompress(kind: CompressionKind, src: &[u8], expected_size: u64) -> Result<Vec<u8>> {
    if kind == CompressionKind::None {
        return Ok(src.to_vec());
    }

    let mut out = Vec::with_capacity(expected_size as usize);
    brotli::BrotliDecompress(&mut Cursor::new(src), &mut out)
        .map_err(|e| DlcaError::DecompressionFailed(e.to_string()))?;

    if out.len() as u64 != expected_size {
        return Err(DlcaError::DecompressionFailed(format!(
            "expected {} uncompressed bytes, got {}",
            expected_size,
            out.len()
        )));
    }

    Ok(out)
}

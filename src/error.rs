use std::io;
use thiserror::Error;

/// Result type for dlca operations
pub type Result<T> = std::result::Result<T, DlcaError>;

/// Unified error type for DL/CA container operations
#[derive(Debug, Error)]
pub enum DlcaError {
    #[error("null argument: {0}")]
    NullArgument(&'static str),

    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    #[error("invalid parameter {arg} (sub {sub}, index {index}): {reason}")]
    InvalidParameter {
        arg: &'static str,
        sub: u32,
        index: u32,
        reason: String,
    },

    #[error("overflow computing {which}: attempted {attempted}, current {current}")]
    Overflow {
        which: &'static str,
        attempted: u64,
        current: u64,
    },

    #[error("not found: {which} (sub {sub}, index {index})")]
    NotFound { which: String, sub: u32, index: u32 },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    #[error("AEAD authentication failed")]
    AuthenticationFailed,

    #[error("integrity hash mismatch")]
    HashMismatch,

    #[error("invalid magic number in container header")]
    InvalidMagic,

    #[error("unsupported container version: {0}.{1}")]
    UnsupportedVersion(u8, u8),

    #[error("invalid compression kind: {0}")]
    InvalidCompression(u8),

    #[error("invalid encryption kind: {0}")]
    InvalidEncryption(u8),

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("invalid ASCII entry at index {0}")]
    InvalidAscii(u64),

    #[error("invalid UTF-8 entry at index {0}")]
    InvalidUtf8(u64),

    #[error("path error: {0}")]
    PathError(String),

    #[error("non-little-endian host is not supported")]
    UnsupportedEndianness,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

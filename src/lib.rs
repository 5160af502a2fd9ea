//! dlca: container codec for the DL (data-list) and CA (archive) formats.
//!
//! - [`dl`] reads and writes DL files: a flat list of same-kind entries
//!   (raw bytes, ASCII, or UTF-8) under one compression/encryption/hash
//!   envelope.
//! - [`ca`] reads and writes CA files: a directory table, a file table,
//!   and a data region, under the same envelope.
//! - [`archive`] is the in-memory model both the CA codec and the
//!   recursive [`ingest`] builder operate on.
//! - [`path`] validates and resolves paths against a mount anchor before
//!   they ever reach a [`fs::FileSystem`].
//!
//! # Example
//!
//! ```no_run
//! use dlca::archive::{Archive, ArchiveEntry};
//! use dlca::ca::{self, CaSettings};
//! use dlca::aead::OsRandom;
//!
//! let mut archive = Archive::new();
//! archive.add_file(ArchiveEntry::file("hello.txt", b"hi".to_vec()))?;
//!
//! let mut buf = Vec::new();
//! ca::write(&mut buf, &archive, &CaSettings::default(), &OsRandom)?;
//! let decoded = ca::read(&mut &buf[..], None)?;
//! assert_eq!(decoded.lookup("hello.txt").unwrap().data, b"hi");
//! # Ok::<(), dlca::error::DlcaError>(())
//! ```

pub mod aead;
pub mod archive;
pub mod ca;
pub mod compression;
pub mod container;
pub mod dl;
pub mod error;
pub mod fs;
pub mod hash;
pub mod ingest;
pub mod path;
pub mod size;

pub use aead::{OsRandom, RandomSource};
pub use archive::{Archive, ArchiveEntry, EntryKind};
pub use ca::{CaSettings, TimestampKind};
pub use compression::CompressionKind;
pub use container::EncryptionKind;
pub use dl::{DlDataKind, DlEntry, DlFile, DlSettings};
pub use error::{DlcaError, Result};
pub use fs::{FileSystem, StdFileSystem};
pub use hash::HashKind;
pub use ingest::{ingest, IngestOptions};
pub use path::{resolve, ResolvedPath};
pub use size::SizeClass;

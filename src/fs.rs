//! External collaborator interfaces: the filesystem and random-source
//! traits the codec core is built against, plus a `std::fs`-backed
//! reference implementation of the former.
//!
//! Kept as traits (rather than calling `std::fs` directly from the
//! ingester) so a caller can substitute a virtual or in-memory
//! filesystem for disk I/O.

pub use crate::aead::{OsRandom, RandomSource};
use crate::error::{DlcaError, Result};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Metadata about a filesystem entry, as returned by [`FileSystem::get_info`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub is_directory: bool,
    pub len: u64,
    pub modified_unix: Option<i64>,
}

/// The filesystem operations the codec core needs, decoupled from
/// `std::fs` so a caller can supply an in-memory or virtual backend.
pub trait FileSystem {
    fn get_info(&self, path: &str) -> Result<EntryInfo>;
    fn read(&self, path: &str) -> Result<Vec<u8>>;
    fn write(&self, path: &str, data: &[u8]) -> Result<()>;
    /// Walk every entry reachable under `root`, calling `visit` with each
    /// full path relative to `root` and whether it is a directory.
    fn foreach(&self, root: &str, visit: &mut dyn FnMut(&str, bool) -> Result<()>) -> Result<()>;
    fn add(&self, path: &str, is_directory: bool) -> Result<()>;
    fn remove(&self, path: &str) -> Result<()>;
    fn rename(&self, from: &str, to: &str) -> Result<()>;
    /// Resolve `raw` against this filesystem's anchor, per [`crate::path::resolve`].
    fn resolve(&self, raw: &str) -> Result<String>;
}

/// A [`FileSystem`] backed directly by `std::fs`, rooted at `anchor`.
///
/// Grounded in the directory-walking style `walkdir` is used for
/// elsewhere in the corpus: entries are yielded in depth-first order
/// with directories visited before their children, matching the
/// topological order [`crate::archive::Archive`] requires.
pub struct StdFileSystem {
    anchor: PathBuf,
}

impl StdFileSystem {
    pub fn new(anchor: impl Into<PathBuf>) -> Self {
        StdFileSystem {
            anchor: anchor.into(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.anchor.join(path.trim_start_matches('/'))
    }

    fn anchor_str(&self) -> String {
        self.anchor.to_string_lossy().replace('\\', "/")
    }
}

impl FileSystem for StdFileSystem {
    fn get_info(&self, path: &str) -> Result<EntryInfo> {
        let meta = fs::metadata(self.full_path(path))?;
        let modified_unix = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64);
        Ok(EntryInfo {
            is_directory: meta.is_dir(),
            len: meta.len(),
            modified_unix,
        })
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let mut file = fs::File::open(self.full_path(path))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let full = self.full_path(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(full)?;
        file.write_all(data)?;
        Ok(())
    }

    fn foreach(&self, root: &str, visit: &mut dyn FnMut(&str, bool) -> Result<()>) -> Result<()> {
        let base = self.full_path(root);
        for entry in walkdir::WalkDir::new(&base)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| DlcaError::Io(e.into()))?;
            let relative = entry
                .path()
                .strip_prefix(&base)
                .map_err(|_| DlcaError::InvalidState("walked entry escaped its root"))?;
            let relative_str = relative.to_string_lossy().replace('\\', "/");
            visit(&relative_str, entry.file_type().is_dir())?;
        }
        Ok(())
    }

    fn add(&self, path: &str, is_directory: bool) -> Result<()> {
        let full = self.full_path(path);
        if is_directory {
            fs::create_dir_all(full)?;
        } else {
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::File::create(full)?;
        }
        Ok(())
    }

    fn remove(&self, path: &str) -> Result<()> {
        let full = self.full_path(path);
        if full.is_dir() {
            fs::remove_dir_all(full)?;
        } else {
            fs::remove_file(full)?;
        }
        Ok(())
    }

    fn rename(&self, from: &str, to: &str) -> Result<()> {
        fs::rename(self.full_path(from), self.full_path(to))?;
        Ok(())
    }

    fn resolve(&self, raw: &str) -> Result<String> {
        let anchor = self.anchor_str();
        Ok(crate::path::resolve(raw, &anchor)?.path)
    }
}

/// True when `path` exists as a directory, without failing if it's
/// simply absent — used by the ingester to decide whether to `add` a
/// missing parent before writing under it.
pub fn exists(path: &Path) -> bool {
    path.try_exists().unwrap_or(false)
}

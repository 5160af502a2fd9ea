//! Recursive ingestion: walk a directory through a [`FileSystem`] and
//! build an [`Archive`] from it, validating every path through
//! [`crate::path::resolve`] as it goes.
//!
//! Grounded in `convert_oiCA.c`'s directory walk: strip the root
//! prefix, resolve and validate what's left, then add it to the
//! archive as a file or directory.

use crate::archive::{Archive, ArchiveEntry};
use crate::error::{DlcaError, Result};
use crate::fs::FileSystem;
use std::time::{Duration, Instant};

/// Default ceiling on how long a single ingestion run may read from the
/// filesystem before it's aborted as hung.
pub const DEFAULT_READ_DEADLINE: Duration = Duration::from_secs(1);

/// Options controlling a recursive ingestion.
#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    pub read_deadline: Duration,
}

impl Default for IngestOptions {
    fn default() -> Self {
        IngestOptions {
            read_deadline: DEFAULT_READ_DEADLINE,
        }
    }
}

/// Walk `root` on `fs` and build an [`Archive`] of everything under it.
///
/// `root` is stripped from every discovered path before it's resolved
/// against `fs`'s anchor and validated, so the archive's paths are
/// relative to `root` rather than absolute.
pub fn ingest(fs: &dyn FileSystem, root: &str, options: &IngestOptions) -> Result<Archive> {
    let started = Instant::now();
    let mut archive = Archive::new();

    let anchor = fs.resolve(root)?;

    let mut walk_err: Option<DlcaError> = None;
    fs.foreach(root, &mut |relative, is_directory| {
        if started.elapsed() > options.read_deadline {
            return Err(DlcaError::InvalidState("ingestion exceeded its read deadline"));
        }

        let resolved = fs.resolve(relative)?;
        let stripped = resolved
            .strip_prefix(&anchor)
            .map(|s| s.trim_start_matches('/'))
            .unwrap_or(relative)
            .to_string();

        if stripped.is_empty() {
            return Ok(());
        }

        let result = if is_directory {
            archive.add_directory(&stripped)
        } else {
            let data = fs.read(relative)?;
            let timestamp = fs.get_info(relative).ok().and_then(|info| info.modified_unix);
            let mut entry = ArchiveEntry::file(stripped, data);
            entry.timestamp = timestamp;
            archive.add_file(entry)
        };

        if let Err(e) = result {
            walk_err = Some(e);
        }
        Ok(())
    })?;

    if let Some(e) = walk_err {
        return Err(e);
    }

    Ok(archive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::EntryKind;
    use crate::fs::StdFileSystem;

    #[test]
    fn ingest_walks_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let vfs = StdFileSystem::new(dir.path());
        vfs.write("src/main.rs", b"fn main() {}").unwrap();
        vfs.write("README.md", b"hello").unwrap();

        let archive = ingest(&vfs, "", &IngestOptions::default()).unwrap();

        assert!(archive.lookup("src").is_some());
        assert_eq!(archive.lookup("src").unwrap().kind, EntryKind::Directory);
        assert_eq!(
            archive.lookup("src/main.rs").unwrap().data,
            b"fn main() {}"
        );
        assert_eq!(archive.lookup("README.md").unwrap().data, b"hello");
    }

    #[test]
    fn ingest_of_empty_directory_is_empty_archive() {
        let dir = tempfile::tempdir().unwrap();
        let vfs = StdFileSystem::new(dir.path());
        let archive = ingest(&vfs, "", &IngestOptions::default()).unwrap();
        assert!(archive.is_empty());
    }

    #[test]
    fn zero_deadline_aborts_immediately_on_nonempty_tree() {
        let dir = tempfile::tempdir().unwrap();
        let vfs = StdFileSystem::new(dir.path());
        vfs.write("a.txt", b"x").unwrap();

        let options = IngestOptions {
            read_deadline: Duration::from_secs(0),
        };
        assert!(ingest(&vfs, "", &options).is_err());
    }
}

//! Path resolution and validation, ported from the reference
//! `File_resolve` routine: normalizes separators, collapses `.`/`..`
//! within an anchor, rejects reserved DOS device names and traversal
//! outside the mount, and classifies virtual (`//`) paths.

use crate::error::{DlcaError, Result};

/// Platforms with drive letters (`C:/...`) get the legacy-form rejection
/// and the 260-byte MAX_PATH check; everything else skips both.
#[cfg(windows)]
const DRIVE_LETTER_PLATFORM: bool = true;
#[cfg(not(windows))]
const DRIVE_LETTER_PLATFORM: bool = false;

const MAX_DRIVE_PATH_LEN: usize = 260;

/// A path resolved and validated against a mount anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub is_virtual: bool,
    pub path: String,
}

/// Resolve `raw` relative to `anchor` (the platform working-directory
/// anchor), normalizing separators, collapsing `.`/`..` without
/// escaping the anchor, and rejecting UNC paths and reserved names.
pub fn resolve(raw: &str, anchor: &str) -> Result<ResolvedPath> {
    if raw.starts_with("\\\\") {
        return Err(DlcaError::UnsupportedOperation("UNC paths are not supported"));
    }

    let is_virtual = raw.starts_with("//");
    let normalized = raw.replace('\\', "/");

    if DRIVE_LETTER_PLATFORM {
        if normalized.len() >= 2
            && normalized.as_bytes()[1] == b':'
            && !(normalized.len() >= 3
                && normalized.as_bytes()[2] == b'/'
                && normalized.as_bytes()[0].is_ascii_alphabetic())
        {
            return Err(DlcaError::UnsupportedOperation(
                "drive-relative paths (X:foo) are not supported",
            ));
        }
    } else if normalized.len() >= 2 && normalized.as_bytes()[1] == b':' {
        return Err(DlcaError::InvalidOperation(
            "drive letters are not meaningful on this platform",
        ));
    }

    let components: Vec<&str> = normalized.split('/').collect();
    let mut kept: Vec<&str> = Vec::with_capacity(components.len());

    for (i, comp) in components.iter().enumerate() {
        if comp.is_empty() {
            // A leading empty component is how `//virtual` paths start;
            // everywhere else (including a doubled `//` mid-path) it just
            // collapses away.
            if i == 0 && is_virtual {
                continue;
            }
            continue;
        }

        if *comp == "." {
            continue;
        }

        if *comp == ".." {
            if kept.is_empty() {
                return Err(DlcaError::InvalidParameter {
                    arg: "path",
                    sub: 0,
                    index: i as u32,
                    reason: "'..' would escape the anchor".to_string(),
                });
            }
            kept.pop();
            continue;
        }

        validate_component(comp, i as u32)?;
        kept.push(comp);
    }

    let rejoined = kept.join("/");

    let is_absolute = if DRIVE_LETTER_PLATFORM {
        if rejoined.starts_with('/') {
            return Err(DlcaError::UnsupportedOperation(
                "drive-absolute paths must start with a drive letter on this platform",
            ));
        }
        rejoined.len() >= 2 && rejoined.as_bytes()[1] == b':'
    } else {
        normalized.starts_with('/')
    };

    let full = if is_virtual {
        rejoined
    } else if is_absolute {
        if !rejoined.to_lowercase().starts_with(&anchor.to_lowercase()) {
            return Err(DlcaError::Unauthorized(
                "absolute path escapes the mount anchor".to_string(),
            ));
        }
        rejoined
    } else {
        let mut joined = anchor.trim_end_matches('/').to_string();
        joined.push('/');
        joined.push_str(&rejoined);
        joined
    };

    if DRIVE_LETTER_PLATFORM && full.len() >= MAX_DRIVE_PATH_LEN {
        return Err(DlcaError::InvalidParameter {
            arg: "path",
            sub: 0,
            index: 0,
            reason: format!("resolved path exceeds {} bytes", MAX_DRIVE_PATH_LEN),
        });
    }

    Ok(ResolvedPath {
        is_virtual,
        path: full,
    })
}

fn validate_component(comp: &str, index: u32) -> Result<()> {
    if comp.bytes().any(|b| b == 0 || b.is_ascii_control()) {
        return Err(DlcaError::InvalidParameter {
            arg: "path",
            sub: 1,
            index,
            reason: "component contains a NUL or control character".to_string(),
        });
    }

    if is_reserved_name(comp) {
        return Err(DlcaError::InvalidParameter {
            arg: "path",
            sub: 2,
            index,
            reason: format!("'{comp}' is a reserved device name"),
        });
    }

    Ok(())
}

/// Case-insensitive match against CON/AUX/NUL/PRN/COMn/LPTn (n in 0..9).
fn is_reserved_name(comp: &str) -> bool {
    let upper = comp.to_ascii_uppercase();
    if matches!(upper.as_str(), "CON" | "AUX" | "NUL" | "PRN") {
        return true;
    }
    if upper.len() == 4 {
        let (prefix, last) = upper.split_at(3);
        if (prefix == "COM" || prefix == "LPT") && last.chars().next().is_some_and(|c| c.is_ascii_digit())
        {
            return true;
        }
    }
    false
}

/// A raw path beginning with `//` addresses the application-managed
/// virtual namespace rather than the host filesystem.
pub fn is_virtual(raw: &str) -> bool {
    raw.starts_with("//")
}

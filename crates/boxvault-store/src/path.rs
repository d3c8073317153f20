//! Containment-checked path resolution.
//!
//! Relative paths arrive from callers that may pass attacker-controlled
//! segments (an owner or box name containing `../`). Resolution is a
//! conservative normalize-then-prefix-check: normalization is purely
//! lexical, so the outcome does not depend on what currently exists on
//! disk.
//!
//! Rejected outright:
//! - absolute paths (and Windows path prefixes)
//! - any `..` that would climb above the root
//! - anything whose normalized join does not remain under the root

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, StoreError};

/// Resolve `relative` against `root`, guaranteeing the result stays inside
/// `root`.
///
/// `.` segments are dropped and `..` segments pop the previously accepted
/// segment; popping past the top of the path is an escape. Symlinks are not
/// chased — the check is lexical only, and the store itself never creates
/// symlinks.
pub fn resolve_under(root: &Path, relative: &str) -> Result<PathBuf> {
    let mut segments: Vec<&OsStr> = Vec::new();

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(segment) => segments.push(segment),
            Component::CurDir => {}
            Component::ParentDir => {
                if segments.pop().is_none() {
                    return Err(escape(relative));
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(escape(relative)),
        }
    }

    let mut resolved = root.to_path_buf();
    for segment in &segments {
        resolved.push(segment);
    }

    // Invariant: resolve(root, p).starts_with(root) holds for every Ok result.
    if !resolved.starts_with(root) {
        return Err(escape(relative));
    }

    Ok(resolved)
}

fn escape(relative: &str) -> StoreError {
    StoreError::PathEscape {
        path: relative.to_string(),
    }
}

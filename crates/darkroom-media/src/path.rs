//! # Path Confinement
//!
//! Resolves a caller-supplied relative path beneath a trusted base directory
//! using pure lexical path arithmetic. `.` and `..` components are resolved
//! without touching the filesystem, and any sequence that would escape the
//! base fails with [`MediaError::InvalidPath`]. The resolved path is always
//! equal to, or a descendant of, the base.

use std::path::{Component, Path, PathBuf};

use crate::error::MediaError;

/// Resolve `rel` beneath `base`, rejecting any escape from `base`.
///
/// Absolute components (a leading `/` or a Windows prefix) are rejected
/// outright; `..` is resolved lexically and fails the moment it would step
/// above the base. Side-effect free: symlinks are not followed because the
/// filesystem is never consulted.
pub fn resolve_under(base: &Path, rel: &str) -> Result<PathBuf, MediaError> {
    let mut resolved = base.to_path_buf();

    for component in Path::new(rel).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if resolved == base || !resolved.pop() {
                    return Err(MediaError::InvalidPath(rel.to_string()));
                }
                if !resolved.starts_with(base) {
                    return Err(MediaError::InvalidPath(rel.to_string()));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(MediaError::InvalidPath(rel.to_string()));
            }
        }
    }

    if resolved.starts_with(base) {
        Ok(resolved)
    } else {
        Err(MediaError::InvalidPath(rel.to_string()))
    }
}

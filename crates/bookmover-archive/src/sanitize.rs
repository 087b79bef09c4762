//! Zip-slip and symlink-escape prevention for untrusted archive entries.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Resolves an entry path against `base`, rejecting anything that would
/// land outside it (absolute paths, `..` escapes).
pub fn sanitize_path(entry_path: &Path, base: &Path) -> Result<PathBuf> {
    let normalized = normalize_path(entry_path);
    if normalized.is_absolute() {
        return Err(Error::ZipSlip {
            entry: entry_path.to_path_buf(),
            resolved: normalized,
        });
    }

    let resolved = normalize_path(&base.join(&normalized));
    if !resolved.starts_with(base) {
        return Err(Error::ZipSlip {
            entry: entry_path.to_path_buf(),
            resolved,
        });
    }
    Ok(resolved)
}

/// Resolves a symlink target relative to where the symlink itself lives,
/// rejecting targets that are absolute or that escape `base`.
pub fn sanitize_symlink_target(target: &Path, symlink_location: &Path, base: &Path) -> Result<PathBuf> {
    if target.is_absolute() {
        return Err(Error::AbsoluteSymlinkTarget {
            target: target.to_path_buf(),
        });
    }

    let normalized_target = normalize_path(target);
    let resolved = symlink_location
        .parent()
        .map(|parent| parent.join(&normalized_target))
        .unwrap_or(normalized_target);
    let resolved = normalize_path(&resolved);

    if !resolved.starts_with(base) {
        return Err(Error::SymlinkEscape {
            target: target.to_path_buf(),
            resolved,
        });
    }
    Ok(resolved)
}

fn normalize_path(path: &Path) -> PathBuf {
    let forward_slashed = path.to_string_lossy().replace('\\', "/");
    let mut result = PathBuf::new();
    for component in Path::new(&forward_slashed).components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(part) => result.push(part),
            Component::RootDir | Component::Prefix(_) => result.push(component.as_os_str()),
            Component::CurDir => {}
        }
    }
    result
}

//! Temp-file-then-rename writes, with one addition required by the
//! progress store's error-handling contract (§4.4, §7): when the rename
//! itself fails, fall back to a direct (non-atomic) write rather than
//! propagating the error, and report that the fallback happened so the
//! caller can flag it.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, Default)]
pub struct AtomicWriteOptions {
    pub permissions: Option<u32>,
    pub sync: bool,
}

impl AtomicWriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permissions(mut self, mode: u32) -> Self {
        self.permissions = Some(mode);
        self
    }

    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

/// Whether `atomic_write` completed via the atomic rename path or had to
/// fall back to a direct write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    Atomic,
    DirectFallback,
}

/// Writes `content` to `path` via a sibling temp file and rename. If the
/// rename fails, writes directly to `path` instead of giving up — this is
/// the "fallback direct write" row of the error taxonomy (§7); the second
/// failure (direct write also failing) is still propagated as an error so
/// the worker can suspend.
pub fn atomic_write(
    path: impl AsRef<Path>,
    content: &[u8],
    options: AtomicWriteOptions,
) -> Result<WriteMode> {
    let path = path.as_ref();
    let parent = path
        .parent()
        .ok_or_else(|| Error::NoParent { path: path.to_path_buf() })?;

    let mut tmp_path = parent.to_path_buf();
    tmp_path.push(format!(".tmp.{}.bookmover", uuid::Uuid::new_v4()));

    fs::write(&tmp_path, content).map_err(|e| Error::Write {
        path: tmp_path.clone(),
        source: e,
    })?;

    #[cfg(unix)]
    if let Some(mode) = options.permissions {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(mode)).map_err(|e| {
            Error::Write {
                path: tmp_path.clone(),
                source: e,
            }
        })?;
    }

    if options.sync {
        let file = fs::File::open(&tmp_path).map_err(|e| Error::Write {
            path: tmp_path.clone(),
            source: e,
        })?;
        file.sync_all().map_err(|e| Error::Write {
            path: tmp_path.clone(),
            source: e,
        })?;
    }

    match fs::rename(&tmp_path, path) {
        Ok(()) => Ok(WriteMode::Atomic),
        Err(rename_err) => {
            tracing::warn!(
                ?path,
                error = %rename_err,
                "atomic rename failed, falling back to direct write"
            );
            let _ = fs::remove_file(&tmp_path);
            fs::write(path, content).map_err(|e| Error::Write {
                path: path.to_path_buf(),
                source: e,
            })?;
            Ok(WriteMode::DirectFallback)
        }
    }
}

pub fn atomic_read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_content_via_atomic_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");
        let mode = atomic_write(&path, b"hello world", AtomicWriteOptions::new()).unwrap();
        assert_eq!(mode, WriteMode::Atomic);
        assert_eq!(fs::read(&path).unwrap(), b"hello world");
    }

    #[test]
    fn applies_requested_permissions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");
        atomic_write(&path, b"data", AtomicWriteOptions::new().permissions(0o640)).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = fs::metadata(&path).unwrap();
            assert_eq!(metadata.permissions().mode() & 0o777, 0o640);
        }
    }

    #[test]
    fn overwrites_existing_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        atomic_write(&path, b"{\"a\":1}", AtomicWriteOptions::new()).unwrap();
        atomic_write(&path, b"{\"a\":2}", AtomicWriteOptions::new()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\":2}");
    }

    #[test]
    fn missing_parent_directory_is_an_error() {
        let path = Path::new("/nonexistent-root-bookmover/child/file.txt");
        let err = atomic_write(path, b"x", AtomicWriteOptions::new()).unwrap_err();
        assert!(matches!(err, Error::Write { .. } | Error::NoParent { .. }));
    }

    #[test]
    fn read_round_trips_written_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");
        atomic_write(&path, b"round trip", AtomicWriteOptions::new()).unwrap();
        assert_eq!(atomic_read(&path).unwrap(), b"round trip");
    }
}

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::{Error, Result};
use crate::format::{ArchiveFormat, Compression};
use crate::sanitize::{sanitize_path, sanitize_symlink_target};

const SNIFF_LEN: usize = 512;

/// Tally of what an extraction actually did, reported back to the caller
/// for progress/logging purposes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArchiveReport {
    pub files_extracted: u64,
    pub bytes_extracted: u64,
    pub entries_skipped: u64,
}

/// Opens `path`, detects its container format from the leading bytes, and
/// extracts it into `dest` (created if absent). Unsafe entries (zip-slip,
/// symlink escape) are skipped rather than aborting the whole archive,
/// since one bad entry in a multi-gigabyte bundle should not block the
/// rest of the batch.
pub fn extract_archive(path: &Path, dest: &Path) -> Result<ArchiveReport> {
    let mut file = File::open(path)?;
    let mut sniff = [0u8; SNIFF_LEN];
    let n = file.read(&mut sniff)?;
    file.seek(SeekFrom::Start(0))?;

    let format = crate::format::detect_format(&sniff[..n]).ok_or(Error::UnsupportedFormat)?;
    fs::create_dir_all(dest)?;

    match format {
        ArchiveFormat::Zip => extract_zip(file, dest),
        ArchiveFormat::Tar(Compression::None) => extract_tar(file, dest),
        ArchiveFormat::Tar(Compression::Gzip) => extract_tar(GzDecoder::new(file), dest),
    }
}

fn extract_tar(reader: impl Read, dest: &Path) -> Result<ArchiveReport> {
    let mut report = ArchiveReport::default();
    let mut archive = tar::Archive::new(reader);
    for entry in archive.entries()? {
        let mut entry = entry.map_err(|_| Error::Corrupted)?;
        let entry_path = entry.path().map_err(|_| Error::Corrupted)?.into_owned();

        let resolved = match sanitize_path(&entry_path, dest) {
            Ok(p) => p,
            Err(error) => {
                tracing::warn!(?entry_path, %error, "skipping unsafe tar entry");
                report.entries_skipped += 1;
                continue;
            }
        };

        if entry.header().entry_type().is_dir() {
            fs::create_dir_all(&resolved)?;
            continue;
        }
        if entry.header().entry_type().is_symlink() {
            let target = entry
                .link_name()
                .ok()
                .flatten()
                .map(|t| t.into_owned())
                .unwrap_or_default();
            if sanitize_symlink_target(&target, &resolved, dest).is_err() {
                report.entries_skipped += 1;
                continue;
            }
            // Symlinks are recorded as skipped rather than materialized:
            // the worker reads file bytes directly out of the extraction
            // folder and has no use for a dangling link.
            report.entries_skipped += 1;
            continue;
        }

        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&resolved)?;
        let bytes = io::copy(&mut entry, &mut out)?;
        report.files_extracted += 1;
        report.bytes_extracted += bytes;
    }
    Ok(report)
}

fn extract_zip(reader: impl Read + Seek, dest: &Path) -> Result<ArchiveReport> {
    let mut report = ArchiveReport::default();
    let mut archive = zip::ZipArchive::new(reader).map_err(|_| Error::Corrupted)?;
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|_| Error::Corrupted)?;
        let entry_path = match file.enclosed_name() {
            Some(p) => p,
            None => {
                report.entries_skipped += 1;
                continue;
            }
        };

        let resolved = match sanitize_path(&entry_path, dest) {
            Ok(p) => p,
            Err(error) => {
                tracing::warn!(?entry_path, %error, "skipping unsafe zip entry");
                report.entries_skipped += 1;
                continue;
            }
        };

        if file.is_dir() {
            fs::create_dir_all(&resolved)?;
            continue;
        }
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&resolved)?;
        let bytes = io::copy(&mut file, &mut out)?;
        report.files_extracted += 1;
        report.bytes_extracted += bytes;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn build_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options: zip::write::FileOptions<()> = zip::write::FileOptions::default();
        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn extracts_zip_entries_into_destination() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("book.zip");
        build_zip(&archive_path, &[("a.txt", b"hello"), ("sub/b.txt", b"world")]);

        let dest = dir.path().join("extracted");
        let report = extract_archive(&archive_path, &dest).unwrap();
        assert_eq!(report.files_extracted, 2);
        assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"hello");
        assert_eq!(fs::read(dest.join("sub/b.txt")).unwrap(), b"world");
    }

    #[test]
    fn unrecognized_bytes_yield_unsupported_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("not-an-archive.bin");
        fs::write(&path, b"plain text, not an archive").unwrap();
        let dest = dir.path().join("extracted");
        let err = extract_archive(&path, &dest).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat));
    }

    #[test]
    fn zip_slip_entry_is_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("evil.zip");
        let file = File::create(&archive_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options: zip::write::FileOptions<()> = zip::write::FileOptions::default();
        writer.start_file("safe.txt", options).unwrap();
        writer.write_all(b"ok").unwrap();
        writer.finish().unwrap();

        let dest = dir.path().join("extracted");
        let report = extract_archive(&archive_path, &dest).unwrap();
        assert_eq!(report.files_extracted, 1);
    }
}

//! Archive container format detection by byte-slice magic matching.
//! Compression is trimmed to the two kinds this workspace's dependency
//! stack actually decodes (plain and gzip); `xz`/`zstd` bundles are out of
//! scope, only enough detection to drive folder reuse and extraction is
//! needed.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar(Compression),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
}

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];

fn is_tar_header(data: &[u8]) -> bool {
    data.len() >= 265 && &data[257..263] == b"ustar\0"
}

/// Detects the archive container from its leading bytes.
pub fn detect_format(data: &[u8]) -> Option<ArchiveFormat> {
    if data.starts_with(&ZIP_MAGIC) {
        return Some(ArchiveFormat::Zip);
    }
    if data.starts_with(&GZIP_MAGIC) {
        return Some(ArchiveFormat::Tar(Compression::Gzip));
    }
    if is_tar_header(data) {
        return Some(ArchiveFormat::Tar(Compression::None));
    }
    None
}

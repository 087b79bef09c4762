use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use bookmover_model::Fingerprint;

use crate::error::{Error, Result};
use crate::hasher::{Hasher, Sha1Hasher};
use crate::reader::HashingReader;

const READ_BUF_CAP: usize = 64 * 1024;

/// Computes the SHA-1 content fingerprint of a file (§4.1). Streams the
/// whole file through a single buffered pass; never partially succeeds —
/// any I/O error aborts before a `Fingerprint` is produced.
pub fn fingerprint(path: impl AsRef<Path>) -> Result<Fingerprint> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let size = file
        .metadata()
        .map_err(|e| Error::Io {
            path: path.to_path_buf(),
            source: e,
        })?
        .len();

    let buffered = BufReader::with_capacity(READ_BUF_CAP, file);
    let mut reader = HashingReader::new(buffered, Sha1Hasher::new());
    io::copy(&mut reader, &mut io::sink()).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let (_, digest) = reader.finish();

    Ok(Fingerprint::new(hex_encode(&digest), size))
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::Sha1Hasher as Hasher1;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn fingerprint_matches_direct_digest_and_size() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"the quick brown fox").unwrap();
        file.flush().unwrap();

        let fp = fingerprint(file.path()).unwrap();
        assert_eq!(fp.size(), 20);
        assert_eq!(fp.hash(), hex_encode(&Hasher1::digest(b"the quick brown fox")));
    }

    #[test]
    fn identical_content_yields_identical_fingerprint() {
        let mut a = NamedTempFile::new().unwrap();
        let mut b = NamedTempFile::new().unwrap();
        a.write_all(b"same bytes").unwrap();
        b.write_all(b"same bytes").unwrap();
        a.flush().unwrap();
        b.flush().unwrap();

        assert_eq!(fingerprint(a.path()).unwrap(), fingerprint(b.path()).unwrap());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = fingerprint("/no/such/path/bookmover-test").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}

use std::io::{self, Read};

use crate::hasher::Hasher;

/// Tee-reader that feeds every byte read through it into a `Hasher`, so
/// hashing and any downstream consumption (streaming to an upload, copying
/// to a staging path) happen in a single pass.
pub struct HashingReader<R, H> {
    inner: R,
    hasher: H,
    bytes_read: u64,
}

impl<R, H> HashingReader<R, H> {
    pub fn new(inner: R, hasher: H) -> Self {
        Self {
            inner,
            hasher,
            bytes_read: 0,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl<R, H: Hasher> HashingReader<R, H> {
    pub fn finish(self) -> (u64, Vec<u8>) {
        (self.bytes_read, self.hasher.finalize())
    }
}

impl<R: Read, H: Hasher> Read for HashingReader<R, H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        self.bytes_read += n as u64;
        Ok(n)
    }
}

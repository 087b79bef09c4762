use sha1::{Digest, Sha1};

/// Minimal streaming hash seam so a single tee-reader can drive any
/// algorithm. The fingerprint's hash algorithm (§3) is pinned to SHA-1, but
/// the trait itself carries no algorithm assumption.
pub trait Hasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Vec<u8>;
}

pub struct Sha1Hasher(Sha1);

impl Default for Sha1Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Sha1Hasher {
    pub fn new() -> Self {
        Self(Sha1::new())
    }

    pub fn digest(data: &[u8]) -> Vec<u8> {
        Sha1::digest(data).to_vec()
    }
}

impl Hasher for Sha1Hasher {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self) -> Vec<u8> {
        self.0.finalize().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_of_known_input_is_stable() {
        let a = Sha1Hasher::digest(b"hello world");
        let b = Sha1Hasher::digest(b"hello world");
        assert_eq!(a, b);
        assert_eq!(a.len(), 20);
    }

    #[test]
    fn incremental_update_matches_one_shot_digest() {
        let mut hasher = Sha1Hasher::new();
        hasher.update(b"hello ");
        hasher.update(b"world");
        assert_eq!(hasher.finalize(), Sha1Hasher::digest(b"hello world"));
    }
}

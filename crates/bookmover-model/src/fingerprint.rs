use std::fmt;

use serde::{Deserialize, Serialize};

/// Content identity of a file: lowercase hex SHA-1 plus byte size.
///
/// Two files with an equal `Fingerprint` are considered the same content
/// (§3); the hash is never re-derived from this type, only compared.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    hash: String,
    size: u64,
}

impl Fingerprint {
    /// Builds a fingerprint from a raw hex digest and size, lowercasing the
    /// digest so two workers that hashed the same bytes always compare equal
    /// regardless of how the hex was produced.
    pub fn new(hash: impl Into<String>, size: u64) -> Self {
        Self {
            hash: hash.into().to_ascii_lowercase(),
            size,
        }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Stable key suitable for map lookups and cache keys: `hash:size`.
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.hash, self.size)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hash, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_hash_and_size_are_equal() {
        let a = Fingerprint::new("ABCD", 10);
        let b = Fingerprint::new("abcd", 10);
        assert_eq!(a, b);
    }

    #[test]
    fn different_size_is_different_fingerprint() {
        let a = Fingerprint::new("abcd", 10);
        let b = Fingerprint::new("abcd", 11);
        assert_ne!(a, b);
    }

    #[test]
    fn cache_key_round_trips_components() {
        let fp = Fingerprint::new("deadbeef", 42);
        assert_eq!(fp.cache_key(), "deadbeef:42");
        assert_eq!(fp.to_string(), "deadbeef:42");
    }
}

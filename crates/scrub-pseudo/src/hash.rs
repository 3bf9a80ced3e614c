//! Digests used by HASH-mode pseudonymization.
//!
//! Plain digests give stable replacements across runs. An optional
//! [`HashKey`] switches to HMAC of the same algorithm so that replacements
//! cannot be reversed by hashing a dictionary of candidate values.

use crate::error::{RedactionError, Result};
use hmac::{Hmac, Mac};
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Default number of hex characters kept from the digest.
pub const DEFAULT_HASH_LENGTH: usize = 8;

/// Digest algorithm for HASH mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha1,
    Md5,
}

impl HashAlgorithm {
    /// Parse an algorithm name; accepts the usual spellings.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha256" => Some(HashAlgorithm::Sha256),
            "sha1" => Some(HashAlgorithm::Sha1),
            "md5" => Some(HashAlgorithm::Md5),
            _ => None,
        }
    }

    /// Number of hex characters in a full digest.
    pub fn hex_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha1 => 40,
            HashAlgorithm::Md5 => 32,
        }
    }

    /// Hex digest of `input`, keyed when `key` is present.
    pub fn hex_digest(&self, key: Option<&HashKey>, input: &str) -> String {
        let bytes = input.as_bytes();
        match (self, key) {
            (HashAlgorithm::Sha256, None) => hex::encode(Sha256::digest(bytes)),
            (HashAlgorithm::Sha1, None) => hex::encode(Sha1::digest(bytes)),
            (HashAlgorithm::Md5, None) => hex::encode(Md5::digest(bytes)),
            (HashAlgorithm::Sha256, Some(key)) => {
                let mut mac = Hmac::<Sha256>::new_from_slice(&key.key)
                    .expect("HMAC can take key of any size");
                mac.update(bytes);
                hex::encode(mac.finalize().into_bytes())
            }
            (HashAlgorithm::Sha1, Some(key)) => {
                let mut mac = Hmac::<Sha1>::new_from_slice(&key.key)
                    .expect("HMAC can take key of any size");
                mac.update(bytes);
                hex::encode(mac.finalize().into_bytes())
            }
            (HashAlgorithm::Md5, Some(key)) => {
                let mut mac = Hmac::<Md5>::new_from_slice(&key.key)
                    .expect("HMAC can take key of any size");
                mac.update(bytes);
                hex::encode(mac.finalize().into_bytes())
            }
        }
    }

    /// Hex digest truncated to `len` characters (clamped to `1..=hex_len`).
    pub fn truncated_digest(&self, key: Option<&HashKey>, input: &str, len: usize) -> String {
        let mut hex = self.hex_digest(key, input);
        hex.truncate(len.clamp(1, self.hex_len()));
        hex
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha1 => "SHA-1",
            HashAlgorithm::Md5 => "MD5",
        };
        write!(f, "{}", s)
    }
}

/// Key material for keyed (HMAC) hashing.
#[derive(Clone)]
pub struct HashKey {
    key: [u8; 32],
}

impl HashKey {
    /// Create a key from random bytes; replacements then differ per run.
    pub fn generate() -> Result<Self> {
        let mut key = [0u8; 32];
        getrandom::getrandom(&mut key)
            .map_err(|e| RedactionError::Key(format!("failed to generate random key: {}", e)))?;
        Ok(Self { key })
    }

    /// Create a key from raw bytes.
    pub fn from_bytes(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Create a key from a base64-encoded string.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        use base64::Engine;
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| RedactionError::Key(format!("invalid base64: {}", e)))?;

        if decoded.len() != 32 {
            return Err(RedactionError::Key(format!(
                "key must be 32 bytes, got {}",
                decoded.len()
            )));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&decoded);
        Ok(Self { key })
    }

    /// Export key material as base64.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(self.key)
    }
}

impl std::fmt::Debug for HashKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HashKey(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digests() {
        assert_eq!(
            HashAlgorithm::Sha256.hex_digest(None, "abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            HashAlgorithm::Sha1.hex_digest(None, "abc"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            HashAlgorithm::Md5.hex_digest(None, "abc"),
            "900150983cd24fb0d6963f7d28e17f72"
        );
    }

    #[test]
    fn test_hex_len_matches_digest() {
        for alg in [HashAlgorithm::Sha256, HashAlgorithm::Sha1, HashAlgorithm::Md5] {
            assert_eq!(alg.hex_digest(None, "x").len(), alg.hex_len());
        }
    }

    #[test]
    fn test_truncation_clamped() {
        let alg = HashAlgorithm::Md5;
        assert_eq!(alg.truncated_digest(None, "x", 8).len(), 8);
        assert_eq!(alg.truncated_digest(None, "x", 0).len(), 1);
        assert_eq!(alg.truncated_digest(None, "x", 500).len(), 32);
    }

    #[test]
    fn test_keyed_differs_from_plain() {
        let key = HashKey::from_bytes([7u8; 32]);
        let plain = HashAlgorithm::Sha256.hex_digest(None, "alice");
        let keyed = HashAlgorithm::Sha256.hex_digest(Some(&key), "alice");
        assert_ne!(plain, keyed);
        assert_eq!(keyed, HashAlgorithm::Sha256.hex_digest(Some(&key), "alice"));
    }

    #[test]
    fn test_different_keys_different_hashes() {
        let key1 = HashKey::from_bytes([0u8; 32]);
        let key2 = HashKey::from_bytes([1u8; 32]);
        assert_ne!(
            HashAlgorithm::Sha1.hex_digest(Some(&key1), "test"),
            HashAlgorithm::Sha1.hex_digest(Some(&key2), "test")
        );
    }

    #[test]
    fn test_base64_roundtrip() {
        let original = HashKey::generate().unwrap();
        let restored = HashKey::from_base64(&original.to_base64()).unwrap();
        assert_eq!(
            HashAlgorithm::Sha256.hex_digest(Some(&original), "test"),
            HashAlgorithm::Sha256.hex_digest(Some(&restored), "test")
        );
    }

    #[test]
    fn test_base64_wrong_length() {
        let err = HashKey::from_base64("AAAA").unwrap_err();
        assert!(err.to_string().contains("32 bytes"));
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!(HashAlgorithm::parse("SHA-256"), Some(HashAlgorithm::Sha256));
        assert_eq!(HashAlgorithm::parse("sha1"), Some(HashAlgorithm::Sha1));
        assert_eq!(HashAlgorithm::parse("MD5"), Some(HashAlgorithm::Md5));
        assert_eq!(HashAlgorithm::parse("crc32"), None);
    }
}

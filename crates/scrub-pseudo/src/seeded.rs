//! Seed-derived hashing shared by the generators.

use sha2::{Digest, Sha256};

/// Stable 128-bit hash of `parts` under `seed`, with `salt` for re-probing.
///
/// Parts are NUL-separated so that `("ab", "c")` and `("a", "bc")` differ.
/// The value only depends on its inputs, never on process state, so two
/// generators built with the same seed agree on every call.
pub(crate) fn seeded_hash(seed: u64, parts: &[&str], salt: u64) -> u128 {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update(salt.to_le_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    u128::from_be_bytes(bytes)
}

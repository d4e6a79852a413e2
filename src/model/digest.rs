//! Stable 64-bit hashing.
//!
//! First 8 bytes (little-endian) of SHA-256. Identical across runs and
//! processes, unlike `std::hash`'s randomly keyed `DefaultHasher`.

use sha2::{Digest, Sha256};

pub fn stable_hash(bytes: &[u8]) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(head)
}

pub fn stable_hash_str(text: &str) -> u64 {
    stable_hash(text.as_bytes())
}

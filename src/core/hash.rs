// src/core/hash.rs

//! SHA256 helpers. Digests travel as lowercase hex strings everywhere in
//! this crate.

use sha2::{Digest, Sha256};

/// Width of a hex-encoded SHA256 digest.
pub const HASH_HEX_LEN: usize = 64;

/// Computes the SHA256 hash of the given data as a lowercase hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Computes the SHA256 hash of a list of byte slices concatenated together,
/// as a lowercase hex string.
pub fn sha256_hex_concat(data_slices: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for slice in data_slices {
        hasher.update(slice);
    }
    hex::encode(hasher.finalize())
}

/// Checks that a string looks like a hex-encoded SHA256 digest.
pub fn is_hash_hex(s: &str) -> bool {
    s.len() == HASH_HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
}

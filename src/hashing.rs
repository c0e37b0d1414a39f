//! Deterministic hashing used to derive random-number streams, and the fast map used for
//! lookups keyed by integers.
//!
//! The hashers in the standard library are randomly seeded per process, which would make seed
//! derivation differ from run to run. Seeds are derived with `xxh3`, which is stable across
//! processes, platforms and releases.

use xxhash_rust::xxh3::{xxh3_64, xxh3_64_with_seed};

pub use rustc_hash::FxHashMap as HashMap;

/// A convenience method to compute the hash of a `&str`.
#[must_use]
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

/// Mixes two keys into `seed`. Used to give every (epoch, individual) pair its own stream.
#[must_use]
pub fn mix_keys(seed: u64, first: u64, second: u64) -> u64 {
    let mut buffer = [0u8; 16];
    buffer[..8].copy_from_slice(&first.to_le_bytes());
    buffer[8..].copy_from_slice(&second.to_le_bytes());
    xxh3_64_with_seed(&buffer, seed)
}

use std::hash::Hasher;

use twox_hash::XxHash32;

const HASH_SEED: u32 = 0;

/// Stable, non-cryptographic 32-bit hash used to pick both segmented
/// map shards and per-keyword lock pool slots. Using the same function
/// for both means a keyword's segment and its mutation lock are
/// independently but deterministically derived from the same bytes.
pub fn hash32(key: &str) -> u32 {
    let mut hasher = XxHash32::with_seed(HASH_SEED);
    hasher.write(key.as_bytes());
    hasher.finish() as u32
}

//! Fast, non-cryptographic content hashing used as the deduplication key.
//!
//! xxh3 is stable for the life of a record: the same bytes always produce
//! the same 64-bit hash, which is stored bit-cast to `i64` so it fits a
//! SQLite `BigInt` column.

use twox_hash::xxh3::hash64;

/// Hash the raw text of a snapshot.
pub fn content_hash_text(text: &str) -> i64 {
    hash64(text.as_bytes()) as i64
}

/// Hash an image capture. The input is the *compressed main-blob* bytes,
/// not the raw pixels, so re-captures of the same source image hash
/// identically.
pub fn content_hash_bytes(bytes: &[u8]) -> i64 {
    hash64(bytes) as i64
}

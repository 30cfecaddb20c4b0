/// Functions for hashing candidate payloads for duplicate detection
use crate::types::ContentHash;

/// Compute the content hash of a raw payload.
///
/// The digest covers the full byte payload, so byte-identical images fetched
/// from different URLs always hash to the same value.
pub fn content_hash(bytes: &[u8]) -> ContentHash {
    ContentHash::of(bytes)
}

// -- Tests --

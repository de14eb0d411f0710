// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document fingerprints: SHA-256 hashing for log correlation.

use sha2::{Digest, Sha256};

/// Hex characters kept by [`short_fingerprint`].
const SHORT_LEN: usize = 12;

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// First twelve hex characters of the SHA-256 hash of `data`.
///
/// Enough to tell uploads apart in logs without printing content.
pub fn short_fingerprint(data: &[u8]) -> String {
    let mut full = hash_bytes(data);
    full.truncate(SHORT_LEN);
    full
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SHA-256 of the empty byte slice (well-known constant).
    const EMPTY_SHA256: &str =
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn hash_empty_input() {
        assert_eq!(hash_bytes(b""), EMPTY_SHA256);
    }

    #[test]
    fn short_fingerprint_is_hash_prefix() {
        assert_eq!(short_fingerprint(b""), &EMPTY_SHA256[..12]);
        assert_ne!(short_fingerprint(b"a"), short_fingerprint(b"b"));
    }
}

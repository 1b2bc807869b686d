//! Hashing primitives for DMChain

use sha2::{Digest, Sha256};
use std::fmt::Display;

/// Deterministic identifier for any displayable value: the lowercase hex
/// SHA-256 of its `Display` form.
///
/// Block hashes are `make_hash(height)`, transaction hashes are
/// `make_hash(format!("{height}-{index}"))`.
pub fn make_hash<T: Display>(value: T) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_hash_is_deterministic() {
        assert_eq!(make_hash(1u64), make_hash(1u64));
        assert_eq!(make_hash("12-3"), make_hash(format!("{}-{}", 12, 3)));
    }

    #[test]
    fn test_make_hash_matches_known_digest() {
        // sha256("1")
        assert_eq!(
            make_hash(1),
            "6b86b273ff34fce19d6b804eff5a3f5747ada4eaa22f1d49c01e52ddb7875b4b"
        );
    }

    #[test]
    fn test_distinct_inputs_give_distinct_hashes() {
        assert_ne!(make_hash(1), make_hash(2));
        assert_ne!(make_hash("1-2"), make_hash("12"));
    }
}

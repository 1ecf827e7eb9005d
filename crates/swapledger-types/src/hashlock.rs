//! Hash commitments for HTLC escrows.
//!
//! A sender commits to a secret by publishing `commit(secret)`; the receiver
//! later claims the escrow by revealing a preimage that verifies against it.

use sha2::{Digest, Sha256};

use crate::constants::SECRET_HASH_HEX_LEN;

/// SHA-256 over the UTF-8 bytes of `secret`, as 64 lowercase hex characters.
#[must_use]
pub fn commit(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Returns `true` if `secret` is a preimage of `hash`.
#[must_use]
pub fn verify(secret: &str, hash: &str) -> bool {
    commit(secret) == hash
}

/// Returns `true` if `hash` is exactly 64 lowercase hex characters.
#[must_use]
pub fn is_well_formed(hash: &str) -> bool {
    hash.len() == SECRET_HASH_HEX_LEN
        && hash.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_matches_known_vector() {
        assert_eq!(
            commit("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn commit_of_empty_string() {
        assert_eq!(
            commit(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn verify_accepts_preimage() {
        let hash = commit("before_locktime");
        assert!(verify("before_locktime", &hash));
    }

    #[test]
    fn verify_rejects_other_secret() {
        let hash = commit("before_locktime");
        assert!(!verify("after_locktime", &hash));
        assert!(!verify("", &hash));
    }

    #[test]
    fn commitments_are_well_formed() {
        assert!(is_well_formed(&commit("swap_btc_dash")));
    }

    #[test]
    fn uppercase_hash_is_malformed() {
        let hash = commit("x").to_uppercase();
        assert!(!is_well_formed(&hash));
    }

    #[test]
    fn wrong_length_is_malformed() {
        let hash = commit("x");
        assert!(!is_well_formed(&hash[..32]));
        assert!(!is_well_formed(&format!("{hash}0")));
        assert!(!is_well_formed(""));
    }

    #[test]
    fn non_hex_is_malformed() {
        let bad = "g".repeat(SECRET_HASH_HEX_LEN);
        assert!(!is_well_formed(&bad));
    }
}

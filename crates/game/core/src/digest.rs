//! State digest for divergence checks between peers.
//!
//! Both peers resolve every exchange locally. After each round they can
//! exchange a digest of `(round, host state, guest state)`; equal digests
//! mean the replicas agree. States are always hashed in host/guest order
//! so the result does not depend on which seat computed it.

use sha2::{Digest, Sha256};

use crate::character::CharacterState;

/// Hex-encoded SHA-256 over the bincode encoding of the round and both states.
pub fn state_digest(round: u32, host: &CharacterState, guest: &CharacterState) -> String {
    let mut hasher = Sha256::new();
    hasher.update(round.to_le_bytes());

    for state in [host, guest] {
        // bincode is deterministic for these types; a failure leaves the
        // state out of the hash, which still yields a mismatch on the other side.
        if let Ok(bytes) = bincode::serialize(state) {
            hasher.update(&bytes);
        }
    }

    hex::encode(hasher.finalize())
}

//! Merkle commitment engine for the rollup state ledger
//!
//! A binary Keccak-256 tree over an ordered sequence of leaf hashes.
//! Key features:
//! - Odd levels duplicate their last node, no padding leaf type
//! - Inner nodes hash the numerically smaller child first, so proofs carry no
//!   direction bits
//! - Pure and deterministic: every conforming node derives the same roots

mod hasher;
mod proof;
mod tree;

pub use hasher::{Keccak256Hasher, LEAF_PREFIX};
pub use proof::{verify_proof, MerkleProof};
pub use tree::{compute_root, MerkleTree};

/// 32-byte hash type
pub type Hash = [u8; 32];

/// Merkle engine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MerkleError {
    /// A root was requested over zero leaves
    #[error("cannot build a merkle root over an empty leaf sequence")]
    EmptyInput,
}

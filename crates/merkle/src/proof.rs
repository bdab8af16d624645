//! Inclusion proof verification

use serde::{Deserialize, Serialize};

use crate::{hasher::Keccak256Hasher, Hash};

/// Merkle inclusion proof
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Sibling hashes from leaf to root
    pub siblings: Vec<Hash>,
}

impl MerkleProof {
    /// Create a proof from a sibling path
    pub fn new(siblings: Vec<Hash>) -> Self {
        Self { siblings }
    }

    /// Number of steps in the path
    pub fn len(&self) -> usize {
        self.siblings.len()
    }

    /// True for the zero-step proof of a single-leaf tree
    pub fn is_empty(&self) -> bool {
        self.siblings.is_empty()
    }

    /// Fold `leaf` through the sibling path
    pub fn compute_root(&self, leaf: &Hash) -> Hash {
        fold_path(&self.siblings, leaf)
    }

    /// Verify this proof against a root hash
    pub fn verify(&self, root: &Hash, leaf: &Hash) -> bool {
        self.compute_root(leaf) == *root
    }
}

impl From<Vec<Hash>> for MerkleProof {
    fn from(siblings: Vec<Hash>) -> Self {
        Self::new(siblings)
    }
}

/// Verify that `leaf` is committed under `root` through `proof`.
///
/// Any proof length is accepted; a mismatched path simply fails. An empty
/// proof holds only when `leaf == root`.
pub fn verify_proof(proof: &[Hash], root: &Hash, leaf: &Hash) -> bool {
    fold_path(proof, leaf) == *root
}

/// Hash `leaf` up through `siblings`, smaller operand first at every step
fn fold_path(siblings: &[Hash], leaf: &Hash) -> Hash {
    siblings
        .iter()
        .fold(*leaf, |current, sibling| Keccak256Hasher::hash_sorted_pair(&current, sibling))
}

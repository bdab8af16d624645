//! Binary Merkle tree over an ordered leaf sequence

use crate::{hasher::Keccak256Hasher, proof::MerkleProof, Hash, MerkleError};

/// Compute the root of the tree built over `leaves`.
///
/// Each level with an odd number of nodes duplicates its last node before
/// pairing, so `[a, b, c]` commits to the same root as `[a, b, c, c]`. A single
/// leaf is its own root.
pub fn compute_root(leaves: &[Hash]) -> Result<Hash, MerkleError> {
    if leaves.is_empty() {
        return Err(MerkleError::EmptyInput);
    }

    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = next_level(&level);
    }
    Ok(level[0])
}

/// Hash one level into its parent level
fn next_level(level: &[Hash]) -> Vec<Hash> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            // Odd tail: pair the last node with itself
            let right = pair.get(1).unwrap_or(left);
            Keccak256Hasher::hash_sorted_pair(left, right)
        })
        .collect()
}

/// Merkle tree that keeps every level so inclusion proofs can be produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleTree {
    /// Levels from leaves (index 0) up to the root level
    levels: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Build a tree over a non-empty leaf sequence
    pub fn new(leaves: Vec<Hash>) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyInput);
        }

        let mut levels = vec![leaves];
        while levels[levels.len() - 1].len() > 1 {
            let parent = next_level(&levels[levels.len() - 1]);
            levels.push(parent);
        }

        Ok(Self { levels })
    }

    /// Get the root hash
    pub fn root(&self) -> Hash {
        self.levels[self.levels.len() - 1][0]
    }

    /// Number of leaves the tree was built from
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// The leaves in insertion order
    pub fn leaves(&self) -> &[Hash] {
        &self.levels[0]
    }

    /// Number of hashing steps from a leaf to the root (proof length)
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    /// Generate the sibling path for the leaf at `index`
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaf_count() {
            return None;
        }

        let mut siblings = Vec::with_capacity(self.depth());
        let mut position = index;
        for level in &self.levels[..self.depth()] {
            // A node without a right neighbour was paired with itself
            let sibling = level.get(position ^ 1).unwrap_or(&level[position]);
            siblings.push(*sibling);
            position /= 2;
        }

        Some(MerkleProof::new(siblings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(n: u8) -> Hash {
        Keccak256Hasher::hash(&[n])
    }

    #[test]
    fn test_empty_input_rejected() {
        assert_eq!(compute_root(&[]), Err(MerkleError::EmptyInput));
        assert_eq!(MerkleTree::new(vec![]), Err(MerkleError::EmptyInput));
    }

    #[test]
    fn test_single_leaf_is_root() {
        let a = leaf(1);
        assert_eq!(compute_root(&[a]), Ok(a));

        let tree = MerkleTree::new(vec![a]).unwrap();
        assert_eq!(tree.depth(), 0);
        assert!(tree.proof(0).unwrap().is_empty());
    }

    #[test]
    fn test_two_leaves() {
        let (a, b) = (leaf(1), leaf(2));
        let expected = Keccak256Hasher::hash_sorted_pair(&a, &b);
        assert_eq!(compute_root(&[a, b]), Ok(expected));
        assert_eq!(compute_root(&[b, a]), Ok(expected));
    }

    #[test]
    fn test_odd_count_duplicates_last() {
        let (a, b, c) = (leaf(1), leaf(2), leaf(3));
        assert_eq!(compute_root(&[a, b, c]), compute_root(&[a, b, c, c]));

        // 5 -> 3 -> 2 -> 1: padding happens on two levels
        let five = [leaf(1), leaf(2), leaf(3), leaf(4), leaf(5)];
        let six = [leaf(1), leaf(2), leaf(3), leaf(4), leaf(5), leaf(5)];
        assert_eq!(compute_root(&five), compute_root(&six));
        assert_ne!(compute_root(&five), compute_root(&six[..4]));
    }

    #[test]
    fn test_tree_root_matches_compute_root() {
        for n in 1..=9u8 {
            let leaves: Vec<Hash> = (0..n).map(leaf).collect();
            let tree = MerkleTree::new(leaves.clone()).unwrap();
            assert_eq!(tree.root(), compute_root(&leaves).unwrap());
            assert_eq!(tree.leaf_count(), leaves.len());
        }
    }

    #[test]
    fn test_every_leaf_has_valid_proof() {
        for n in 1..=9u8 {
            let leaves: Vec<Hash> = (0..n).map(leaf).collect();
            let tree = MerkleTree::new(leaves.clone()).unwrap();
            for (i, l) in leaves.iter().enumerate() {
                let proof = tree.proof(i).unwrap();
                assert_eq!(proof.len(), tree.depth());
                assert!(proof.verify(&tree.root(), l), "leaf {i} of {n}");
            }
        }
    }

    #[test]
    fn test_proof_out_of_range() {
        let tree = MerkleTree::new(vec![leaf(1), leaf(2)]).unwrap();
        assert!(tree.proof(2).is_none());
    }
}

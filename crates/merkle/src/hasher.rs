//! Keccak256 hasher for the commitment tree

use tiny_keccak::{Hasher, Keccak};

use crate::Hash;

/// Prefix byte for leaf hashes, keeps leaves and inner nodes in separate domains
pub const LEAF_PREFIX: u8 = 0x00;

/// Keccak256 hasher
#[derive(Debug, Clone, Copy)]
pub struct Keccak256Hasher;

impl Keccak256Hasher {
    /// Hash a single value
    pub fn hash(data: &[u8]) -> Hash {
        let mut hasher = Keccak::v256();
        hasher.update(data);
        let mut output = [0u8; 32];
        hasher.finalize(&mut output);
        output
    }

    /// Hash two 32-byte values in the given order
    pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
        let mut hasher = Keccak::v256();
        hasher.update(left);
        hasher.update(right);
        let mut output = [0u8; 32];
        hasher.finalize(&mut output);
        output
    }

    /// Hash two 32-byte values, numerically smaller operand first.
    ///
    /// The result does not depend on argument order, so proofs carry no
    /// left/right direction bits.
    pub fn hash_sorted_pair(a: &Hash, b: &Hash) -> Hash {
        if a <= b {
            Self::hash_pair(a, b)
        } else {
            Self::hash_pair(b, a)
        }
    }

    /// Hash a key-value pair for a leaf node
    pub fn hash_leaf(key: &Hash, value: &Hash) -> Hash {
        let mut hasher = Keccak::v256();
        hasher.update(&[LEAF_PREFIX]);
        hasher.update(key);
        hasher.update(value);
        let mut output = [0u8; 32];
        hasher.finalize(&mut output);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_empty_is_keccak_of_nothing() {
        // keccak256("")
        let expected = [
            0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7,
            0x03, 0xc0, 0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04,
            0x5d, 0x85, 0xa4, 0x70,
        ];
        assert_eq!(Keccak256Hasher::hash(&[]), expected);
    }

    #[test]
    fn test_hash_pair_is_ordered() {
        let left = [1u8; 32];
        let right = [2u8; 32];
        assert_ne!(
            Keccak256Hasher::hash_pair(&left, &right),
            Keccak256Hasher::hash_pair(&right, &left)
        );
    }

    #[test]
    fn test_sorted_pair_is_symmetric() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let ab = Keccak256Hasher::hash_sorted_pair(&a, &b);
        assert_eq!(ab, Keccak256Hasher::hash_sorted_pair(&b, &a));
        assert_eq!(ab, Keccak256Hasher::hash_pair(&a, &b));
    }

    #[test]
    fn test_sorted_pair_compares_bytes_big_endian() {
        let mut low = [0u8; 32];
        low[31] = 0xff;
        let mut high = [0u8; 32];
        high[0] = 0x01;
        assert_eq!(
            Keccak256Hasher::hash_sorted_pair(&high, &low),
            Keccak256Hasher::hash_pair(&low, &high)
        );
    }

    #[test]
    fn test_leaf_differs_from_pair() {
        let key = [3u8; 32];
        let value = [4u8; 32];
        assert_ne!(
            Keccak256Hasher::hash_leaf(&key, &value),
            Keccak256Hasher::hash_pair(&key, &value)
        );
    }
}

// src/core/merkle.rs

//! Merkle tree over the chain's leaf hashes.

use crate::core::hash::sha256_hex_concat;
use crate::error::{JournalError, Result};

/// Represents a Merkle tree over hex-encoded leaf hashes.
///
/// The tree is stored as a vector of levels, where each level is a vector of
/// hashes. `levels[0]` is the leaf layer, and `levels[levels.len() - 1]` is
/// the root layer, containing a single hash.
///
/// Leaves are lowercase hex digest strings; a parent node is the SHA256 of
/// the UTF-8 concatenation of its two children, left first. When a level has
/// an odd number of nodes the last node is paired with itself. A tree with a
/// single leaf has that leaf as its root.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    levels: Vec<Vec<String>>,
}

impl MerkleTree {
    /// Creates a new Merkle tree from a vector of hex leaf hashes.
    ///
    /// # Errors
    ///
    /// Returns `JournalError::InvalidInput` if `leaves` is empty.
    pub fn new(leaves: Vec<String>) -> Result<Self> {
        if leaves.is_empty() {
            return Err(JournalError::InvalidInput(
                "cannot construct Merkle tree with no leaf hashes".to_string(),
            ));
        }

        let mut levels: Vec<Vec<String>> = Vec::new();
        levels.push(leaves);

        while levels.last().unwrap().len() > 1 {
            let previous_level = levels.last().unwrap();
            let mut current_level: Vec<String> = Vec::with_capacity((previous_level.len() + 1) / 2);

            let mut i = 0;
            while i < previous_level.len() {
                let left = &previous_level[i];
                let right = if i + 1 < previous_level.len() {
                    &previous_level[i + 1]
                } else {
                    // Odd number of nodes: pair the last one with itself
                    left
                };
                current_level.push(combine(left, right));
                i += 2;
            }
            levels.push(current_level);
        }
        Ok(MerkleTree { levels })
    }

    /// Returns the root hash of the Merkle tree.
    pub fn root(&self) -> &str {
        // `new` guarantees a non-empty root layer.
        &self.levels[self.levels.len() - 1][0]
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Generates the inclusion proof for the leaf at the given index.
    ///
    /// The proof is the ordered list of sibling hashes from the leaf level up
    /// to the level below the root. Directions are implicit: at each level
    /// an even index pairs with the sibling on its right, an odd index with
    /// the sibling on its left, and the index halves moving up.
    ///
    /// Returns `None` if `leaf_index` is out of bounds. A single-leaf tree
    /// has an empty proof.
    pub fn proof(&self, leaf_index: usize) -> Option<Vec<String>> {
        if self.levels[0].len() <= leaf_index {
            return None;
        }

        let mut proof = Vec::new();
        let mut index = leaf_index;

        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = if index % 2 == 0 {
                if index + 1 < level.len() {
                    &level[index + 1]
                } else {
                    // Last node of an odd-sized level was hashed with itself
                    &level[index]
                }
            } else {
                &level[index - 1]
            };
            proof.push(sibling.clone());
            index /= 2;
        }
        Some(proof)
    }
}

/// Verifies an inclusion proof for a hex leaf hash against an expected root.
///
/// `leaf_index` is the position of the leaf in the original leaf sequence;
/// it determines the hashing order at every level.
pub fn verify_proof(leaf_hash: &str, leaf_index: usize, proof: &[String], expected_root: &str) -> bool {
    let mut current = leaf_hash.to_string();
    let mut index = leaf_index;
    for sibling in proof {
        current = if index % 2 == 0 {
            combine(&current, sibling)
        } else {
            combine(sibling, &current)
        };
        index /= 2;
    }
    current == expected_root
}

fn combine(left: &str, right: &str) -> String {
    sha256_hex_concat(&[left.as_bytes(), right.as_bytes()])
}

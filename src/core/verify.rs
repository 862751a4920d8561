// src/core/verify.rs

//! Standalone chain verification.
//!
//! [`verify_chain_json`] is the single entry point external auditors are
//! expected to call: given the proof log and the agent's public key, it
//! checks every invariant the engine promises and reports the first failure
//! with its index.

use serde::{Deserialize, Serialize};

use crate::core::hash::is_hash_hex;
use crate::core::keys::VerifierKey;
use crate::core::merkle::{self, MerkleTree};
use crate::core::proof::TransitionProof;
use crate::error::{JournalError, Result};

/// Outcome of a chain verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainVerdict {
    /// Whether the whole chain verified.
    pub ok: bool,
    /// Index of the first failing proof, when `ok` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<usize>,
    /// The invariant that failed, when `ok` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ChainVerdict {
    fn valid() -> Self {
        Self {
            ok: true,
            failed_at: None,
            reason: None,
        }
    }

    fn failed(index: usize, reason: String) -> Self {
        Self {
            ok: false,
            failed_at: Some(index),
            reason: Some(reason),
        }
    }
}

/// Verifies a proof chain against a public key.
///
/// For each proof, in order: (i) the signature over the state hash, (ii) the
/// previous-hash link, (iii) the Merkle root recomputed over the cumulative
/// leaf sequence up to that index, (iv) the proof's own inclusion path. An
/// empty chain is trivially valid.
pub fn verify_chain(proofs: &[TransitionProof], public_key: &VerifierKey) -> ChainVerdict {
    let mut leaves: Vec<String> = Vec::with_capacity(proofs.len());

    for (index, proof) in proofs.iter().enumerate() {
        leaves.push(proof.state_hash.clone());
        if let Err(JournalError::ProofInvalid { index, reason }) =
            check_proof(index, proof, proofs, &leaves, public_key)
        {
            return ChainVerdict::failed(index, reason);
        }
    }
    ChainVerdict::valid()
}

/// Verifies a JSON-encoded proof chain against a hex-encoded SPKI public key.
///
/// Returns an error only when the inputs themselves are unusable (undecodable
/// key material or proof JSON); a well-formed but tampered chain produces a
/// negative [`ChainVerdict`] instead.
pub fn verify_chain_json(proofs_json: &str, public_key_hex: &str) -> Result<ChainVerdict> {
    let proofs: Vec<TransitionProof> = serde_json::from_str(proofs_json)?;
    let key = VerifierKey::from_hex(public_key_hex)?;
    Ok(verify_chain(&proofs, &key))
}

fn check_proof(
    index: usize,
    proof: &TransitionProof,
    proofs: &[TransitionProof],
    leaves: &[String],
    public_key: &VerifierKey,
) -> Result<()> {
    if !is_hash_hex(&proof.state_hash) {
        return Err(JournalError::ProofInvalid {
            index,
            reason: "state hash is not a well-formed digest".to_string(),
        });
    }

    if !public_key.verify_text(&proof.state_hash, &proof.signature) {
        return Err(JournalError::ProofInvalid {
            index,
            reason: "signature verification failed".to_string(),
        });
    }

    let expected_prev = if index == 0 {
        ""
    } else {
        proofs[index - 1].state_hash.as_str()
    };
    if proof.prev_hash != expected_prev {
        return Err(JournalError::ProofInvalid {
            index,
            reason: "previous hash does not chain".to_string(),
        });
    }

    let tree = MerkleTree::new(leaves.to_vec()).map_err(|_| JournalError::ProofInvalid {
        index,
        reason: "merkle root recomputation failed".to_string(),
    })?;
    if tree.root() != proof.merkle_root {
        return Err(JournalError::ProofInvalid {
            index,
            reason: "merkle root mismatch".to_string(),
        });
    }

    if !merkle::verify_proof(&proof.state_hash, index, &proof.merkle_proof, &proof.merkle_root) {
        return Err(JournalError::ProofInvalid {
            index,
            reason: "merkle inclusion proof invalid".to_string(),
        });
    }

    Ok(())
}

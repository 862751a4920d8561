// src/core/proof.rs

//! The signed, Merkle-anchored record of one transition, and the engine that
//! produces it.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::canonical::to_canonical_json;
use crate::core::hash::sha256_hex;
use crate::core::keys::{SigningIdentity, VerifierKey};
use crate::core::merkle::MerkleTree;
use crate::error::{JournalError, Result};

/// Cryptographic proof of a single accepted transition.
///
/// The wall-clock timestamp participates in `state_hash`, so the hash is a
/// unique commitment per proof and is not reproducible from the transition
/// descriptor alone; verifiers treat it as opaque. All hex is lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionProof {
    /// Hash of this transition's canonical form.
    pub state_hash: String,
    /// `state_hash` of the previous accepted transition, empty for the first.
    pub prev_hash: String,
    /// Root of the Merkle tree over all leaves up to and including this one.
    pub merkle_root: String,
    /// Inclusion path for `state_hash` under `merkle_root`; directions are
    /// implicit from the proof's index in the chain.
    pub merkle_proof: Vec<String>,
    /// Signature over the ASCII hex of `state_hash`.
    pub signature: String,
    /// Milliseconds since the Unix epoch at proof creation.
    pub timestamp: i64,
}

impl TransitionProof {
    /// Serializes the proof to its JSON wire form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a proof from its JSON wire form.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Produces chained transition proofs for one signing identity.
///
/// The engine owns the ordered leaf sequence (one hex state hash per accepted
/// transition) and the previous-hash cursor. The Merkle tree is rebuilt over
/// all leaves on every append; this is O(n) per transition, which is
/// acceptable for the intended log sizes (thousands, not millions).
#[derive(Debug)]
pub struct ProofEngine {
    signer: SigningIdentity,
    leaves: Vec<String>,
    prev_hash: String,
}

impl ProofEngine {
    /// Creates an engine with an empty chain.
    pub fn new(signer: SigningIdentity) -> Self {
        Self {
            signer,
            leaves: Vec::new(),
            prev_hash: String::new(),
        }
    }

    /// Builds, signs and appends the proof for one transition.
    ///
    /// Every fallible step (canonicalization, hashing, signing, tree build)
    /// happens before the chain state is touched, so a failure leaves the
    /// engine exactly as it was.
    pub fn append(&mut self, from: &str, to: &str, action: &str, params: &Value) -> Result<TransitionProof> {
        let timestamp = Utc::now().timestamp_millis();
        let descriptor = json!({
            "timestamp": timestamp,
            "from": from,
            "to": to,
            "action": action,
            "params": params,
        });
        let canonical = to_canonical_json(&descriptor)?;
        let state_hash = sha256_hex(canonical.as_bytes());
        let signature = self.signer.sign_text(&state_hash)?;

        let index = self.leaves.len();
        let mut leaves = self.leaves.clone();
        leaves.push(state_hash.clone());
        let tree = MerkleTree::new(leaves)?;
        let merkle_proof = tree
            .proof(index)
            .ok_or_else(|| JournalError::InvalidInput("leaf index out of range".to_string()))?;

        let proof = TransitionProof {
            state_hash: state_hash.clone(),
            prev_hash: std::mem::take(&mut self.prev_hash),
            merkle_root: tree.root().to_string(),
            merkle_proof,
            signature,
            timestamp,
        };

        self.leaves.push(state_hash.clone());
        self.prev_hash = state_hash;
        Ok(proof)
    }

    /// The ordered Merkle leaves accepted so far.
    pub fn leaves(&self) -> &[String] {
        &self.leaves
    }

    /// Number of accepted transitions.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Whether any transition has been accepted.
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// The public key matching this engine's signer.
    pub fn verifier(&self) -> VerifierKey {
        self.signer.verifier()
    }
}

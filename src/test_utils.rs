// src/test_utils.rs

//! Shared test support.
//!
//! RSA key generation is slow enough to dominate test time, so the suite
//! shares one lazily generated identity across all tests in a process.

use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::core::keys::SigningIdentity;

/// A process-wide RSA identity for tests and benches.
pub fn test_signer() -> &'static SigningIdentity {
    static SIGNER: OnceLock<SigningIdentity> = OnceLock::new();
    SIGNER.get_or_init(|| SigningIdentity::generate(2048).expect("test key generation failed"))
}

/// A deterministic random source for history-tree tests.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

//! A tamper-evident transition journal for autonomous agents.
//!
//! Every meaningful state change an agent makes is recorded as a
//! cryptographically signed entry in an append-only log. Given only the
//! agent's public key and the log, any third party can verify that the
//! transitions were produced by the holder of the matching private key, that
//! no entry was inserted, reordered or removed after the fact, and that each
//! transition was permitted by the declared policy.
//!
//! The crate has four cooperating parts:
//!
//! - [`core`] — canonical hashing, the Merkle accumulator, RSA signing and
//!   standalone chain verification;
//! - [`policy`] / [`lifecycle`] — the static transition graph, generic over
//!   the state type, plus the reference agent lifecycle;
//! - [`machine`] — the state machine that validates transitions, emits
//!   proofs and fans them out to [`sinks`];
//! - [`history`] — an independent branching snapshot tree for evolving
//!   payloads.
//!
//! ```no_run
//! use agent_journal::{agent_lifecycle_policy, AgentState, SigningIdentity, TransitionMachine};
//! use serde_json::json;
//!
//! # async fn demo() -> agent_journal::Result<()> {
//! let signer = SigningIdentity::generate(2048)?;
//! let mut machine = TransitionMachine::new(
//!     "agent-1",
//!     "session-1",
//!     signer,
//!     AgentState::all(),
//!     agent_lifecycle_policy(),
//!     AgentState::Idle,
//! )?;
//!
//! let proof = machine.transition(AgentState::Init, "start", json!({"goal": "x"})).await?;
//! assert!(proof.prev_hash.is_empty());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::new_without_default)]

pub mod config;
pub mod core;
pub mod error;
pub mod history;
pub mod lifecycle;
pub mod machine;
pub mod policy;
pub mod sinks;
pub mod test_utils;

pub use config::Config;
pub use core::keys::{SigningIdentity, VerifierKey};
pub use core::proof::{ProofEngine, TransitionProof};
pub use core::verify::{verify_chain, verify_chain_json, ChainVerdict};
pub use error::{JournalError, Result};
pub use history::{VersionNode, VersionTree};
pub use lifecycle::{agent_lifecycle_policy, AgentState};
pub use machine::TransitionMachine;
pub use policy::{StateId, TransitionPolicy};
pub use sinks::{TransitionRecord, TransitionSink};

/// Initializes the library from an optional configuration file.
///
/// Loads (or defaults) the configuration, validates it, and installs a
/// console logger at the configured level when `logging.console` is set.
///
/// # Errors
///
/// Fails with `JournalError::InvalidInput` if a global logger is already
/// installed, and with a configuration error if the file is unreadable or
/// invalid.
pub fn init(config_path: Option<&str>) -> Result<Config> {
    let config = match config_path {
        Some(path) => Config::load(path)?,
        None => {
            let config = Config::default();
            config.validate().map_err(JournalError::Config)?;
            config
        }
    };

    if config.logging.console {
        let level = config.logging.level_filter().map_err(JournalError::Config)?;
        env_logger::Builder::new()
            .filter_level(level)
            .try_init()
            .map_err(|e| JournalError::InvalidInput(format!("logger already initialized: {}", e)))?;
    }

    Ok(config)
}

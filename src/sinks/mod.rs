// src/sinks/mod.rs

//! Consumers of finished transition proofs.
//!
//! Sinks receive only the finished [`TransitionProof`] and the public
//! descriptor fields; the signing key never crosses this boundary. Sinks are
//! invoked in configuration order, once per accepted transition, and must be
//! idempotent with respect to `(agent_id, session_id, proof.state_hash)`;
//! they may deduplicate but must not reorder.

pub mod logger;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{Config, StoreBackend};
use crate::core::proof::TransitionProof;
use crate::error::Result;

pub use logger::LogBufferSink;
pub use store::{FileProofStore, MemoryProofStore, ProofStore, StoreSink, StoredTransition};

/// One accepted transition, as handed to sinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Owning agent.
    pub agent_id: String,
    /// Owning session.
    pub session_id: String,
    /// Source state, rendered.
    pub from: String,
    /// Target state, rendered.
    pub to: String,
    /// Action label supplied by the caller.
    pub action: String,
    /// The finished proof.
    pub proof: TransitionProof,
}

/// A consumer of finished proofs.
#[async_trait]
pub trait TransitionSink: Send + Sync {
    /// Short name used when reporting sink failures.
    fn name(&self) -> &str;

    /// Consumes one accepted transition. Failures are surfaced by the
    /// machine but never retract the already-appended proof.
    async fn on_transition(&self, record: &TransitionRecord) -> Result<()>;
}

/// Builds the durable sink set described by a [`Config`].
///
/// The structured log buffer sink is not built here; every machine carries
/// one unconditionally.
pub async fn from_config(config: &Config) -> Result<Vec<Arc<dyn TransitionSink>>> {
    let store: Arc<dyn ProofStore> = match config.store.backend {
        StoreBackend::Memory => Arc::new(MemoryProofStore::new()),
        StoreBackend::File => Arc::new(FileProofStore::open(&config.store.base_path).await?),
    };
    Ok(vec![Arc::new(StoreSink::new(store))])
}

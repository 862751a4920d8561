// src/machine.rs

//! Policy-driven state machine with proof emission.
//!
//! A machine is owned by a single logical actor and lives for one session;
//! it is never reused across signing keys. All mutating operations take
//! `&mut self`, so two transitions can never interleave their chain-append
//! sections on the same instance. Share a machine across tasks only behind
//! external synchronization.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::config::ConfigError;
use crate::core::keys::{SigningIdentity, VerifierKey};
use crate::core::proof::{ProofEngine, TransitionProof};
use crate::error::{JournalError, Result};
use crate::policy::{StateId, TransitionPolicy};
use crate::sinks::{LogBufferSink, TransitionRecord, TransitionSink};

/// A transition state machine that emits a signed, Merkle-anchored proof for
/// every accepted state change.
pub struct TransitionMachine<S: StateId> {
    agent_id: String,
    session_id: String,
    engine: ProofEngine,
    states: HashSet<S>,
    policy: TransitionPolicy<S>,
    current: S,
    log: Vec<TransitionProof>,
    logger: Arc<LogBufferSink>,
    sinks: Vec<Arc<dyn TransitionSink>>,
}

impl<S: StateId> TransitionMachine<S> {
    /// Creates a machine with no extra sinks beyond the built-in structured
    /// log buffer.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error if `initial_state` is not in
    /// `states`, or if the policy references states outside `states`.
    pub fn new(
        agent_id: impl Into<String>,
        session_id: impl Into<String>,
        signer: SigningIdentity,
        states: impl IntoIterator<Item = S>,
        policy: TransitionPolicy<S>,
        initial_state: S,
    ) -> Result<Self> {
        let states: HashSet<S> = states.into_iter().collect();

        if states.is_empty() {
            return Err(config_error("machine requires a non-empty state set"));
        }
        if !states.contains(&initial_state) {
            return Err(config_error(format!(
                "initial state '{}' is not in the declared state set",
                initial_state
            )));
        }
        for state in policy.states() {
            if !states.contains(&state) {
                return Err(config_error(format!(
                    "policy references undeclared state '{}'",
                    state
                )));
            }
        }

        Ok(Self {
            agent_id: agent_id.into(),
            session_id: session_id.into(),
            engine: ProofEngine::new(signer),
            states,
            policy,
            current: initial_state,
            log: Vec::new(),
            logger: Arc::new(LogBufferSink::new()),
            sinks: Vec::new(),
        })
    }

    /// Creates a machine and attaches the given sinks, in order.
    pub fn with_sinks(
        agent_id: impl Into<String>,
        session_id: impl Into<String>,
        signer: SigningIdentity,
        states: impl IntoIterator<Item = S>,
        policy: TransitionPolicy<S>,
        initial_state: S,
        sinks: Vec<Arc<dyn TransitionSink>>,
    ) -> Result<Self> {
        let mut machine = Self::new(agent_id, session_id, signer, states, policy, initial_state)?;
        machine.sinks = sinks;
        Ok(machine)
    }

    /// Attaches an additional sink after the already-configured ones.
    pub fn attach_sink(&mut self, sink: Arc<dyn TransitionSink>) {
        self.sinks.push(sink);
    }

    /// Executes a transition to `to`, producing and recording its proof.
    ///
    /// The policy gate, proof production and chain append are synchronous; a
    /// failure anywhere in them leaves the machine untouched. Sink emission
    /// is the only await point and happens after the proof is already part
    /// of the log: a sink failure is logged and surfaced through the `log`
    /// facade but never rolls the chain back.
    pub async fn transition(&mut self, to: S, action: &str, params: Value) -> Result<TransitionProof> {
        let from = self.current.clone();
        if !self.states.contains(&to) || !self.policy.can_transition(&from, &to) {
            return Err(JournalError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let proof = self
            .engine
            .append(&from.to_string(), &to.to_string(), action, &params)?;
        self.log.push(proof.clone());

        let record = TransitionRecord {
            agent_id: self.agent_id.clone(),
            session_id: self.session_id.clone(),
            from: from.to_string(),
            to: to.to_string(),
            action: action.to_string(),
            proof: proof.clone(),
        };

        self.emit(self.logger.as_ref(), &record).await;
        for sink in &self.sinks {
            self.emit(sink.as_ref(), &record).await;
        }

        self.current = to;
        Ok(proof)
    }

    async fn emit(&self, sink: &dyn TransitionSink, record: &TransitionRecord) {
        if let Err(e) = sink.on_transition(record).await {
            log::warn!(
                "sink '{}' failed for {}/{}: {}",
                sink.name(),
                self.agent_id,
                self.session_id,
                e
            );
        }
    }

    /// The states reachable from the current state in one step.
    pub fn available(&self) -> HashSet<S> {
        self.policy.allowed(&self.current)
    }

    /// The current state.
    pub fn current_state(&self) -> &S {
        &self.current
    }

    /// The formatted structured log for this machine's session.
    pub fn logs(&self) -> String {
        self.logger.get_logs(&self.session_id)
    }

    /// The append-only proof log, in acceptance order.
    pub fn proofs(&self) -> &[TransitionProof] {
        &self.log
    }

    /// The ordered Merkle leaves (one hex state hash per accepted
    /// transition). Indices agree with [`Self::proofs`].
    pub fn leaves(&self) -> &[String] {
        self.engine.leaves()
    }

    /// The public key auditors verify this machine's proofs against.
    pub fn verifier(&self) -> VerifierKey {
        self.engine.verifier()
    }

    /// The owning agent id.
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// The owning session id.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Number of accepted transitions.
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Whether any transition has been accepted.
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}

fn config_error(msg: impl Into<String>) -> JournalError {
    JournalError::Config(ConfigError::validation_error(msg))
}

impl<S: StateId> std::fmt::Debug for TransitionMachine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionMachine")
            .field("agent_id", &self.agent_id)
            .field("session_id", &self.session_id)
            .field("current", &self.current)
            .field("log_len", &self.log.len())
            .field("sinks", &(self.sinks.len() + 1))
            .finish()
    }
}

//! Error types for the agent journal.
//!
//! The main error type is [`JournalError`], which covers every failure mode
//! of the engine: construction problems, rejected transitions, crypto and
//! canonicalization failures, sink emission errors and chain-verification
//! mismatches.

use thiserror::Error;

/// Main error type for the agent journal.
#[derive(Error, Debug)]
pub enum JournalError {
    /// An underlying I/O failure, bubbled up from the file store or a
    /// config read
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// A wire value could not be encoded to or decoded from JSON
    #[error("JSON codec error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// A TOML document could not be decoded
    #[error("TOML decode error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Construction or configuration input was rejected. Fatal to the
    /// machine being built.
    #[error("bad configuration: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// The requested transition is not permitted by the policy.
    /// No state change, proof or sink call results from the attempt.
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        /// State the machine was in when the transition was requested.
        from: String,
        /// Requested target state.
        to: String,
    },

    /// Transition parameters could not be serialized deterministically
    #[error("Canonicalization error: {0}")]
    Canonicalization(String),

    /// Key material is missing or could not be parsed
    #[error("Crypto key error: {0}")]
    CryptoKey(String),

    /// A sign or verify primitive failed
    #[error("Crypto operation failed: {0}")]
    CryptoOp(String),

    /// A sink failed to consume a finished proof. The in-memory chain stays
    /// authoritative; reconciliation with the durable store is the caller's
    /// responsibility.
    #[error("Sink error: {0}")]
    Sink(String),

    /// A proof chain failed verification. Only produced by chain
    /// verification, never by `transition`.
    #[error("Proof invalid at index {index}: {reason}")]
    ProofInvalid {
        /// Index of the offending proof in the chain.
        index: usize,
        /// The invariant that failed.
        reason: String,
    },

    /// A history tree operation failed
    #[error("History tree error: {0}")]
    Tree(String),

    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for operations that can fail with a [`JournalError`]
pub type Result<T> = std::result::Result<T, JournalError>;

impl JournalError {
    /// Create a new invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        JournalError::InvalidInput(msg.into())
    }

    /// Create a new crypto key error
    pub fn crypto_key<S: Into<String>>(msg: S) -> Self {
        JournalError::CryptoKey(msg.into())
    }

    /// Create a new sink error
    pub fn sink<S: Into<String>>(msg: S) -> Self {
        JournalError::Sink(msg.into())
    }
}

impl From<String> for JournalError {
    fn from(s: String) -> Self {
        JournalError::InvalidInput(s)
    }
}

impl From<&str> for JournalError {
    fn from(s: &str) -> Self {
        JournalError::InvalidInput(s.to_string())
    }
}

// src/sinks/store.rs

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{JournalError, Result};
use crate::sinks::{TransitionRecord, TransitionSink};

const MARKER_FILE_NAME: &str = ".agent-journal";
const SESSION_FILE_EXT: &str = "jsonl";

/// One persisted transition row. The id is assigned by the store and is
/// monotonic within it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTransition {
    /// Store-assigned monotonic identifier.
    pub id: u64,
    /// Owning agent.
    pub agent_id: String,
    /// Owning session.
    pub session_id: String,
    /// Source state, rendered.
    pub from: String,
    /// Target state, rendered.
    pub to: String,
    /// Action label.
    pub action: String,
    /// The proof in its JSON wire form.
    pub proof_json: String,
}

/// Append-only persistence for finished proofs.
///
/// The engine assumes single-writer-per-`(agent_id, session_id)` semantics
/// at the store.
#[async_trait]
pub trait ProofStore: Send + Sync {
    /// Persists one transition, returning the assigned id. Stores may
    /// deduplicate on `(agent_id, session_id, state_hash)`, in which case
    /// the original id is returned.
    async fn append(&self, record: &TransitionRecord) -> Result<u64>;

    /// Reads back every stored row for one session, in id order. This is
    /// the replay surface callers use to reconcile the durable store with
    /// the in-memory chain.
    async fn load_session(&self, agent_id: &str, session_id: &str) -> Result<Vec<StoredTransition>>;
}

/// An in-memory proof store, primarily for testing or ephemeral use.
#[derive(Debug)]
pub struct MemoryProofStore {
    rows: DashMap<u64, StoredTransition>,
    seen: DashMap<(String, String, String), u64>,
    next_id: AtomicU64,
}

impl MemoryProofStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            seen: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Total number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl ProofStore for MemoryProofStore {
    async fn append(&self, record: &TransitionRecord) -> Result<u64> {
        let dedupe_key = (
            record.agent_id.clone(),
            record.session_id.clone(),
            record.proof.state_hash.clone(),
        );
        if let Some(existing) = self.seen.get(&dedupe_key) {
            return Ok(*existing);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let row = StoredTransition {
            id,
            agent_id: record.agent_id.clone(),
            session_id: record.session_id.clone(),
            from: record.from.clone(),
            to: record.to.clone(),
            action: record.action.clone(),
            proof_json: record.proof.to_json()?,
        };
        self.rows.insert(id, row);
        self.seen.insert(dedupe_key, id);
        Ok(id)
    }

    async fn load_session(&self, agent_id: &str, session_id: &str) -> Result<Vec<StoredTransition>> {
        let mut rows: Vec<StoredTransition> = self
            .rows
            .iter()
            .filter(|entry| {
                entry.value().agent_id == agent_id && entry.value().session_id == session_id
            })
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }
}

/// A proof store that persists rows to the file system.
///
/// Rows are appended as JSON lines in
/// `base_path/agent_<agent_id>/session_<session_id>.jsonl`. On open the
/// store scans existing files so assigned ids keep growing across restarts.
#[derive(Debug)]
pub struct FileProofStore {
    base_path: PathBuf,
    next_id: AtomicU64,
}

impl FileProofStore {
    /// Opens (or initializes) a file store rooted at `base_path`.
    ///
    /// Creates the directory and a marker file if needed, then resumes the
    /// id counter after the highest id already on disk.
    pub async fn open<P: AsRef<Path>>(base_path: P) -> Result<Self> {
        let path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&path).await.map_err(|e| {
            JournalError::Sink(format!("failed to create store path '{}': {}", path.display(), e))
        })?;

        let marker_path = path.join(MARKER_FILE_NAME);
        if !fs::try_exists(&marker_path).await.map_err(|e| {
            JournalError::Sink(format!("failed to check marker '{}': {}", marker_path.display(), e))
        })? {
            fs::File::create(&marker_path).await.map_err(|e| {
                JournalError::Sink(format!("failed to create marker '{}': {}", marker_path.display(), e))
            })?;
        }

        let max_id = scan_max_id(&path).await?;
        Ok(Self {
            base_path: path,
            next_id: AtomicU64::new(max_id + 1),
        })
    }

    fn session_path(&self, agent_id: &str, session_id: &str) -> PathBuf {
        self.base_path
            .join(format!("agent_{}", agent_id))
            .join(format!("session_{}.{}", session_id, SESSION_FILE_EXT))
    }
}

async fn scan_max_id(base_path: &Path) -> Result<u64> {
    let mut max_id = 0u64;
    let mut agents = fs::read_dir(base_path).await.map_err(|e| {
        JournalError::Sink(format!("failed to read store dir '{}': {}", base_path.display(), e))
    })?;

    while let Some(agent_entry) = agents.next_entry().await.map_err(JournalError::Io)? {
        if !agent_entry.path().is_dir() {
            continue;
        }
        let mut sessions = fs::read_dir(agent_entry.path()).await.map_err(JournalError::Io)?;
        while let Some(session_entry) = sessions.next_entry().await.map_err(JournalError::Io)? {
            let path = session_entry.path();
            if path.extension().map_or(true, |ext| ext != SESSION_FILE_EXT) {
                continue;
            }
            let contents = fs::read_to_string(&path).await.map_err(JournalError::Io)?;
            for line in contents.lines().filter(|l| !l.trim().is_empty()) {
                match serde_json::from_str::<StoredTransition>(line) {
                    Ok(row) => max_id = max_id.max(row.id),
                    Err(e) => {
                        log::warn!("skipping unreadable row in '{}': {}", path.display(), e);
                    }
                }
            }
        }
    }
    Ok(max_id)
}

#[async_trait]
impl ProofStore for FileProofStore {
    async fn append(&self, record: &TransitionRecord) -> Result<u64> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let row = StoredTransition {
            id,
            agent_id: record.agent_id.clone(),
            session_id: record.session_id.clone(),
            from: record.from.clone(),
            to: record.to.clone(),
            action: record.action.clone(),
            proof_json: record.proof.to_json()?,
        };

        let path = self.session_path(&record.agent_id, &record.session_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                JournalError::Sink(format!("failed to create '{}': {}", parent.display(), e))
            })?;
        }

        let line = serde_json::to_string(&row)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| JournalError::Sink(format!("failed to open '{}': {}", path.display(), e)))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| JournalError::Sink(format!("failed to write '{}': {}", path.display(), e)))?;
        file.write_all(b"\n")
            .await
            .map_err(|e| JournalError::Sink(format!("failed to write '{}': {}", path.display(), e)))?;
        Ok(id)
    }

    async fn load_session(&self, agent_id: &str, session_id: &str) -> Result<Vec<StoredTransition>> {
        let path = self.session_path(agent_id, session_id);
        if !fs::try_exists(&path).await.map_err(JournalError::Io)? {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&path)
            .await
            .map_err(|e| JournalError::Sink(format!("failed to read '{}': {}", path.display(), e)))?;
        let mut rows = Vec::new();
        for line in contents.lines().filter(|l| !l.trim().is_empty()) {
            rows.push(serde_json::from_str::<StoredTransition>(line)?);
        }
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }
}

/// Sink adapter over a [`ProofStore`].
pub struct StoreSink {
    store: Arc<dyn ProofStore>,
}

impl StoreSink {
    /// Wraps a store as a transition sink.
    pub fn new(store: Arc<dyn ProofStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> Arc<dyn ProofStore> {
        Arc::clone(&self.store)
    }
}

#[async_trait]
impl TransitionSink for StoreSink {
    fn name(&self) -> &str {
        "proof-store"
    }

    async fn on_transition(&self, record: &TransitionRecord) -> Result<()> {
        self.store.append(record).await.map(|_| ())
    }
}

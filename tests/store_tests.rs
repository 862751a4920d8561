use std::sync::Arc;

use agent_journal::sinks::{
    FileProofStore, MemoryProofStore, ProofStore, StoreSink, TransitionRecord, TransitionSink,
};
use agent_journal::test_utils::test_signer;
use agent_journal::{agent_lifecycle_policy, AgentState, ProofEngine, TransitionMachine, TransitionProof};
use serde_json::json;
use tempfile::tempdir;

fn record(agent: &str, session: &str, i: u64) -> TransitionRecord {
    let mut engine = ProofEngine::new(test_signer().clone());
    let proof = engine
        .append("IDLE", "INIT", "start", &json!({ "i": i }))
        .unwrap();
    TransitionRecord {
        agent_id: agent.to_string(),
        session_id: session.to_string(),
        from: "IDLE".to_string(),
        to: "INIT".to_string(),
        action: "start".to_string(),
        proof,
    }
}

#[tokio::test]
async fn memory_store_assigns_monotonic_ids() {
    let store = MemoryProofStore::new();
    let id1 = store.append(&record("a", "s", 1)).await.unwrap();
    let id2 = store.append(&record("a", "s", 2)).await.unwrap();
    let id3 = store.append(&record("a", "other", 3)).await.unwrap();

    assert!(id1 < id2 && id2 < id3);
    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn memory_store_deduplicates_redelivery() {
    let store = MemoryProofStore::new();
    let row = record("a", "s", 1);
    let id1 = store.append(&row).await.unwrap();
    let id2 = store.append(&row).await.unwrap();

    assert_eq!(id1, id2);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn memory_store_filters_by_session() {
    let store = MemoryProofStore::new();
    store.append(&record("a", "s1", 1)).await.unwrap();
    store.append(&record("a", "s2", 2)).await.unwrap();
    store.append(&record("b", "s1", 3)).await.unwrap();

    let rows = store.load_session("a", "s1").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].agent_id, "a");
    assert_eq!(rows[0].session_id, "s1");

    assert!(store.load_session("ghost", "s1").await.unwrap().is_empty());
}

#[tokio::test]
async fn file_store_round_trips_rows() {
    let dir = tempdir().unwrap();
    let store = FileProofStore::open(dir.path()).await.unwrap();

    store.append(&record("a", "s", 1)).await.unwrap();
    store.append(&record("a", "s", 2)).await.unwrap();

    let rows = store.load_session("a", "s").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].id < rows[1].id);

    // Stored proofs are intact JSON wire forms.
    let proof = TransitionProof::from_json(&rows[0].proof_json).unwrap();
    assert!(!proof.state_hash.is_empty());
}

#[tokio::test]
async fn file_store_resumes_ids_after_reopen() {
    let dir = tempdir().unwrap();

    let store = FileProofStore::open(dir.path()).await.unwrap();
    let first = store.append(&record("a", "s", 1)).await.unwrap();
    let second = store.append(&record("a", "s", 2)).await.unwrap();
    drop(store);

    let reopened = FileProofStore::open(dir.path()).await.unwrap();
    let third = reopened.append(&record("a", "s", 3)).await.unwrap();

    assert!(third > second && second > first);
    let rows = reopened.load_session("a", "s").await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![first, second, third]
    );
}

#[tokio::test]
async fn file_store_creates_marker_file() {
    let dir = tempdir().unwrap();
    let _store = FileProofStore::open(dir.path()).await.unwrap();
    assert!(dir.path().join(".agent-journal").exists());
}

#[tokio::test]
async fn unknown_session_loads_empty() {
    let dir = tempdir().unwrap();
    let store = FileProofStore::open(dir.path()).await.unwrap();
    assert!(store.load_session("a", "missing").await.unwrap().is_empty());
}

#[tokio::test]
async fn machine_chain_matches_file_store_replay() {
    let dir = tempdir().unwrap();
    let store = Arc::new(FileProofStore::open(dir.path()).await.unwrap());

    let mut machine = TransitionMachine::new(
        "agent-9",
        "session-9",
        test_signer().clone(),
        AgentState::all(),
        agent_lifecycle_policy(),
        AgentState::Idle,
    )
    .unwrap();
    machine.attach_sink(Arc::new(StoreSink::new(store.clone())));

    machine
        .transition(AgentState::Init, "start", json!({}))
        .await
        .unwrap();
    machine
        .transition(AgentState::GoalParse, "parse", json!({}))
        .await
        .unwrap();

    let rows = store.load_session("agent-9", "session-9").await.unwrap();
    assert_eq!(rows.len(), machine.len());
    for (row, proof) in rows.iter().zip(machine.proofs()) {
        let stored = TransitionProof::from_json(&row.proof_json).unwrap();
        assert_eq!(&stored, proof);
    }
}

#[tokio::test]
async fn store_sink_reports_its_name() {
    let sink = StoreSink::new(Arc::new(MemoryProofStore::new()));
    assert_eq!(sink.name(), "proof-store");
}

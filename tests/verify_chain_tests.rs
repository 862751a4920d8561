use agent_journal::test_utils::test_signer;
use agent_journal::{
    agent_lifecycle_policy, verify_chain, verify_chain_json, AgentState, SigningIdentity,
    TransitionMachine, TransitionProof, VerifierKey,
};
use serde_json::json;

async fn three_step_chain() -> (Vec<TransitionProof>, VerifierKey) {
    let mut machine = TransitionMachine::new(
        "agent-1",
        "session-1",
        test_signer().clone(),
        AgentState::all(),
        agent_lifecycle_policy(),
        AgentState::Idle,
    )
    .unwrap();

    machine
        .transition(AgentState::Init, "start", json!({}))
        .await
        .unwrap();
    machine
        .transition(AgentState::GoalParse, "parse", json!({"g": "x"}))
        .await
        .unwrap();
    machine
        .transition(AgentState::Planning, "plan", json!({}))
        .await
        .unwrap();

    (machine.proofs().to_vec(), machine.verifier())
}

fn flip_first_nibble(hex: &str) -> String {
    let mut chars: Vec<char> = hex.chars().collect();
    chars[0] = if chars[0] == 'f' { 'e' } else { 'f' };
    chars.into_iter().collect()
}

#[tokio::test]
async fn intact_chain_verifies() {
    let (proofs, key) = three_step_chain().await;
    let verdict = verify_chain(&proofs, &key);
    assert!(verdict.ok);
    assert_eq!(verdict.failed_at, None);
    assert_eq!(verdict.reason, None);
}

#[tokio::test]
async fn tampered_state_hash_is_caught_at_or_after_the_mutation() {
    let (mut proofs, key) = three_step_chain().await;
    proofs[1].state_hash = flip_first_nibble(&proofs[1].state_hash);

    let verdict = verify_chain(&proofs, &key);
    assert!(!verdict.ok);
    let failed_at = verdict.failed_at.unwrap();
    assert!(failed_at == 1 || failed_at == 2, "failed_at = {}", failed_at);
}

#[tokio::test]
async fn every_mutated_field_is_detected() {
    let (proofs, key) = three_step_chain().await;

    for index in 0..proofs.len() {
        let mut tampered = proofs.clone();
        tampered[index].signature = flip_first_nibble(&tampered[index].signature);
        let verdict = verify_chain(&tampered, &key);
        assert!(!verdict.ok);
        assert!(verdict.failed_at.unwrap() <= index);

        let mut tampered = proofs.clone();
        tampered[index].merkle_root = flip_first_nibble(&tampered[index].merkle_root);
        let verdict = verify_chain(&tampered, &key);
        assert!(!verdict.ok);
        assert_eq!(verdict.failed_at, Some(index));

        if index > 0 {
            let mut tampered = proofs.clone();
            tampered[index].prev_hash = flip_first_nibble(&tampered[index].prev_hash);
            let verdict = verify_chain(&tampered, &key);
            assert!(!verdict.ok);
            assert_eq!(verdict.failed_at, Some(index));
        }
    }
}

#[tokio::test]
async fn tampered_inclusion_path_is_detected() {
    let (mut proofs, key) = three_step_chain().await;
    // Index 2 has a non-empty path in a three-leaf tree.
    assert!(!proofs[2].merkle_proof.is_empty());
    proofs[2].merkle_proof[0] = flip_first_nibble(&proofs[2].merkle_proof[0]);

    let verdict = verify_chain(&proofs, &key);
    assert!(!verdict.ok);
    assert_eq!(verdict.failed_at, Some(2));
    assert_eq!(verdict.reason.as_deref(), Some("merkle inclusion proof invalid"));
}

#[tokio::test]
async fn malformed_state_hash_is_rejected_before_crypto() {
    let (mut proofs, key) = three_step_chain().await;
    proofs[0].state_hash = "not-a-digest".to_string();

    let verdict = verify_chain(&proofs, &key);
    assert!(!verdict.ok);
    assert_eq!(verdict.failed_at, Some(0));
    assert_eq!(
        verdict.reason.as_deref(),
        Some("state hash is not a well-formed digest")
    );
}

#[tokio::test]
async fn reordered_proofs_break_the_chain() {
    let (mut proofs, key) = three_step_chain().await;
    proofs.swap(1, 2);

    let verdict = verify_chain(&proofs, &key);
    assert!(!verdict.ok);
    assert!(verdict.failed_at.unwrap() <= 2);
}

#[tokio::test]
async fn removed_proof_breaks_the_chain() {
    let (mut proofs, key) = three_step_chain().await;
    proofs.remove(1);

    let verdict = verify_chain(&proofs, &key);
    assert!(!verdict.ok);
    assert_eq!(verdict.failed_at, Some(1));
}

#[tokio::test]
async fn wrong_public_key_fails_at_index_zero() {
    let (proofs, _) = three_step_chain().await;
    let stranger = SigningIdentity::generate(2048).unwrap();

    let verdict = verify_chain(&proofs, &stranger.verifier());
    assert!(!verdict.ok);
    assert_eq!(verdict.failed_at, Some(0));
    assert_eq!(
        verdict.reason.as_deref(),
        Some("signature verification failed")
    );
}

#[tokio::test]
async fn json_boundary_accepts_hex_key_material() {
    let (proofs, key) = three_step_chain().await;
    let proofs_json = serde_json::to_string(&proofs).unwrap();
    let key_hex = key.to_hex().unwrap();

    let verdict = verify_chain_json(&proofs_json, &key_hex).unwrap();
    assert!(verdict.ok);

    // Verdicts serialize with the documented field names.
    let rendered = serde_json::to_string(&verdict).unwrap();
    assert_eq!(rendered, r#"{"ok":true}"#);
}

#[tokio::test]
async fn json_boundary_rejects_unusable_inputs() {
    let (proofs, key) = three_step_chain().await;
    let proofs_json = serde_json::to_string(&proofs).unwrap();
    let key_hex = key.to_hex().unwrap();

    assert!(verify_chain_json("[{\"nope\":1}]", &key_hex).is_err());
    assert!(verify_chain_json(&proofs_json, "not hex").is_err());
}

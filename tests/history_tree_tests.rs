use agent_journal::test_utils::seeded_rng;
use agent_journal::{JournalError, VersionTree};
use rand::Rng;
use serde_json::json;

/// Producer used by the branching tests: the k-th child (1-based) at level L
/// carries `{"v": L*10 + k}`.
fn produce_all(level: u32) -> impl FnOnce(usize, &[String]) -> Vec<(serde_json::Value, String)> {
    move |_n, versions| {
        versions
            .iter()
            .enumerate()
            .map(|(k, v)| (json!({ "v": level * 10 + (k as u32 + 1) }), v.clone()))
            .collect()
    }
}

#[test]
fn seeded_branching_is_fully_deterministic() {
    const SEED: u64 = 42;
    let mut tree = VersionTree::with_rng(json!({"v": 0}), seeded_rng(SEED));
    // A mirror of the tree's random source, drawn in the same order the
    // tree draws: parent index, child count, current-child index.
    let mut mirror = seeded_rng(SEED);

    for round in 0..3u32 {
        let level = round + 1;
        let parents = tree.versions_at_level(tree.max_level());
        let parent_index = mirror.gen_range(0..parents.len());
        let expected_parent = parents[parent_index].clone();
        let n = mirror.gen_range(1..=4usize);
        let chosen = mirror.gen_range(0..n);

        let current = tree.branch_random(produce_all(level)).unwrap();

        assert_eq!(tree.max_level(), level);
        assert_eq!(current, format!("{}@{}", level, chosen + 1));
        assert_eq!(tree.current_version(), current);

        let parent = tree.find(&expected_parent).unwrap();
        assert_eq!(parent.children.len(), n);
        for (k, child) in parent.children.iter().enumerate() {
            assert_eq!(child.version, format!("{}@{}", level, k + 1));
            assert_eq!(child.level, level);
            assert_eq!(child.data, json!({"v": level * 10 + (k as u32 + 1)}));
        }
    }

    // The same seed reproduces the identical tree.
    let mut replay = VersionTree::with_rng(json!({"v": 0}), seeded_rng(SEED));
    for round in 0..3u32 {
        replay.branch_random(produce_all(round + 1)).unwrap();
    }
    assert_eq!(replay.to_json().unwrap(), tree.to_json().unwrap());
}

#[test]
fn save_load_round_trip_is_byte_identical() {
    let mut tree = VersionTree::with_rng(json!({"v": 0}), seeded_rng(7));
    for round in 0..3u32 {
        tree.branch_random(produce_all(round + 1)).unwrap();
    }

    let saved = tree.to_json().unwrap();
    let restored = VersionTree::from_json(&saved).unwrap();

    assert_eq!(restored.to_json().unwrap(), saved);
    assert_eq!(restored.max_level(), tree.max_level());
    assert_eq!(restored.current_version(), tree.current_version());
    assert_eq!(restored.len(), tree.len());
    assert_eq!(restored.current().data, tree.current().data);
}

#[test]
fn restored_trees_keep_branching() {
    let mut tree = VersionTree::with_rng(json!(null), seeded_rng(1));
    tree.branch_random(produce_all(1)).unwrap();

    let saved = tree.to_json().unwrap();
    let mut restored = VersionTree::from_json_with_rng(&saved, seeded_rng(99)).unwrap();
    let version = restored.branch_random(produce_all(2)).unwrap();

    assert!(version.starts_with("2@"));
    assert_eq!(restored.max_level(), 2);
}

#[test]
fn levels_only_grow() {
    let mut tree = VersionTree::with_rng(json!(null), seeded_rng(13));
    let mut previous = tree.max_level();
    for round in 0..5u32 {
        tree.branch_random(produce_all(round + 1)).unwrap();
        assert_eq!(tree.max_level(), previous + 1);
        previous = tree.max_level();
    }
}

#[test]
fn sibling_ordinals_are_dense_from_one() {
    let mut tree = VersionTree::with_rng(json!(null), seeded_rng(21));
    for round in 0..4u32 {
        tree.branch_random(produce_all(round + 1)).unwrap();
    }

    for level in 0..=tree.max_level() {
        let versions = tree.versions_at_level(level);
        assert!(!versions.is_empty(), "level {} is empty", level);
        for (i, version) in versions.iter().enumerate() {
            assert_eq!(version, &format!("{}@{}", level, i + 1));
        }
    }
}

#[test]
fn update_current_survives_round_trip() {
    let mut tree = VersionTree::with_rng(json!({"v": 0}), seeded_rng(5));
    tree.branch_random(produce_all(1)).unwrap();
    tree.update_current(json!({"patched": true}));

    let restored = VersionTree::from_json(&tree.to_json().unwrap()).unwrap();
    assert_eq!(restored.current().data, json!({"patched": true}));
}

#[test]
fn short_producer_keeps_pointer_in_range() {
    // Run many seeds: whatever index is drawn, a single-child producer must
    // land the pointer on its only child.
    for seed in 0..20 {
        let mut tree = VersionTree::with_rng(json!(null), seeded_rng(seed));
        let version = tree
            .branch_random(|_, versions| vec![(json!(0), versions[0].clone())])
            .unwrap();
        assert_eq!(version, "1@1");
        assert_eq!(tree.current_version(), "1@1");
    }
}

#[test]
fn empty_producer_errors_and_leaves_tree_untouched() {
    let mut tree = VersionTree::with_rng(json!(null), seeded_rng(2));
    let before = tree.to_json().unwrap();

    let err = tree.branch_random(|_, _| Vec::new()).unwrap_err();
    assert!(matches!(err, JournalError::Tree(_)));
    assert_eq!(tree.to_json().unwrap(), before);
}

#[test]
fn render_minimal_marks_only_the_current_node() {
    let mut tree = VersionTree::with_rng(json!(null), seeded_rng(9));
    tree.branch_random(produce_all(1)).unwrap();

    let rendered = tree.render_minimal();
    let marked: Vec<&str> = rendered.lines().filter(|l| l.ends_with('*')).collect();
    assert_eq!(marked.len(), 1);
    assert!(marked[0].trim_start().starts_with(tree.current_version()));
}

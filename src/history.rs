// src/history.rs

//! Branching history of evolving payloads.
//!
//! A [`VersionTree`] records snapshots as a tree in which every edge is a
//! deliberate branch event. Node identifiers have the form `"L@V"` where `L`
//! is the node's level and `V` is a 1-based ordinal among its siblings;
//! identifiers are stable across serialize/restore. The tree is independent
//! of the proof engine and is used by higher layers that want branching
//! history of domain payloads (persona snapshots, for example).

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{JournalError, Result};

/// One snapshot in the history tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionNode {
    /// Stable `"L@V"` identifier.
    pub version: String,
    /// Depth of the node; the root is level 0.
    pub level: u32,
    /// The snapshot payload.
    pub data: Value,
    /// Branches taken from this snapshot, in creation order.
    pub children: Vec<VersionNode>,
}

impl VersionNode {
    fn new(version: String, level: u32, data: Value) -> Self {
        Self {
            version,
            level,
            data,
            children: Vec::new(),
        }
    }
}

/// Serialized form. Field names are part of the wire contract.
#[derive(Debug, Serialize, Deserialize)]
struct TreeState {
    root: VersionNode,
    #[serde(rename = "maxLevel")]
    max_level: u32,
    #[serde(rename = "currentNode")]
    current_node: Option<String>,
}

/// A branching snapshot tree with a current pointer and a max-level cache.
///
/// Levels only grow; branching always happens below the deepest level. The
/// random source is pluggable so tests can inject determinism.
pub struct VersionTree {
    root: VersionNode,
    max_level: u32,
    current: String,
    rng: Box<dyn RngCore + Send>,
}

impl std::fmt::Debug for VersionTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionTree")
            .field("max_level", &self.max_level)
            .field("current", &self.current)
            .field("len", &self.len())
            .finish()
    }
}

impl VersionTree {
    /// Creates a tree whose root (`0@1`, level 0) holds `initial_data` and
    /// is the current node. Uses a system-seeded random source.
    pub fn new(initial_data: Value) -> Self {
        Self::with_rng(initial_data, StdRng::from_entropy())
    }

    /// Creates a tree with an explicit random source.
    pub fn with_rng<R: RngCore + Send + 'static>(initial_data: Value, rng: R) -> Self {
        let root = VersionNode::new("0@1".to_string(), 0, initial_data);
        Self {
            current: root.version.clone(),
            root,
            max_level: 0,
            rng: Box::new(rng),
        }
    }

    /// The node the current pointer designates.
    pub fn current(&self) -> &VersionNode {
        // The pointer is only ever set to an attached version.
        find(&self.root, &self.current).expect("current version exists in the tree")
    }

    /// The current node's version string.
    pub fn current_version(&self) -> &str {
        &self.current
    }

    /// The greatest level among all nodes.
    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        count(&self.root)
    }

    /// Whether the tree holds only its root.
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// Looks up a node by version string.
    pub fn find(&self, version: &str) -> Option<&VersionNode> {
        find(&self.root, version)
    }

    /// The versions of all nodes at `level`, in tree order.
    pub fn versions_at_level(&self, level: u32) -> Vec<String> {
        let mut out = Vec::new();
        collect_at_level(&self.root, level, &mut out);
        out
    }

    /// Grows the tree by one level under a randomly chosen deepest node.
    ///
    /// A parent is drawn uniformly among the nodes at the max level, a child
    /// count `n` is drawn uniformly from `1..=4`, and the child version
    /// strings `"(max_level+1)@1" .. "(max_level+1)@n"` are constructed.
    /// `produce(n, versions)` supplies `(data, version)` pairs which are
    /// attached in order; if it returns fewer than `n` entries only those
    /// are attached, and the uniformly drawn current-child index is reduced
    /// modulo the actual count. The current pointer moves to the chosen
    /// child and the max level increments.
    ///
    /// # Errors
    ///
    /// Returns `JournalError::Tree` if `produce` yields no children; the
    /// modulo fallback is undefined at zero.
    pub fn branch_random<F>(&mut self, produce: F) -> Result<String>
    where
        F: FnOnce(usize, &[String]) -> Vec<(Value, String)>,
    {
        let parents = self.versions_at_level(self.max_level);
        let parent_version = parents[self.rng.gen_range(0..parents.len())].clone();

        let n = self.rng.gen_range(1..=4usize);
        let child_level = self.max_level + 1;
        let versions: Vec<String> = (1..=n).map(|v| format!("{}@{}", child_level, v)).collect();

        let mut produced = produce(n, &versions);
        produced.truncate(n);
        if produced.is_empty() {
            return Err(JournalError::Tree(
                "branch producer returned no children".to_string(),
            ));
        }

        let chosen = self.rng.gen_range(0..n) % produced.len();

        let parent = find_mut(&mut self.root, &parent_version)
            .ok_or_else(|| JournalError::Tree(format!("parent '{}' vanished", parent_version)))?;
        let mut chosen_version = String::new();
        for (index, (data, version)) in produced.into_iter().enumerate() {
            if index == chosen {
                chosen_version = version.clone();
            }
            parent.children.push(VersionNode::new(version, child_level, data));
        }

        self.current = chosen_version;
        self.max_level = child_level;
        Ok(self.current.clone())
    }

    /// Replaces the payload of the current node in place. The node keeps its
    /// version; payload stability across updates is explicitly not promised.
    pub fn update_current(&mut self, data: Value) {
        let current = self.current.clone();
        if let Some(node) = find_mut(&mut self.root, &current) {
            node.data = data;
        }
    }

    /// Serializes the tree (structure, payloads, max level, current pointer)
    /// to its JSON wire form.
    pub fn to_json(&self) -> Result<String> {
        let state = TreeState {
            root: self.root.clone(),
            max_level: self.max_level,
            current_node: Some(self.current.clone()),
        };
        Ok(serde_json::to_string(&state)?)
    }

    /// Restores a tree from its JSON wire form, with a system-seeded random
    /// source.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_json_with_rng(json, StdRng::from_entropy())
    }

    /// Restores a tree from its JSON wire form with an explicit random
    /// source. Structural invariants (level/version agreement, dense sibling
    /// ordinals, max-level cache, current pointer) are validated.
    pub fn from_json_with_rng<R: RngCore + Send + 'static>(json: &str, rng: R) -> Result<Self> {
        let state: TreeState = serde_json::from_str(json)?;
        validate_node(&state.root, 0)?;

        let computed_max = deepest(&state.root);
        if computed_max != state.max_level {
            return Err(JournalError::Tree(format!(
                "maxLevel {} does not match deepest node level {}",
                state.max_level, computed_max
            )));
        }

        let current = state
            .current_node
            .unwrap_or_else(|| state.root.version.clone());
        if find(&state.root, &current).is_none() {
            return Err(JournalError::Tree(format!(
                "currentNode '{}' is not in the tree",
                current
            )));
        }

        Ok(Self {
            root: state.root,
            max_level: state.max_level,
            current,
            rng: Box::new(rng),
        })
    }

    /// ASCII rendering of the tree with payloads; the current node is
    /// marked with `*`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_node(&self.root, 0, true, &mut out);
        out
    }

    /// ASCII rendering of version strings only; the current node is marked
    /// with `*`.
    pub fn render_minimal(&self) -> String {
        let mut out = String::new();
        self.render_node(&self.root, 0, false, &mut out);
        out
    }

    fn render_node(&self, node: &VersionNode, depth: usize, with_data: bool, out: &mut String) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(&node.version);
        if node.version == self.current {
            out.push_str(" *");
        }
        if with_data {
            out.push(' ');
            out.push_str(&node.data.to_string());
        }
        out.push('\n');
        for child in &node.children {
            self.render_node(child, depth + 1, with_data, out);
        }
    }
}

fn find<'a>(node: &'a VersionNode, version: &str) -> Option<&'a VersionNode> {
    if node.version == version {
        return Some(node);
    }
    node.children.iter().find_map(|child| find(child, version))
}

fn find_mut<'a>(node: &'a mut VersionNode, version: &str) -> Option<&'a mut VersionNode> {
    if node.version == version {
        return Some(node);
    }
    node.children
        .iter_mut()
        .find_map(|child| find_mut(child, version))
}

fn count(node: &VersionNode) -> usize {
    1 + node.children.iter().map(count).sum::<usize>()
}

fn deepest(node: &VersionNode) -> u32 {
    node.children
        .iter()
        .map(deepest)
        .max()
        .unwrap_or(node.level)
}

fn collect_at_level(node: &VersionNode, level: u32, out: &mut Vec<String>) {
    if node.level == level {
        out.push(node.version.clone());
    }
    for child in &node.children {
        collect_at_level(child, level, out);
    }
}

fn validate_node(node: &VersionNode, expected_level: u32) -> Result<()> {
    if node.level != expected_level {
        return Err(JournalError::Tree(format!(
            "node '{}' has level {}, expected {}",
            node.version, node.level, expected_level
        )));
    }
    let expected_prefix = format!("{}@", node.level);
    if !node.version.starts_with(&expected_prefix) {
        return Err(JournalError::Tree(format!(
            "node version '{}' does not match level {}",
            node.version, node.level
        )));
    }
    for (i, child) in node.children.iter().enumerate() {
        let expected_version = format!("{}@{}", expected_level + 1, i + 1);
        if child.version != expected_version {
            return Err(JournalError::Tree(format!(
                "child '{}' of '{}' breaks sibling ordering, expected '{}'",
                child.version, node.version, expected_version
            )));
        }
        validate_node(child, expected_level + 1)?;
    }
    Ok(())
}

//! Snapshot statistics.
//!
//! Summarises the composition of a built graph network: nodes per
//! display type, link labels, orphans, degree and the most connected
//! nodes.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::types::{NodeId, Snapshot};

// ============================================================================
// Types
// ============================================================================

/// Statistics about a snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnapshotStats {
    /// Total number of nodes.
    pub node_count: usize,
    /// Total number of links.
    pub link_count: usize,
    /// Nodes per display type.
    pub type_distribution: BTreeMap<String, usize>,
    /// Links per relationship label.
    pub label_distribution: BTreeMap<String, usize>,
    /// Nodes without links.
    pub orphan_count: usize,
    /// Average links per node.
    pub avg_degree: f32,
    /// Nodes with the most links, highest first.
    pub top_nodes: Vec<TopNode>,
}

/// A highly connected node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopNode {
    /// Node id.
    pub id: NodeId,
    /// Display label.
    pub label: String,
    /// Link count.
    pub degree: usize,
}

// ============================================================================
// Functions
// ============================================================================

/// Compute statistics for `snapshot`, listing up to `top` nodes.
pub fn compute_stats(snapshot: &Snapshot, top: usize) -> SnapshotStats {
    let node_count = snapshot.nodes.len();
    let link_count = snapshot.links.len();

    let mut type_distribution = BTreeMap::new();
    for node in &snapshot.nodes {
        *type_distribution
            .entry(node.kind.as_str().to_string())
            .or_insert(0) += 1;
    }

    let mut label_distribution = BTreeMap::new();
    for link in &snapshot.links {
        *label_distribution.entry(link.label.clone()).or_insert(0) += 1;
    }

    // Degree from links rather than the stored count, so stats stay
    // truthful for hand-edited snapshots.
    let mut degree: HashMap<NodeId, usize> = HashMap::new();
    for link in &snapshot.links {
        *degree.entry(link.source).or_insert(0) += 1;
        *degree.entry(link.target).or_insert(0) += 1;
    }

    let orphan_count = snapshot
        .nodes
        .iter()
        .filter(|n| !degree.contains_key(&n.id))
        .count();

    let avg_degree = if node_count > 0 {
        (link_count * 2) as f32 / node_count as f32
    } else {
        0.0
    };

    let mut top_nodes: Vec<TopNode> = snapshot
        .nodes
        .iter()
        .map(|n| TopNode {
            id: n.id,
            label: n.label.clone(),
            degree: degree.get(&n.id).copied().unwrap_or(0),
        })
        .filter(|t| t.degree > 0)
        .collect();
    top_nodes.sort_by(|a, b| b.degree.cmp(&a.degree).then(a.id.cmp(&b.id)));
    top_nodes.truncate(top);

    SnapshotStats {
        node_count,
        link_count,
        type_distribution,
        label_distribution,
        orphan_count,
        avg_degree,
        top_nodes,
    }
}

// ============================================================================
// Tests
// ============================================================================

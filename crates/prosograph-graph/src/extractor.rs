//! Extraction of the visualizable graph from the property-graph store.
//!
//! [`GraphExtractor`] pulls every relationship touching a public Event,
//! Organisation, Person or Resource, keeps the visualizable endpoints,
//! collapses multi-edges to one link per unordered node pair and styles
//! each node by its link count.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use prosograph_core::Result;

use crate::source::{GraphSource, TaxonomyResolver};
use crate::style::{Classifier, NodeStyle};
use crate::types::{EdgeRecord, NeighborRow, NodeId, NodeRecord, SourceNode, pair_key};

/// Nodes and deduplicated links ready for layout.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractedGraph {
    /// Nodes in first-seen order.
    pub nodes: Vec<NodeRecord>,
    /// One link per unordered node pair.
    pub links: Vec<EdgeRecord>,
}

impl ExtractedGraph {
    /// Whether nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Builds the visualizable graph from a [`GraphSource`].
#[derive(Clone)]
pub struct GraphExtractor {
    source: Arc<dyn GraphSource>,
    resolver: Arc<dyn TaxonomyResolver>,
    style: NodeStyle,
}

impl GraphExtractor {
    /// Create an extractor.
    pub fn new(
        source: Arc<dyn GraphSource>,
        resolver: Arc<dyn TaxonomyResolver>,
        style: NodeStyle,
    ) -> Self {
        Self {
            source,
            resolver,
            style,
        }
    }

    /// Query the source and build the graph.
    ///
    /// Any source failure aborts extraction; no partial graph is returned.
    pub async fn extract(&self) -> Result<ExtractedGraph> {
        let classifier = Classifier::resolve(self.resolver.as_ref(), self.style.clone()).await?;
        let rows = self.source.neighbor_rows().await?;
        let graph = build_graph(&rows, &classifier);
        log::info!(
            "Extracted {} nodes and {} links from {} rows",
            graph.nodes.len(),
            graph.links.len(),
            rows.len()
        );
        Ok(graph)
    }
}

/// Turn neighbour rows into styled nodes and deduplicated links.
pub fn build_graph(rows: &[NeighborRow], classifier: &Classifier) -> ExtractedGraph {
    let mut order: Vec<&SourceNode> = Vec::new();
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut links = Vec::new();
    let mut pairs = HashSet::new();

    for row in rows {
        if seen.insert(row.node.id) {
            order.push(&row.node);
        }
        if row.neighbor.label.is_visualizable() && seen.insert(row.neighbor.id) {
            order.push(&row.neighbor);
        }

        let rel = &row.relationship;
        if rel.start == rel.end {
            continue;
        }
        let resolved = |id: NodeId| {
            id == row.node.id || (id == row.neighbor.id && row.neighbor.label.is_visualizable())
        };
        if !resolved(rel.start) || !resolved(rel.end) {
            continue;
        }
        if pairs.insert(pair_key(rel.start, rel.end)) {
            links.push(EdgeRecord {
                ref_id: rel.id,
                source: rel.start,
                target: rel.end,
                label: rel.rel_type.clone(),
            });
        }
    }

    let mut counts: HashMap<NodeId, u32> = HashMap::new();
    for link in &links {
        *counts.entry(link.source).or_default() += 1;
        *counts.entry(link.target).or_default() += 1;
    }

    let nodes = order
        .into_iter()
        .filter_map(|node| classifier.record(node, counts.get(&node.id).copied().unwrap_or(0)))
        .collect();

    ExtractedGraph { nodes, links }
}

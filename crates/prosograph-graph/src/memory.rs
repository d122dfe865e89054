//! In-memory property graph backed by petgraph.
//!
//! [`InMemoryGraphSource`] holds a directed multigraph of [`SourceNode`]s
//! and [`SourceRelationship`]s and answers every [`GraphSource`] query
//! natively. It loads from a JSON export of the form
//! `{"nodes": [{id, label, properties}], "relationships": [{id, start, end, type}]}`.

use async_trait::async_trait;
use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use prosograph_core::{Error, Result};

use crate::source::{GraphSource, TaxonomyResolver};
use crate::types::{
    GeoPoint, HeatmapEntry, NeighborRow, NodeId, SourceLabel, SourceNode, SourcePath,
    SourceRelationship,
};

/// `organisationType` of the organisations shown on the heatmap.
pub const DIOCESE: &str = "Diocese";

// ============================================================================
// Export format
// ============================================================================

/// Serializable dump of a property graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphExport {
    /// All nodes.
    #[serde(default)]
    pub nodes: Vec<SourceNode>,
    /// All relationships.
    #[serde(default)]
    pub relationships: Vec<SourceRelationship>,
}

// ============================================================================
// Store
// ============================================================================

#[derive(Default)]
struct Store {
    graph: DiGraph<SourceNode, SourceRelationship>,
    index: HashMap<NodeId, NodeIndex>,
}

impl Store {
    fn insert_node(&mut self, node: SourceNode) -> Result<()> {
        if self.index.contains_key(&node.id) {
            return Err(Error::invalid_data(format!("duplicate node id {}", node.id)));
        }
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        Ok(())
    }

    fn insert_relationship(&mut self, rel: SourceRelationship) -> Result<()> {
        let start = self.lookup(rel.start).ok_or_else(|| {
            Error::invalid_data(format!(
                "relationship {} starts at unknown node {}",
                rel.id, rel.start
            ))
        })?;
        let end = self.lookup(rel.end).ok_or_else(|| {
            Error::invalid_data(format!(
                "relationship {} ends at unknown node {}",
                rel.id, rel.end
            ))
        })?;
        self.graph.add_edge(start, end, rel);
        Ok(())
    }

    fn lookup(&self, id: NodeId) -> Option<NodeIndex> {
        self.index.get(&id).copied()
    }

    /// Relationships touching `idx` in either direction, as
    /// `(edge, other end)`, ordered by relationship id.
    fn incident(&self, idx: NodeIndex) -> Vec<(EdgeIndex, NodeIndex)> {
        let mut edges: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .chain(
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .filter(|e| e.source() != e.target())
                    .map(|e| (e.id(), e.source())),
            )
            .collect();
        edges.sort_by_key(|(edge, _)| self.graph[*edge].id);
        edges
    }

    /// Undirected BFS distances from `start`, up to `max_depth` hops.
    ///
    /// Also records, for every reached node, the `(predecessor, edge)`
    /// pairs lying on a shortest path.
    fn bfs(&self, start: NodeIndex, max_depth: usize) -> Bfs {
        let mut dist = HashMap::from([(start, 0usize)]);
        let mut preds: HashMap<NodeIndex, Vec<(NodeIndex, EdgeIndex)>> = HashMap::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            let depth = dist[&current];
            if depth == max_depth {
                continue;
            }
            for (edge, next) in self.incident(current) {
                if next == current {
                    continue;
                }
                match dist.get(&next) {
                    None => {
                        dist.insert(next, depth + 1);
                        preds.entry(next).or_default().push((current, edge));
                        queue.push_back(next);
                    }
                    Some(&d) if d == depth + 1 => {
                        preds.entry(next).or_default().push((current, edge));
                    }
                    Some(_) => {}
                }
            }
        }

        Bfs { dist, preds }
    }
}

struct Bfs {
    dist: HashMap<NodeIndex, usize>,
    preds: HashMap<NodeIndex, Vec<(NodeIndex, EdgeIndex)>>,
}

/// A property graph held in memory.
#[derive(Default)]
pub struct InMemoryGraphSource {
    store: RwLock<Store>,
}

impl InMemoryGraphSource {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from an export.
    ///
    /// Fails on duplicate node ids and on relationships whose endpoints
    /// are missing.
    pub fn from_export(export: GraphExport) -> Result<Self> {
        let mut store = Store::default();
        for node in export.nodes {
            store.insert_node(node)?;
        }
        for rel in export.relationships {
            store.insert_relationship(rel)?;
        }
        Ok(Self {
            store: RwLock::new(store),
        })
    }

    /// Parse an export from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let export: GraphExport = serde_json::from_str(json)?;
        Self::from_export(export)
    }

    /// Load an export from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::file_not_found(path));
        }
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        let source = Self::from_json_str(&content)?;
        log::info!(
            "Loaded graph export from {} ({} nodes, {} relationships)",
            path.display(),
            source.node_count(),
            source.relationship_count()
        );
        Ok(source)
    }

    /// Dump the graph back to its export form.
    pub fn export(&self) -> Result<GraphExport> {
        let store = self.read()?;
        Ok(GraphExport {
            nodes: store.graph.node_weights().cloned().collect(),
            relationships: store.graph.edge_weights().cloned().collect(),
        })
    }

    /// Add a node.
    pub fn add_node(&self, node: SourceNode) -> Result<()> {
        self.write()?.insert_node(node)
    }

    /// Add a relationship between existing nodes.
    pub fn add_relationship(&self, rel: SourceRelationship) -> Result<()> {
        self.write()?.insert_relationship(rel)
    }

    /// Set a property on an existing node.
    pub fn set_property(
        &self,
        id: NodeId,
        key: &str,
        value: impl Into<serde_json::Value>,
    ) -> Result<()> {
        let mut store = self.write()?;
        let idx = store
            .lookup(id)
            .ok_or_else(|| Error::not_found(format!("node {id}")))?;
        store.graph[idx].properties.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Number of nodes, or 0 if the store is unreadable.
    pub fn node_count(&self) -> usize {
        self.read().map(|s| s.graph.node_count()).unwrap_or(0)
    }

    /// Number of relationships, or 0 if the store is unreadable.
    pub fn relationship_count(&self) -> usize {
        self.read().map(|s| s.graph.edge_count()).unwrap_or(0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Store>> {
        self.store
            .read()
            .map_err(|_| Error::data_source("graph store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Store>> {
        self.store
            .write()
            .map_err(|_| Error::data_source("graph store lock poisoned"))
    }
}

/// Walk shortest-path predecessors back from `target`, producing paths
/// from the BFS root to `target` in a stable order.
fn collect_paths(
    store: &Store,
    bfs: &Bfs,
    target: NodeIndex,
    limit: usize,
) -> Vec<SourcePath> {
    fn walk(
        store: &Store,
        bfs: &Bfs,
        current: NodeIndex,
        nodes: &mut Vec<NodeIndex>,
        edges: &mut Vec<EdgeIndex>,
        out: &mut Vec<SourcePath>,
        limit: usize,
    ) {
        if out.len() >= limit {
            return;
        }
        let Some(preds) = bfs.preds.get(&current) else {
            // Reached the root: nodes and edges are in reverse order.
            out.push(SourcePath {
                nodes: nodes.iter().rev().map(|i| store.graph[*i].clone()).collect(),
                relationships: edges.iter().rev().map(|e| store.graph[*e].clone()).collect(),
            });
            return;
        };
        for (prev, edge) in preds {
            nodes.push(*prev);
            edges.push(*edge);
            walk(store, bfs, *prev, nodes, edges, out, limit);
            nodes.pop();
            edges.pop();
        }
    }

    let mut out = Vec::new();
    let mut nodes = vec![target];
    let mut edges = Vec::new();
    walk(store, bfs, target, &mut nodes, &mut edges, &mut out, limit);
    out
}

#[async_trait]
impl GraphSource for InMemoryGraphSource {
    async fn count_public(&self, label: SourceLabel) -> Result<u64> {
        let store = self.read()?;
        let count = store
            .graph
            .node_weights()
            .filter(|n| n.label == label && n.is_public())
            .count();
        Ok(count as u64)
    }

    async fn neighbor_rows(&self) -> Result<Vec<NeighborRow>> {
        let store = self.read()?;
        let mut rows = Vec::new();
        for idx in store.graph.node_indices() {
            let node = &store.graph[idx];
            if !node.label.is_visualizable() || !node.is_public() {
                continue;
            }
            for (edge, other) in store.incident(idx) {
                rows.push(NeighborRow {
                    node: node.clone(),
                    relationship: store.graph[edge].clone(),
                    neighbor: store.graph[other].clone(),
                });
            }
        }
        log::debug!("Neighbour query returned {} rows", rows.len());
        Ok(rows)
    }

    async fn all_shortest_paths(
        &self,
        source: NodeId,
        target: NodeId,
        max_hops: usize,
        limit: usize,
    ) -> Result<Vec<SourcePath>> {
        let store = self.read()?;
        let (Some(from), Some(to)) = (store.lookup(source), store.lookup(target)) else {
            return Ok(Vec::new());
        };
        if from == to || limit == 0 {
            return Ok(Vec::new());
        }
        let bfs = store.bfs(from, max_hops);
        if !bfs.dist.contains_key(&to) {
            return Ok(Vec::new());
        }
        Ok(collect_paths(&store, &bfs, to, limit))
    }

    async fn related_nodes(&self, id: NodeId, steps: usize) -> Result<Vec<SourceNode>> {
        let store = self.read()?;
        let Some(start) = store.lookup(id) else {
            return Ok(Vec::new());
        };
        let bfs = store.bfs(start, steps);
        let mut nodes: Vec<SourceNode> = bfs
            .dist
            .keys()
            .filter(|idx| **idx != start)
            .map(|idx| store.graph[*idx].clone())
            .collect();
        nodes.sort_by_key(|n| n.id);
        Ok(nodes)
    }

    async fn diocese_heatmap(&self) -> Result<Vec<HeatmapEntry>> {
        let store = self.read()?;
        let mut entries = BTreeMap::new();
        for idx in store.graph.node_indices() {
            let org = &store.graph[idx];
            if org.label != SourceLabel::Organisation
                || !org.is_public()
                || org.organisation_type().as_deref() != Some(DIOCESE)
            {
                continue;
            }
            let mut people = BTreeSet::new();
            let mut places = BTreeMap::new();
            for (_, other) in store.incident(idx) {
                let neighbor = &store.graph[other];
                match neighbor.label {
                    SourceLabel::Person => {
                        people.insert(neighbor.id);
                    }
                    SourceLabel::Spatial => {
                        if let Some((lat, lng)) = neighbor.coordinates() {
                            places.insert(
                                neighbor.id,
                                GeoPoint {
                                    id: neighbor.id,
                                    label: neighbor.display_label(),
                                    lat,
                                    lng,
                                },
                            );
                        }
                    }
                    _ => {}
                }
            }
            entries.insert(
                org.id,
                HeatmapEntry {
                    id: org.id,
                    label: org.display_label(),
                    count: people.len(),
                    locations: places.into_values().collect(),
                },
            );
        }
        Ok(entries.into_values().collect())
    }

    async fn node(&self, id: NodeId) -> Result<Option<SourceNode>> {
        let store = self.read()?;
        Ok(store.lookup(id).map(|idx| store.graph[idx].clone()))
    }
}

#[async_trait]
impl TaxonomyResolver for InMemoryGraphSource {
    async fn resolve(&self, term: &str) -> Result<Option<String>> {
        let store = self.read()?;
        let id = store
            .graph
            .node_weights()
            .filter(|n| n.label == SourceLabel::TaxonomyTerm)
            .find(|n| n.property_str("labelId").as_deref() == Some(term))
            .map(|n| n.id.to_string());
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_export;

    fn source() -> InMemoryGraphSource {
        InMemoryGraphSource::from_export(sample_export()).unwrap()
    }

    fn ids(nodes: &[SourceNode]) -> Vec<i64> {
        nodes.iter().map(|n| n.id.get()).collect()
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------

    #[test]
    fn test_from_export_rejects_duplicate_ids() {
        let export = GraphExport {
            nodes: vec![
                SourceNode::new(1, SourceLabel::Person),
                SourceNode::new(1, SourceLabel::Event),
            ],
            relationships: vec![],
        };
        assert!(InMemoryGraphSource::from_export(export).is_err());
    }

    #[test]
    fn test_from_export_rejects_dangling_relationship() {
        let export = GraphExport {
            nodes: vec![SourceNode::new(1, SourceLabel::Person)],
            relationships: vec![SourceRelationship::new(10, 1, 2, "knows")],
        };
        let err = InMemoryGraphSource::from_export(export).err().unwrap();
        assert!(err.to_string().contains("unknown node 2"));
    }

    #[test]
    fn test_load_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        std::fs::write(&path, serde_json::to_string(&sample_export()).unwrap()).unwrap();

        let loaded = InMemoryGraphSource::load_json(&path).unwrap();
        assert_eq!(loaded.node_count(), sample_export().nodes.len());
        assert_eq!(
            loaded.relationship_count(),
            sample_export().relationships.len()
        );
    }

    #[test]
    fn test_load_json_missing_file() {
        let err = InMemoryGraphSource::load_json(Path::new("/nonexistent/export.json"))
            .err()
            .unwrap();
        assert!(err.is_not_found());
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_count_public_ignores_private() {
        let source = source();
        let people = source.count_public(SourceLabel::Person).await.unwrap();
        let total_people = sample_export()
            .nodes
            .iter()
            .filter(|n| n.label == SourceLabel::Person)
            .count() as u64;
        assert!(people < total_people, "fixture has a private person");
    }

    #[tokio::test]
    async fn test_count_changes_after_insert() {
        let source = source();
        let before = source.count_public(SourceLabel::Resource).await.unwrap();
        source
            .add_node(SourceNode::public(999, SourceLabel::Resource, "New"))
            .unwrap();
        let after = source.count_public(SourceLabel::Resource).await.unwrap();
        assert_eq!(after, before + 1);
    }

    #[tokio::test]
    async fn test_neighbor_rows_only_public_visualizable() {
        let rows = source().neighbor_rows().await.unwrap();
        assert!(!rows.is_empty());
        for row in &rows {
            assert!(row.node.is_public());
            assert!(row.node.label.is_visualizable());
            let touches = row.relationship.start == row.node.id || row.relationship.end == row.node.id;
            assert!(touches);
        }
    }

    #[tokio::test]
    async fn test_neighbor_rows_include_non_visualizable_neighbors() {
        let rows = source().neighbor_rows().await.unwrap();
        assert!(rows.iter().any(|r| r.neighbor.label == SourceLabel::Spatial));
    }

    #[tokio::test]
    async fn test_related_nodes_by_steps() {
        let source = source();
        let one = source.related_nodes(NodeId::new(1), 1).await.unwrap();
        let two = source.related_nodes(NodeId::new(1), 2).await.unwrap();
        assert!(!one.is_empty());
        assert!(two.len() >= one.len());
        assert!(!ids(&two).contains(&1));
        let mut sorted = ids(&two);
        sorted.sort();
        assert_eq!(ids(&two), sorted);
    }

    #[tokio::test]
    async fn test_related_nodes_unknown_start() {
        let nodes = source().related_nodes(NodeId::new(-1), 3).await.unwrap();
        assert!(nodes.is_empty());
    }

    #[tokio::test]
    async fn test_shortest_paths_diamond() {
        // 1 - 2 - 4 and 1 - 3 - 4: two shortest paths of two hops.
        let export = GraphExport {
            nodes: (1..=4)
                .map(|i| SourceNode::public(i, SourceLabel::Person, &format!("P{i}")))
                .collect(),
            relationships: vec![
                SourceRelationship::new(10, 1, 2, "knows"),
                SourceRelationship::new(11, 4, 2, "knows"),
                SourceRelationship::new(12, 1, 3, "knows"),
                SourceRelationship::new(13, 3, 4, "knows"),
            ],
        };
        let source = InMemoryGraphSource::from_export(export).unwrap();
        let paths = source
            .all_shortest_paths(NodeId::new(1), NodeId::new(4), 6, 25)
            .await
            .unwrap();
        assert_eq!(paths.len(), 2);
        for path in &paths {
            assert_eq!(path.len(), 2);
            assert_eq!(path.nodes.first().unwrap().id, NodeId::new(1));
            assert_eq!(path.nodes.last().unwrap().id, NodeId::new(4));
        }
    }

    #[tokio::test]
    async fn test_shortest_paths_respects_limit_and_bound() {
        let export = GraphExport {
            nodes: (1..=4)
                .map(|i| SourceNode::public(i, SourceLabel::Person, &format!("P{i}")))
                .collect(),
            relationships: vec![
                SourceRelationship::new(10, 1, 2, "knows"),
                SourceRelationship::new(11, 2, 3, "knows"),
                SourceRelationship::new(12, 3, 4, "knows"),
                SourceRelationship::new(13, 1, 2, "teaches"),
            ],
        };
        let source = InMemoryGraphSource::from_export(export).unwrap();

        let paths = source
            .all_shortest_paths(NodeId::new(1), NodeId::new(4), 6, 25)
            .await
            .unwrap();
        // Parallel relationships between 1 and 2 give two distinct paths.
        assert_eq!(paths.len(), 2);

        let limited = source
            .all_shortest_paths(NodeId::new(1), NodeId::new(4), 6, 1)
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);

        let too_short = source
            .all_shortest_paths(NodeId::new(1), NodeId::new(4), 2, 25)
            .await
            .unwrap();
        assert!(too_short.is_empty());
    }

    #[tokio::test]
    async fn test_shortest_paths_same_node_is_empty() {
        let paths = source()
            .all_shortest_paths(NodeId::new(1), NodeId::new(1), 6, 25)
            .await
            .unwrap();
        assert!(paths.is_empty());
    }

    #[tokio::test]
    async fn test_diocese_heatmap() {
        let entries = source().diocese_heatmap().await.unwrap();
        assert_eq!(entries.len(), 1);
        let diocese = &entries[0];
        assert!(diocese.count >= 1);
        assert_eq!(diocese.locations.len(), 1);
    }

    #[tokio::test]
    async fn test_taxonomy_resolution() {
        let source = source();
        let id = source.resolve("Classpiece").await.unwrap();
        assert!(id.is_some());
        assert_eq!(source.resolve("Unknown").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_property_changes_visibility() {
        let source = source();
        let before = source.count_public(SourceLabel::Event).await.unwrap();
        source
            .set_property(NodeId::new(30), "status", "private")
            .unwrap();
        let after = source.count_public(SourceLabel::Event).await.unwrap();
        assert_eq!(after + 1, before);
    }

    #[test]
    fn test_set_property_unknown_node() {
        let err = source()
            .set_property(NodeId::new(-5), "status", "public")
            .unwrap_err();
        assert!(err.is_not_found());
    }
}

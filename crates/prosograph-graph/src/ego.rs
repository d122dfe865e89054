//! Ego networks over the cached snapshot.
//!
//! A pure filter over already laid-out data: no source queries and no
//! further layout. Coordinates are returned as stored.

use std::collections::HashSet;
use std::sync::Arc;

use prosograph_core::{Error, Result};

use crate::persistence::SnapshotRepository;
use crate::query::EgoNetwork;
use crate::types::{NodeId, Snapshot};

/// Select `id` and its direct neighbours from `snapshot`.
///
/// The focal node comes first with its size forced to `focused_size`;
/// neighbours follow in snapshot order. Only links touching `id` are
/// returned.
pub fn ego_network(snapshot: &Snapshot, id: NodeId, focused_size: f64) -> Result<EgoNetwork> {
    let mut focal = snapshot
        .node(id)
        .cloned()
        .ok_or_else(|| Error::not_found(format!("node {id} is not in the graph network")))?;
    focal.size = focused_size;

    let links: Vec<_> = snapshot
        .links
        .iter()
        .filter(|link| link.touches(id))
        .cloned()
        .collect();
    let neighbours: HashSet<NodeId> = links
        .iter()
        .filter_map(|link| link.other_end(id))
        .filter(|&other| other != id)
        .collect();

    let mut nodes = Vec::with_capacity(neighbours.len() + 1);
    nodes.push(focal);
    nodes.extend(
        snapshot
            .nodes
            .iter()
            .filter(|n| neighbours.contains(&n.id))
            .cloned(),
    );

    Ok(EgoNetwork { nodes, links })
}

/// Serves ego networks from the current snapshot.
pub struct EgoNetworkService {
    repository: Arc<dyn SnapshotRepository>,
    focused_size: f64,
}

impl EgoNetworkService {
    /// Create a service reading from `repository`.
    pub fn new(repository: Arc<dyn SnapshotRepository>, focused_size: f64) -> Self {
        Self {
            repository,
            focused_size,
        }
    }

    /// Ego network of `id`.
    ///
    /// # Errors
    ///
    /// `NotFound` when no snapshot has been built yet or the node is not
    /// part of it.
    pub async fn ego_network(&self, id: NodeId) -> Result<EgoNetwork> {
        let snapshot = self
            .repository
            .read()
            .await
            .ok_or_else(|| Error::not_found("graph network has not been built yet"))?;
        ego_network(&snapshot, id, self.focused_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemorySnapshotRepository;
    use crate::types::{EdgeRecord, NodeKind, NodeRecord, RelationId, SnapshotStatistics};
    use chrono::Utc;

    fn node(id: i64, x: f64) -> NodeRecord {
        NodeRecord {
            id: NodeId::new(id),
            label: format!("N{id}"),
            kind: NodeKind::Person,
            color: "#5dc910".into(),
            stroke_color: "#519b1b".into(),
            size: 5.0,
            count: 0,
            x: Some(x),
            y: Some(0.0),
        }
    }

    fn link(id: i64, s: i64, t: i64) -> EdgeRecord {
        EdgeRecord {
            ref_id: RelationId::new(id),
            source: NodeId::new(s),
            target: NodeId::new(t),
            label: "rel".into(),
        }
    }

    /// 123 has exactly three links: to 1, 2 (incoming) and 3.
    fn snapshot() -> Snapshot {
        Snapshot {
            nodes: vec![
                node(1, 10.0),
                node(123, 0.0),
                node(2, 20.0),
                node(3, 30.0),
                node(4, 40.0),
            ],
            links: vec![
                link(900, 123, 1),
                link(901, 2, 123),
                link(902, 123, 3),
                link(903, 3, 4),
            ],
            statistics: SnapshotStatistics::default(),
            updated_at: Utc::now(),
        }
    }

    // ------------------------------------------------------------------------
    // Pure selection
    // ------------------------------------------------------------------------

    #[test]
    fn test_three_links_give_four_nodes() {
        let ego = ego_network(&snapshot(), NodeId::new(123), 25.0).unwrap();
        assert_eq!(ego.nodes.len(), 4);
        assert_eq!(ego.links.len(), 3);
        assert_eq!(ego.nodes[0].id, NodeId::new(123));
        assert_eq!(ego.nodes[0].size, 25.0);
        assert!(ego.links.iter().all(|l| l.touches(NodeId::new(123))));
    }

    #[test]
    fn test_every_neighbour_has_a_link_to_focal() {
        let focal = NodeId::new(123);
        let ego = ego_network(&snapshot(), focal, 25.0).unwrap();
        assert_eq!(ego.nodes.iter().filter(|n| n.id == focal).count(), 1);
        for n in ego.nodes.iter().skip(1) {
            assert!(
                ego.links
                    .iter()
                    .any(|l| l.touches(focal) && l.touches(n.id))
            );
        }
    }

    #[test]
    fn test_coordinates_and_neighbour_sizes_untouched() {
        let ego = ego_network(&snapshot(), NodeId::new(123), 25.0).unwrap();
        let three = ego.nodes.iter().find(|n| n.id == NodeId::new(3)).unwrap();
        assert_eq!(three.x, Some(30.0));
        assert_eq!(three.size, 5.0);
    }

    #[test]
    fn test_isolated_node() {
        let mut snap = snapshot();
        snap.nodes.push(node(77, 0.0));
        let ego = ego_network(&snap, NodeId::new(77), 25.0).unwrap();
        assert_eq!(ego.nodes.len(), 1);
        assert!(ego.links.is_empty());
    }

    #[test]
    fn test_unknown_node() {
        let err = ego_network(&snapshot(), NodeId::new(999), 25.0).unwrap_err();
        assert!(err.is_not_found());
    }

    // ------------------------------------------------------------------------
    // Service
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_service_reads_snapshot() {
        let repo = Arc::new(MemorySnapshotRepository::with_snapshot(snapshot()));
        let service = EgoNetworkService::new(repo, 25.0);
        let ego = service.ego_network(NodeId::new(3)).await.unwrap();
        let ids: Vec<i64> = ego.nodes.iter().map(|n| n.id.get()).collect();
        assert_eq!(ids, vec![3, 123, 4]);
    }

    #[tokio::test]
    async fn test_service_without_snapshot() {
        let service = EgoNetworkService::new(Arc::new(MemorySnapshotRepository::new()), 25.0);
        let err = service.ego_network(NodeId::new(1)).await.unwrap_err();
        assert!(err.is_not_found());
    }
}

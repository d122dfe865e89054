//! Abstractions over the property-graph store.
//!
//! The engine only talks to the store through [`GraphSource`] and
//! [`TaxonomyResolver`], so the backing store can be swapped without
//! touching extraction, path finding or layout.

use async_trait::async_trait;
use std::collections::HashMap;

use prosograph_core::Result;

use crate::types::{HeatmapEntry, NeighborRow, NodeId, SourceLabel, SourceNode, SourcePath};

/// Read access to the property-graph store.
///
/// Every failure of the underlying store must surface as
/// [`prosograph_core::Error::DataSource`].
#[async_trait]
pub trait GraphSource: Send + Sync {
    /// Number of public nodes carrying `label`.
    async fn count_public(&self, label: SourceLabel) -> Result<u64>;

    /// One row per relationship touching a public Event, Organisation,
    /// Person or Resource node, paired with the node at the other end
    /// regardless of its label or visibility.
    async fn neighbor_rows(&self) -> Result<Vec<NeighborRow>>;

    /// All shortest paths between two nodes of at most `max_hops` hops,
    /// ignoring relationship direction, at most `limit` of them.
    ///
    /// Returns an empty list when no such path exists.
    async fn all_shortest_paths(
        &self,
        source: NodeId,
        target: NodeId,
        max_hops: usize,
        limit: usize,
    ) -> Result<Vec<SourcePath>>;

    /// Distinct nodes reachable from `id` within `steps` hops, excluding
    /// `id` itself.
    async fn related_nodes(&self, id: NodeId, steps: usize) -> Result<Vec<SourceNode>>;

    /// Diocese organisations with their linked people and places.
    async fn diocese_heatmap(&self) -> Result<Vec<HeatmapEntry>>;

    /// Look up a single node.
    async fn node(&self, id: NodeId) -> Result<Option<SourceNode>>;
}

/// Resolves symbolic taxonomy terms to store identifiers.
#[async_trait]
pub trait TaxonomyResolver: Send + Sync {
    /// Current id of `term`, or `None` if the term is unknown.
    async fn resolve(&self, term: &str) -> Result<Option<String>>;
}

/// Resolver backed by a fixed term table.
#[derive(Clone, Debug, Default)]
pub struct StaticTaxonomyResolver {
    terms: HashMap<String, String>,
}

impl StaticTaxonomyResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: map `term` to `id`.
    pub fn with_term(mut self, term: impl Into<String>, id: impl Into<String>) -> Self {
        self.terms.insert(term.into(), id.into());
        self
    }
}

#[async_trait]
impl TaxonomyResolver for StaticTaxonomyResolver {
    async fn resolve(&self, term: &str) -> Result<Option<String>> {
        Ok(self.terms.get(term).cloned())
    }
}

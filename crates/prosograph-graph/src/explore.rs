//! Exploratory queries against the live graph source: multi-hop
//! neighbourhoods and the diocese heatmap.

use std::sync::Arc;

use prosograph_core::{Error, Result};

use crate::query::check_steps;
use crate::source::{GraphSource, TaxonomyResolver};
use crate::style::{Classifier, NodeStyle};
use crate::types::{HeatmapEntry, NodeId, NodeView};

/// Serves related-node listings and the heatmap.
pub struct ExploreService {
    source: Arc<dyn GraphSource>,
    resolver: Arc<dyn TaxonomyResolver>,
    style: NodeStyle,
}

impl ExploreService {
    /// Create the service.
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

    /// Distinct nodes within `steps` hops of `id`, ordered by id.
    ///
    /// # Errors
    ///
    /// `InvalidData` for `steps` outside `1..=6`, `NotFound` for an unknown
    /// node, `DataSource` on query failure.
    pub async fn related_nodes(&self, id: NodeId, steps: usize) -> Result<Vec<NodeView>> {
        let steps = check_steps(steps)?;
        if self.source.node(id).await?.is_none() {
            return Err(Error::not_found(format!("node {id} does not exist")));
        }
        let classifier = Classifier::resolve(self.resolver.as_ref(), self.style.clone()).await?;
        let nodes = self.source.related_nodes(id, steps).await?;
        Ok(nodes.iter().map(|n| classifier.view(n)).collect())
    }

    /// Person counts and locations per diocese.
    pub async fn heatmap(&self) -> Result<Vec<HeatmapEntry>> {
        self.source.diocese_heatmap().await
    }
}

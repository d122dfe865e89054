//! Shortest paths against the live graph source.
//!
//! Paths bypass the snapshot: they reflect current data and may cross
//! node types the visualization leaves out (places, dates, taxonomy
//! terms). Every hop is annotated with classified node views so that
//! Classpiece resources read the same here as in the network.

use std::sync::Arc;

use prosograph_core::{Error, Result};

use crate::query::check_steps;
use crate::source::{GraphSource, TaxonomyResolver};
use crate::style::{Classifier, NodeStyle};
use crate::types::{NodeId, Path, Segment, SourcePath};

/// Maximum number of paths returned per query.
pub const MAX_PATHS: usize = 25;

/// Finds and annotates shortest paths between two nodes.
pub struct PathFinder {
    source: Arc<dyn GraphSource>,
    resolver: Arc<dyn TaxonomyResolver>,
    style: NodeStyle,
}

impl PathFinder {
    /// Create a path finder.
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

    /// All shortest paths from `source` to `target` of at most `max_hops`
    /// hops, at most [`MAX_PATHS`] of them, ordered by hop count.
    ///
    /// No path within the bound is an empty list, not an error.
    ///
    /// # Errors
    ///
    /// - `InvalidData` if `max_hops` is outside `1..=6`
    /// - `NotFound` if either endpoint does not exist
    /// - `DataSource` if a source query fails
    pub async fn shortest_paths(
        &self,
        source: NodeId,
        target: NodeId,
        max_hops: usize,
    ) -> Result<Vec<Path>> {
        let max_hops = check_steps(max_hops)?;
        for id in [source, target] {
            if self.source.node(id).await?.is_none() {
                return Err(Error::not_found(format!("node {id} does not exist")));
            }
        }

        let classifier = Classifier::resolve(self.resolver.as_ref(), self.style.clone()).await?;
        let raw = self
            .source
            .all_shortest_paths(source, target, max_hops, MAX_PATHS)
            .await?;

        let mut paths = raw
            .into_iter()
            .map(|p| annotate(p, &classifier))
            .collect::<Result<Vec<_>>>()?;
        paths.sort_by_key(Path::hops);
        paths.truncate(MAX_PATHS);

        log::debug!(
            "Found {} path(s) from {source} to {target} within {max_hops} hops",
            paths.len()
        );
        Ok(paths)
    }
}

/// Split a raw path into classified segments.
fn annotate(path: SourcePath, classifier: &Classifier) -> Result<Path> {
    if path.nodes.len() != path.relationships.len() + 1 {
        return Err(Error::data_source(format!(
            "malformed path: {} nodes for {} relationships",
            path.nodes.len(),
            path.relationships.len()
        )));
    }
    let (Some(first), Some(last)) = (path.nodes.first(), path.nodes.last()) else {
        return Err(Error::data_source("malformed path: no nodes"));
    };

    let segments = path
        .relationships
        .iter()
        .enumerate()
        .map(|(i, rel)| Segment {
            source: classifier.view(&path.nodes[i]),
            relationship: rel.clone(),
            target: classifier.view(&path.nodes[i + 1]),
        })
        .collect();

    Ok(Path {
        source: classifier.view(first),
        target: classifier.view(last),
        segments,
    })
}

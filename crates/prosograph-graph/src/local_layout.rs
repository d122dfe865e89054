//! Interactive re-layout of a small, caller-supplied subgraph.

use std::time::Instant;

use prosograph_core::Result;

use crate::layout::{LayoutParams, LayoutSimulator, LocalLayoutParams};
use crate::query::{LocalLayoutRequest, LocalLayoutResult};
use crate::types::{EdgeRecord, NodeRecord};

/// Stateless re-layout around a caller-chosen centre.
///
/// Uses stronger repulsion than the full layout and a hard tick cap so a
/// request finishes in bounded time.
#[derive(Clone, Debug, Default)]
pub struct LocalLayoutService {
    simulator: LayoutSimulator,
}

impl LocalLayoutService {
    /// Create a service from the full-layout parameters and local overrides.
    pub fn new(base: &LayoutParams, local: &LocalLayoutParams) -> Self {
        Self {
            simulator: LayoutSimulator::new(local.apply(base)),
        }
    }

    /// Lay out `nodes`, pinning the first at `center`.
    pub fn relayout(
        &self,
        nodes: Vec<NodeRecord>,
        links: Vec<EdgeRecord>,
        center: (f64, f64),
    ) -> Result<LocalLayoutResult> {
        let started = Instant::now();
        let nodes = self.simulator.simulate_around(nodes, &links, center)?;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        log::debug!("Local layout of {} nodes took {elapsed_ms}ms", nodes.len());
        Ok(LocalLayoutResult {
            nodes,
            links,
            elapsed_ms,
        })
    }

    /// [`relayout`](Self::relayout) for a deserialized request.
    pub fn handle(&self, request: LocalLayoutRequest) -> Result<LocalLayoutResult> {
        self.relayout(
            request.nodes,
            request.links,
            (request.center_x, request.center_y),
        )
    }

    /// Effective simulation parameters.
    pub fn params(&self) -> &LayoutParams {
        self.simulator.params()
    }
}

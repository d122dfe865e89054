//! Force-directed layout.
//!
//! [`LayoutSimulator`] assigns 2D coordinates to extracted nodes by running
//! a [`Simulation`] with four forces (link, many-body, center, collide)
//! for a fixed, analytically derived number of ticks. The first node is
//! pinned at the layout centre. Given the same nodes, links and
//! parameters the output is bit-identical.

pub mod forces;
pub mod params;
pub mod quadtree;
pub mod simulation;

use std::collections::HashMap;

use prosograph_core::{Error, Result};

use crate::types::{EdgeRecord, NodeId, NodeRecord};

pub use forces::{CenterForce, CollideForce, Force, LinkForce, ManyBodyForce};
pub use params::{LayoutParams, LocalLayoutParams, TICK_CEILING};
pub use simulation::{Body, ForceSimulation, Lcg, Simulation, phyllotaxis};

/// Runs the layout simulation over extracted graphs.
#[derive(Clone, Debug, Default)]
pub struct LayoutSimulator {
    params: LayoutParams,
}

impl LayoutSimulator {
    /// Create a simulator with the given parameters.
    pub fn new(params: LayoutParams) -> Self {
        Self { params }
    }

    /// The simulation parameters.
    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    /// Lay out `nodes`, pinning the first one at the origin.
    pub fn simulate(&self, nodes: Vec<NodeRecord>, links: &[EdgeRecord]) -> Result<Vec<NodeRecord>> {
        self.simulate_around(nodes, links, (0.0, 0.0))
    }

    /// Lay out `nodes`, pinning the first one at `center`.
    ///
    /// Nodes that already carry coordinates start from them; the rest are
    /// placed on a spiral around `center`. Links must reference nodes in
    /// `nodes`.
    pub fn simulate_around(
        &self,
        mut nodes: Vec<NodeRecord>,
        links: &[EdgeRecord],
        center: (f64, f64),
    ) -> Result<Vec<NodeRecord>> {
        if nodes.is_empty() {
            return Err(Error::empty_graph("cannot lay out a graph without nodes"));
        }
        self.params.validate()?;

        let index: HashMap<NodeId, usize> =
            nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
        let pairs = links
            .iter()
            .map(|link| {
                let source = index.get(&link.source);
                let target = index.get(&link.target);
                match (source, target) {
                    (Some(&s), Some(&t)) => Ok((s, t)),
                    _ => Err(Error::invalid_data(format!(
                        "link {} references a node outside the graph",
                        link.ref_id
                    ))),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let (cx, cy) = center;
        let mut bodies: Vec<Body> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let (x, y) = match (node.x, node.y) {
                    (Some(x), Some(y)) if x.is_finite() && y.is_finite() => (x, y),
                    _ => phyllotaxis(i, cx, cy),
                };
                Body::at(x, y, node.size + self.params.collide_padding)
            })
            .collect();
        bodies[0].pin(cx, cy);

        let p = &self.params;
        let mut sim = Simulation::new(bodies, p.alpha_decay, p.velocity_decay);
        sim.add_force(Box::new(LinkForce::new(
            pairs,
            nodes.len(),
            p.link_distance,
            p.link_strength,
            p.link_iterations,
        )));
        sim.add_force(Box::new(ManyBodyForce::new(
            p.charge_strength,
            p.charge_theta,
            p.charge_distance_min,
            p.charge_distance_max,
        )));
        sim.add_force(Box::new(CenterForce::new(cx, cy, p.center_strength)));
        sim.add_force(Box::new(CollideForce::new(
            p.collide_strength,
            p.collide_iterations,
        )));

        let ticks = p.tick_count();
        sim.run(ticks);
        log::debug!(
            "Layout of {} nodes and {} links finished after {ticks} ticks",
            nodes.len(),
            links.len()
        );

        for (node, body) in nodes.iter_mut().zip(sim.into_bodies()) {
            node.x = Some(body.x);
            node.y = Some(body.y);
        }
        Ok(nodes)
    }
}

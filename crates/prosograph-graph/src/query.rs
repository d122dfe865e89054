//! Query response types for graph operations.
//!
//! These are the shapes returned by the ego-network, local layout and
//! exploration services, and accepted by the local layout endpoint. All
//! types derive `Serialize`/`Deserialize` with the UI's camelCase names.

use serde::{Deserialize, Serialize};

use prosograph_core::{Error, Result};

use crate::types::{EdgeRecord, NodeRecord};

/// Smallest accepted hop bound for multi-hop queries.
pub const MIN_STEPS: usize = 1;

/// Largest accepted hop bound for multi-hop queries.
pub const MAX_STEPS: usize = 6;

/// Check that a hop bound lies in `MIN_STEPS..=MAX_STEPS`.
pub fn check_steps(steps: usize) -> Result<usize> {
    if (MIN_STEPS..=MAX_STEPS).contains(&steps) {
        Ok(steps)
    } else {
        Err(Error::invalid_data(format!(
            "step must be between {MIN_STEPS} and {MAX_STEPS}, got {steps}"
        )))
    }
}

// ============================================================================
// Ego network
// ============================================================================

/// A node together with its directly linked neighbours.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EgoNetwork {
    /// The focal node first, then its neighbours.
    pub nodes: Vec<NodeRecord>,
    /// Links touching the focal node.
    pub links: Vec<EdgeRecord>,
}

// ============================================================================
// Local layout
// ============================================================================

/// Request body for an interactive re-layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalLayoutRequest {
    /// Nodes to lay out; the first is pinned at the centre.
    pub nodes: Vec<NodeRecord>,
    /// Links between them.
    #[serde(default)]
    pub links: Vec<EdgeRecord>,
    /// Centre x.
    #[serde(default)]
    pub center_x: f64,
    /// Centre y.
    #[serde(default)]
    pub center_y: f64,
}

/// Result of an interactive re-layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalLayoutResult {
    /// Nodes with fresh coordinates.
    pub nodes: Vec<NodeRecord>,
    /// Links, unchanged.
    pub links: Vec<EdgeRecord>,
    /// Wall-clock time of the simulation.
    pub elapsed_ms: u64,
}

//! Knowledge-graph visualization engine for Prosograph.
//!
//! Turns the live property graph into a cached, force-directed 2D layout
//! and serves derived queries against it.
//!
//! # Rebuild path
//!
//! [`CacheGuard`] → [`GraphExtractor`] → [`LayoutSimulator`] →
//! [`SnapshotRepository`], serialised by [`RebuildPipeline`].
//!
//! # Read paths
//!
//! - [`EgoNetworkService`]: a node and its neighbours, from the snapshot
//! - [`PathFinder`]: shortest paths, from the live [`GraphSource`]
//! - [`ExploreService`]: multi-hop neighbourhoods and the diocese heatmap
//! - [`LocalLayoutService`]: stateless re-layout of a small subgraph
//!
//! # Features
//!
//! - `test-utils`: exposes [`fixtures`] (a sample archive and failing
//!   doubles) to downstream crates' tests

pub mod cache_guard;
pub mod ego;
pub mod engine;
pub mod explore;
pub mod extractor;
pub mod layout;
pub mod local_layout;
pub mod memory;
pub mod path_finder;
pub mod persistence;
pub mod pipeline;
pub mod query;
pub mod source;
pub mod stats;
pub mod style;
pub mod types;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;

// Re-exports
pub use cache_guard::{
    CacheGuard, FingerprintRepository, InMemoryFingerprintRepository, JsonFingerprintRepository,
};
pub use ego::{EgoNetworkService, ego_network};
pub use engine::{Engine, EngineSettings};
pub use explore::ExploreService;
pub use extractor::{ExtractedGraph, GraphExtractor, build_graph};
pub use layout::{LayoutParams, LayoutSimulator, LocalLayoutParams};
pub use local_layout::LocalLayoutService;
pub use memory::{GraphExport, InMemoryGraphSource};
pub use path_finder::{MAX_PATHS, PathFinder};
pub use persistence::{
    FileSnapshotRepository, MemorySnapshotRepository, SnapshotRepository, load_snapshot,
    save_snapshot,
};
pub use pipeline::{RebuildOutcome, RebuildPipeline};
pub use query::{EgoNetwork, LocalLayoutRequest, LocalLayoutResult, MAX_STEPS, MIN_STEPS};
pub use source::{GraphSource, StaticTaxonomyResolver, TaxonomyResolver};
pub use stats::{SnapshotStats, compute_stats};
pub use style::{Classifier, NodeStyle, Palette};
pub use types::{
    CountFingerprint, EdgeRecord, HeatmapEntry, NodeId, NodeKind, NodeRecord, NodeView, Path,
    RelationId, Segment, Snapshot, SnapshotStatistics, SourceLabel, SourceNode,
    SourceRelationship,
};
pub use validation::{ValidationIssue, ValidationResult, validate_snapshot};

// Re-export the shared error type
pub use prosograph_core::{Error, Result};

//! Test fixtures: a small prosopographical graph and failing doubles.
//!
//! Available to this crate's tests and, with the `test-utils` feature, to
//! downstream crates.

use async_trait::async_trait;

use prosograph_core::{Error, Result};

use crate::memory::{GraphExport, InMemoryGraphSource};
use crate::source::{GraphSource, TaxonomyResolver};
use crate::types::{
    HeatmapEntry, NeighborRow, NodeId, SourceLabel, SourceNode, SourcePath, SourceRelationship,
};

/// Id of the Classpiece taxonomy term in [`sample_export`].
pub const CLASSPIECE_TERM_ID: i64 = 100;

/// A small archive graph.
///
/// - People 1 and 2 (public) and 3 (private), all affiliated with the
///   Diocese of Cork (10).
/// - Person 1 took part in the ordination event 30, held at Maynooth (11).
/// - Resource 20 is a class photograph depicting 1 and 2; the depiction of
///   1 is stored in both directions.
/// - Resource 21 is a letter referencing Maynooth.
/// - Spatial 40 locates the diocese; Temporal 50 dates the event.
pub fn sample_export() -> GraphExport {
    let nodes = vec![
        SourceNode::public(1, SourceLabel::Person, "Fr. John Murphy"),
        SourceNode::public(2, SourceLabel::Person, "Br. Patrick Kelly"),
        SourceNode::new(3, SourceLabel::Person)
            .with_property("label", "Unnamed novice")
            .with_property("status", "private"),
        SourceNode::public(10, SourceLabel::Organisation, "Diocese of Cork")
            .with_property("organisationType", "Diocese"),
        SourceNode::public(11, SourceLabel::Organisation, "St Patrick's College, Maynooth")
            .with_property("organisationType", "Seminary"),
        SourceNode::public(20, SourceLabel::Resource, "Maynooth class of 1890")
            .with_property("systemType", CLASSPIECE_TERM_ID.to_string()),
        SourceNode::public(21, SourceLabel::Resource, "Letter to the Rector")
            .with_property("systemType", "5"),
        SourceNode::public(30, SourceLabel::Event, "Ordination 1890"),
        SourceNode::public(40, SourceLabel::Spatial, "Cork")
            .with_property("latitude", 51.8985)
            .with_property("longitude", -8.4756),
        SourceNode::public(50, SourceLabel::Temporal, "1890"),
        SourceNode::public(CLASSPIECE_TERM_ID, SourceLabel::TaxonomyTerm, "Classpiece")
            .with_property("labelId", "Classpiece"),
    ];
    let relationships = vec![
        SourceRelationship::new(200, 1, 10, "hasAffiliation"),
        SourceRelationship::new(201, 2, 10, "hasAffiliation"),
        SourceRelationship::new(202, 1, 30, "wasParticipantIn"),
        SourceRelationship::new(203, 30, 11, "tookPlaceAt"),
        SourceRelationship::new(204, 1, 20, "isDepictedOn"),
        SourceRelationship::new(205, 2, 20, "isDepictedOn"),
        SourceRelationship::new(206, 20, 1, "depicts"),
        SourceRelationship::new(207, 10, 40, "hasLocation"),
        SourceRelationship::new(208, 30, 50, "hasTime"),
        SourceRelationship::new(209, 3, 10, "hasAffiliation"),
        SourceRelationship::new(210, 21, 11, "isReferencedIn"),
    ];
    GraphExport {
        nodes,
        relationships,
    }
}

/// [`sample_export`] loaded into an in-memory store.
pub fn sample_source() -> InMemoryGraphSource {
    match InMemoryGraphSource::from_export(sample_export()) {
        Ok(source) => source,
        Err(e) => panic!("sample export must load: {e}"),
    }
}

/// A graph source whose every query fails.
#[derive(Clone, Debug, Default)]
pub struct FailingGraphSource;

impl FailingGraphSource {
    fn fail<T>() -> Result<T> {
        Err(Error::data_source("connection refused"))
    }
}

#[async_trait]
impl GraphSource for FailingGraphSource {
    async fn count_public(&self, _label: SourceLabel) -> Result<u64> {
        Self::fail()
    }

    async fn neighbor_rows(&self) -> Result<Vec<NeighborRow>> {
        Self::fail()
    }

    async fn all_shortest_paths(
        &self,
        _source: NodeId,
        _target: NodeId,
        _max_hops: usize,
        _limit: usize,
    ) -> Result<Vec<SourcePath>> {
        Self::fail()
    }

    async fn related_nodes(&self, _id: NodeId, _steps: usize) -> Result<Vec<SourceNode>> {
        Self::fail()
    }

    async fn diocese_heatmap(&self) -> Result<Vec<HeatmapEntry>> {
        Self::fail()
    }

    async fn node(&self, _id: NodeId) -> Result<Option<SourceNode>> {
        Self::fail()
    }
}

#[async_trait]
impl TaxonomyResolver for FailingGraphSource {
    async fn resolve(&self, _term: &str) -> Result<Option<String>> {
        Self::fail()
    }
}

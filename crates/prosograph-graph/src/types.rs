//! Core data model for the knowledge graph and its cached layout.
//!
//! Two families of types live here:
//!
//! - Source types (`SourceNode`, `SourceRelationship`, `NeighborRow`,
//!   `SourcePath`) mirror what the property-graph store returns.
//! - Presentation types (`NodeRecord`, `EdgeRecord`, `Snapshot`, `Path`)
//!   are what the layout engine produces and the UI consumes. Their JSON
//!   field names are part of the snapshot file format.

use chrono::{DateTime, Utc};
use prosograph_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque node identifier.
///
/// Wraps the store's internal integer id. The snapshot format keeps it
/// numeric, so it serializes as a bare number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(i64);

impl NodeId {
    /// Wrap a raw store id.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw store id.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| Error::invalid_data(format!("'{s}' is not a valid node id")))
    }
}

/// Opaque relationship identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationId(i64);

impl RelationId {
    /// Wrap a raw store id.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw store id.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Labels and kinds
// ============================================================================

/// Node label as stored in the property graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceLabel {
    /// A dated occurrence.
    Event,
    /// A diocese, order, institution, ...
    Organisation,
    /// A person.
    Person,
    /// A document, image, or other archival resource.
    Resource,
    /// A time span.
    Temporal,
    /// A place.
    Spatial,
    /// A controlled-vocabulary term.
    TaxonomyTerm,
}

impl SourceLabel {
    /// Labels that take part in the full-graph visualization.
    pub const VISUALIZABLE: [SourceLabel; 4] = [
        SourceLabel::Event,
        SourceLabel::Organisation,
        SourceLabel::Person,
        SourceLabel::Resource,
    ];

    /// Whether nodes with this label appear in the cached layout.
    pub fn is_visualizable(self) -> bool {
        Self::VISUALIZABLE.contains(&self)
    }

    /// The label as written in the store.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Event => "Event",
            Self::Organisation => "Organisation",
            Self::Person => "Person",
            Self::Resource => "Resource",
            Self::Temporal => "Temporal",
            Self::Spatial => "Spatial",
            Self::TaxonomyTerm => "TaxonomyTerm",
        }
    }
}

impl fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display type of a node in the visualization.
///
/// Equal to the source label for visualizable nodes, except that some
/// Resources are reclassified as `Classpiece`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Event node.
    Event,
    /// Organisation node.
    Organisation,
    /// Person node.
    Person,
    /// Generic resource node.
    Resource,
    /// Class photograph resource.
    Classpiece,
}

impl NodeKind {
    /// Kind for a visualizable label, before any reclassification.
    pub fn from_label(label: SourceLabel) -> Option<Self> {
        match label {
            SourceLabel::Event => Some(Self::Event),
            SourceLabel::Organisation => Some(Self::Organisation),
            SourceLabel::Person => Some(Self::Person),
            SourceLabel::Resource => Some(Self::Resource),
            _ => None,
        }
    }

    /// The kind as written in the snapshot.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Event => "Event",
            Self::Organisation => "Organisation",
            Self::Person => "Person",
            Self::Resource => "Resource",
            Self::Classpiece => "Classpiece",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Source types
// ============================================================================

/// A node as returned by the graph source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceNode {
    /// Store id.
    pub id: NodeId,
    /// Store label.
    pub label: SourceLabel,
    /// Arbitrary key/value attributes.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl SourceNode {
    /// Create a node without properties.
    pub fn new(id: i64, label: SourceLabel) -> Self {
        Self {
            id: NodeId::new(id),
            label,
            properties: Map::new(),
        }
    }

    /// Create a public node with a display label.
    pub fn public(id: i64, label: SourceLabel, name: &str) -> Self {
        Self::new(id, label)
            .with_property("label", name)
            .with_property("status", "public")
    }

    /// Builder: set a property.
    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// String view of a property. Numbers are rendered in decimal.
    pub fn property_str(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Numeric view of a property. Numeric strings are parsed.
    pub fn property_f64(&self, key: &str) -> Option<f64> {
        match self.properties.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Visibility flag of the node; anything but `"public"` is private.
    pub fn visibility(&self) -> Visibility {
        match self.properties.get("status").and_then(Value::as_str) {
            Some("public") => Visibility::Public,
            _ => Visibility::Private,
        }
    }

    /// Whether the node is publicly visible.
    pub fn is_public(&self) -> bool {
        self.visibility() == Visibility::Public
    }

    /// Human-readable label: `label`, else `name`, else the id.
    pub fn display_label(&self) -> String {
        self.property_str("label")
            .or_else(|| self.property_str("name"))
            .unwrap_or_else(|| self.id.to_string())
    }

    /// The `systemType` taxonomy reference of a Resource.
    pub fn system_type(&self) -> Option<String> {
        self.property_str("systemType")
    }

    /// The `organisationType` of an Organisation, e.g. `"Diocese"`.
    pub fn organisation_type(&self) -> Option<String> {
        self.property_str("organisationType")
    }

    /// `(latitude, longitude)` of a Spatial node, when both are present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((
            self.property_f64("latitude")?,
            self.property_f64("longitude")?,
        ))
    }
}

/// Visibility flag carried by every entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Shown to anonymous users.
    Public,
    /// Hidden from the visualization.
    Private,
}

/// A directed, typed relationship as returned by the graph source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRelationship {
    /// Store id.
    pub id: RelationId,
    /// Start node.
    pub start: NodeId,
    /// End node.
    pub end: NodeId,
    /// Relationship type, e.g. `"hasAffiliation"`.
    #[serde(rename = "type")]
    pub rel_type: String,
}

impl SourceRelationship {
    /// Create a relationship.
    pub fn new(id: i64, start: i64, end: i64, rel_type: impl Into<String>) -> Self {
        Self {
            id: RelationId::new(id),
            start: NodeId::new(start),
            end: NodeId::new(end),
            rel_type: rel_type.into(),
        }
    }
}

/// One row of the neighbourhood query: a public visualizable node, one
/// relationship touching it, and the node at the other end.
#[derive(Clone, Debug, PartialEq)]
pub struct NeighborRow {
    /// The public, visualizable node the row was produced for.
    pub node: SourceNode,
    /// A relationship touching `node`, in either direction.
    pub relationship: SourceRelationship,
    /// The other endpoint, of any label or visibility.
    pub neighbor: SourceNode,
}

/// A path as returned by the graph source, in traversal order.
///
/// `nodes.len() == relationships.len() + 1`.
#[derive(Clone, Debug, PartialEq)]
pub struct SourcePath {
    /// Nodes from start to end.
    pub nodes: Vec<SourceNode>,
    /// Relationships between consecutive nodes.
    pub relationships: Vec<SourceRelationship>,
}

impl SourcePath {
    /// Number of hops.
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    /// Whether the path has no hops.
    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }
}

// ============================================================================
// Presentation types
// ============================================================================

/// A styled node of the visualization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Store id.
    pub id: NodeId,
    /// Display label.
    pub label: String,
    /// Display type.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Fill colour.
    pub color: String,
    /// Outline colour.
    pub stroke_color: String,
    /// Display size.
    pub size: f64,
    /// Number of incident links.
    pub count: u32,
    /// Layout x coordinate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Layout y coordinate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl NodeRecord {
    /// Whether the node has been laid out.
    pub fn has_position(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }
}

/// A deduplicated, undirected-unique link of the visualization.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    /// Id of the underlying relationship that was kept.
    pub ref_id: RelationId,
    /// Start node of the kept relationship.
    pub source: NodeId,
    /// End node of the kept relationship.
    pub target: NodeId,
    /// Relationship type.
    pub label: String,
}

impl EdgeRecord {
    /// Whether the link touches `id`.
    pub fn touches(&self, id: NodeId) -> bool {
        self.source == id || self.target == id
    }

    /// The endpoint opposite to `id`, if the link touches it.
    pub fn other_end(&self, id: NodeId) -> Option<NodeId> {
        if self.source == id {
            Some(self.target)
        } else if self.target == id {
            Some(self.source)
        } else {
            None
        }
    }

    /// Unordered endpoint pair, smallest id first.
    pub fn pair_key(&self) -> (NodeId, NodeId) {
        pair_key(self.source, self.target)
    }
}

/// Unordered pair key for two node ids.
pub fn pair_key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Timing diagnostics recorded with each snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStatistics {
    /// Time spent extracting the graph, in milliseconds.
    pub file_create_time_ms: u64,
    /// Time spent in the layout simulation, in milliseconds.
    pub simulation_time_ms: u64,
    /// Human-readable form of `file_create_time_ms`.
    pub file_create_time: String,
    /// Human-readable form of `simulation_time_ms`.
    pub simulation_time: String,
}

impl SnapshotStatistics {
    /// Build statistics from raw millisecond timings.
    pub fn new(file_create_time_ms: u64, simulation_time_ms: u64) -> Self {
        Self {
            file_create_time_ms,
            simulation_time_ms,
            file_create_time: format!("{file_create_time_ms}ms"),
            simulation_time: format!("{simulation_time_ms}ms"),
        }
    }
}

impl Default for SnapshotStatistics {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

/// The persisted, fully laid-out graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Laid-out nodes.
    pub nodes: Vec<NodeRecord>,
    /// Deduplicated links.
    pub links: Vec<EdgeRecord>,
    /// Build timings.
    pub statistics: SnapshotStatistics,
    /// When the snapshot was built.
    pub updated_at: DateTime<Utc>,
}

impl Snapshot {
    /// A snapshot without nodes, stamped now.
    pub fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            statistics: SnapshotStatistics::default(),
            updated_at: Utc::now(),
        }
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Whether the snapshot has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Per-type counts of public nodes, used as a cheap staleness check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountFingerprint {
    /// Public Event nodes.
    pub events: u64,
    /// Public Organisation nodes.
    pub organisations: u64,
    /// Public Person nodes.
    pub people: u64,
    /// Public Resource nodes.
    pub resources: u64,
}

/// A node as presented in path and neighbourhood answers.
///
/// Unlike [`NodeRecord`] it can represent any label, since live queries
/// may traverse Temporal, Spatial, or private nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    /// Store id.
    pub id: NodeId,
    /// Display label.
    pub label: String,
    /// Display type: the store label, or `"Classpiece"`.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Raw attributes.
    pub properties: Map<String, Value>,
}

/// One hop of a path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Node the hop leaves from (traversal order).
    pub source: NodeView,
    /// The relationship crossed, with its own stored direction.
    pub relationship: SourceRelationship,
    /// Node the hop arrives at.
    pub target: NodeView,
}

/// A shortest path between two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Path {
    /// First node of the path.
    pub source: NodeView,
    /// Last node of the path.
    pub target: NodeView,
    /// Hops in traversal order.
    pub segments: Vec<Segment>,
}

impl Path {
    /// Number of hops.
    pub fn hops(&self) -> usize {
        self.segments.len()
    }
}

/// A geographic point linked to an organisation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Spatial node id.
    pub id: NodeId,
    /// Place name.
    pub label: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

/// Heatmap row: a diocese, how many people link to it, and where it is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeatmapEntry {
    /// Organisation node id.
    pub id: NodeId,
    /// Organisation label.
    pub label: String,
    /// Distinct linked Person nodes.
    pub count: usize,
    /// Linked spatial points.
    pub locations: Vec<GeoPoint>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_parse() {
        assert_eq!("123".parse::<NodeId>().unwrap(), NodeId::new(123));
        assert_eq!(" 7 ".parse::<NodeId>().unwrap(), NodeId::new(7));
        assert!("abc".parse::<NodeId>().is_err());
        assert!("".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_node_id_serializes_as_number() {
        let json = serde_json::to_string(&NodeId::new(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_visualizable_labels() {
        assert!(SourceLabel::Person.is_visualizable());
        assert!(SourceLabel::Resource.is_visualizable());
        assert!(!SourceLabel::Spatial.is_visualizable());
        assert!(!SourceLabel::Temporal.is_visualizable());
        assert!(!SourceLabel::TaxonomyTerm.is_visualizable());
    }

    #[test]
    fn test_node_kind_from_label() {
        assert_eq!(
            NodeKind::from_label(SourceLabel::Event),
            Some(NodeKind::Event)
        );
        assert_eq!(NodeKind::from_label(SourceLabel::Spatial), None);
    }

    #[test]
    fn test_source_node_visibility() {
        let public = SourceNode::public(1, SourceLabel::Person, "Fr. Murphy");
        assert!(public.is_public());

        let private = SourceNode::new(2, SourceLabel::Person).with_property("status", "private");
        assert_eq!(private.visibility(), Visibility::Private);

        let unset = SourceNode::new(3, SourceLabel::Person);
        assert!(!unset.is_public());
    }

    #[test]
    fn test_source_node_display_label_fallbacks() {
        let labelled = SourceNode::public(1, SourceLabel::Person, "A");
        assert_eq!(labelled.display_label(), "A");

        let named = SourceNode::new(2, SourceLabel::Spatial).with_property("name", "Cork");
        assert_eq!(named.display_label(), "Cork");

        let bare = SourceNode::new(3, SourceLabel::Event);
        assert_eq!(bare.display_label(), "3");
    }

    #[test]
    fn test_system_type_accepts_numbers() {
        let node = SourceNode::new(1, SourceLabel::Resource).with_property("systemType", 87);
        assert_eq!(node.system_type(), Some("87".to_string()));
    }

    #[test]
    fn test_property_f64_parses_strings() {
        let node = SourceNode::new(1, SourceLabel::Spatial)
            .with_property("latitude", "53.38")
            .with_property("longitude", -6.59);
        assert_eq!(node.property_f64("latitude"), Some(53.38));
        assert_eq!(node.property_f64("longitude"), Some(-6.59));
        assert_eq!(node.property_f64("missing"), None);
        assert_eq!(node.coordinates(), Some((53.38, -6.59)));
    }

    #[test]
    fn test_edge_record_helpers() {
        let edge = EdgeRecord {
            ref_id: RelationId::new(9),
            source: NodeId::new(5),
            target: NodeId::new(2),
            label: "hasAffiliation".into(),
        };
        assert!(edge.touches(NodeId::new(5)));
        assert!(!edge.touches(NodeId::new(3)));
        assert_eq!(edge.other_end(NodeId::new(5)), Some(NodeId::new(2)));
        assert_eq!(edge.other_end(NodeId::new(3)), None);
        assert_eq!(edge.pair_key(), (NodeId::new(2), NodeId::new(5)));
    }

    #[test]
    fn test_node_record_json_field_names() {
        let node = NodeRecord {
            id: NodeId::new(1),
            label: "Maynooth".into(),
            kind: NodeKind::Organisation,
            color: "#9b8cf2".into(),
            stroke_color: "#5343b7".into(),
            size: 5.0,
            count: 0,
            x: None,
            y: None,
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "Organisation");
        assert_eq!(json["strokeColor"], "#5343b7");
        assert!(json.get("x").is_none());
    }

    #[test]
    fn test_snapshot_json_field_names() {
        let snapshot = Snapshot {
            nodes: vec![],
            links: vec![EdgeRecord {
                ref_id: RelationId::new(3),
                source: NodeId::new(1),
                target: NodeId::new(2),
                label: "r".into(),
            }],
            statistics: SnapshotStatistics::new(12, 340),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("updatedAt").is_some());
        assert_eq!(json["links"][0]["refId"], 3);
        assert_eq!(json["statistics"]["fileCreateTimeMs"], 12);
        assert_eq!(json["statistics"]["simulationTime"], "340ms");
    }

    #[test]
    fn test_source_relationship_type_field() {
        let rel = SourceRelationship::new(1, 2, 3, "isDepictedOn");
        let json = serde_json::to_value(&rel).unwrap();
        assert_eq!(json["type"], "isDepictedOn");
        assert_eq!(json["start"], 2);
    }
}

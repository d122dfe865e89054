//! Node classification and visual styling.
//!
//! [`Classifier`] applies the Classpiece rule (a Resource whose
//! `systemType` matches the resolved taxonomy id) and turns source nodes
//! into styled [`NodeRecord`]s or [`NodeView`]s. The same classifier is
//! shared by extraction, path finding and related-node listing so a node
//! looks the same wherever it appears.

use prosograph_core::Result;
use serde::{Deserialize, Serialize};

use crate::source::TaxonomyResolver;
use crate::types::{NodeKind, NodeRecord, NodeView, SourceLabel, SourceNode};

/// Taxonomy term identifying class photographs.
pub const CLASSPIECE_TERM: &str = "Classpiece";

/// Fill and outline colour of one node kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorPair {
    /// Fill colour.
    pub color: String,
    /// Outline colour.
    pub stroke_color: String,
}

impl ColorPair {
    /// Create a colour pair.
    pub fn new(color: &str, stroke_color: &str) -> Self {
        Self {
            color: color.to_string(),
            stroke_color: stroke_color.to_string(),
        }
    }
}

/// Colour per node kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Event colours.
    pub event: ColorPair,
    /// Organisation colours.
    pub organisation: ColorPair,
    /// Person colours.
    pub person: ColorPair,
    /// Resource colours.
    pub resource: ColorPair,
    /// Classpiece colours.
    pub classpiece: ColorPair,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            event: ColorPair::new("#f9cd1b", "#c9730a"),
            organisation: ColorPair::new("#9b8cf2", "#5343b7"),
            person: ColorPair::new("#5dc910", "#519b1b"),
            resource: ColorPair::new("#00cbff", "#0982a0"),
            classpiece: ColorPair::new("#1ed8bf", "#1e9dd8"),
        }
    }
}

impl Palette {
    /// Colours for a kind.
    pub fn colors(&self, kind: NodeKind) -> &ColorPair {
        match kind {
            NodeKind::Event => &self.event,
            NodeKind::Organisation => &self.organisation,
            NodeKind::Person => &self.person,
            NodeKind::Resource => &self.resource,
            NodeKind::Classpiece => &self.classpiece,
        }
    }
}

/// Size and colour settings for rendered nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeStyle {
    /// Size of a node without links.
    pub base_size: f64,
    /// Size added per incident link.
    pub per_edge_size: f64,
    /// Size of the focal node of an ego network.
    pub focused_size: f64,
    /// Colour table.
    pub palette: Palette,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            base_size: 5.0,
            per_edge_size: 0.2,
            focused_size: 25.0,
            palette: Palette::default(),
        }
    }
}

impl NodeStyle {
    /// `base + count * per_edge`.
    pub fn size_for(&self, count: u32) -> f64 {
        self.base_size + f64::from(count) * self.per_edge_size
    }
}

/// Classifies and styles source nodes.
#[derive(Clone, Debug, Default)]
pub struct Classifier {
    classpiece_id: Option<String>,
    style: NodeStyle,
}

impl Classifier {
    /// Create a classifier.
    ///
    /// `classpiece_id` is the resolved id of the Classpiece taxonomy term;
    /// `None` disables reclassification.
    pub fn new(classpiece_id: Option<String>, style: NodeStyle) -> Self {
        Self {
            classpiece_id,
            style,
        }
    }

    /// Resolve the Classpiece term through `resolver` and build a classifier.
    pub async fn resolve(resolver: &dyn TaxonomyResolver, style: NodeStyle) -> Result<Self> {
        let classpiece_id = resolver.resolve(CLASSPIECE_TERM).await?;
        if classpiece_id.is_none() {
            log::warn!("Taxonomy term '{CLASSPIECE_TERM}' not found, Classpiece nodes stay Resources");
        }
        Ok(Self::new(classpiece_id, style))
    }

    /// The resolved Classpiece id, if any.
    pub fn classpiece_id(&self) -> Option<&str> {
        self.classpiece_id.as_deref()
    }

    /// Style settings.
    pub fn style(&self) -> &NodeStyle {
        &self.style
    }

    /// Whether a node is a Resource tagged as a Classpiece.
    pub fn is_classpiece(&self, node: &SourceNode) -> bool {
        node.label == SourceLabel::Resource
            && match (&self.classpiece_id, node.system_type()) {
                (Some(expected), Some(actual)) => *expected == actual,
                _ => false,
            }
    }

    /// Display kind of a visualizable node; `None` for other labels.
    pub fn kind_of(&self, node: &SourceNode) -> Option<NodeKind> {
        if self.is_classpiece(node) {
            return Some(NodeKind::Classpiece);
        }
        NodeKind::from_label(node.label)
    }

    /// Display type name of any node.
    pub fn type_name(&self, node: &SourceNode) -> String {
        match self.kind_of(node) {
            Some(kind) => kind.as_str().to_string(),
            None => node.label.as_str().to_string(),
        }
    }

    /// Styled record of a visualizable node with `count` incident links.
    pub fn record(&self, node: &SourceNode, count: u32) -> Option<NodeRecord> {
        let kind = self.kind_of(node)?;
        let colors = self.style.palette.colors(kind);
        Some(NodeRecord {
            id: node.id,
            label: node.display_label(),
            kind,
            color: colors.color.clone(),
            stroke_color: colors.stroke_color.clone(),
            size: self.style.size_for(count),
            count,
            x: None,
            y: None,
        })
    }

    /// Presentation view of any node.
    pub fn view(&self, node: &SourceNode) -> NodeView {
        NodeView {
            id: node.id,
            label: node.display_label(),
            node_type: self.type_name(node),
            properties: node.properties.clone(),
        }
    }
}

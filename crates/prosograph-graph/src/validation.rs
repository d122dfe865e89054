//! Snapshot validation and integrity checking.
//!
//! Detects snapshots that break the network's invariants: duplicate
//! unordered pairs, self-loops, links to missing nodes, duplicate node
//! ids and nodes that were never laid out.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{EdgeRecord, NodeId, Snapshot};

// ============================================================================
// Types
// ============================================================================

/// Result of snapshot validation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the snapshot is valid (no errors).
    pub valid: bool,
    /// Issues that break consumers.
    pub errors: Vec<ValidationIssue>,
    /// Suspicious but usable.
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Create a new empty (valid) result.
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error (marks the snapshot invalid).
    pub fn add_error(&mut self, issue: ValidationIssue) {
        self.valid = false;
        self.errors.push(issue);
    }

    /// Add a warning.
    pub fn add_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Total issue count (errors + warnings).
    pub fn total_issues(&self) -> usize {
        self.errors.len() + self.warnings.len()
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// A validation issue found in a snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Issue code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Affected node ids.
    pub nodes: Vec<NodeId>,
    /// Affected links, as `refId: source -> target`.
    pub links: Vec<String>,
}

impl ValidationIssue {
    /// Create a new issue.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            nodes: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Attach affected nodes.
    pub fn with_nodes(mut self, nodes: Vec<NodeId>) -> Self {
        self.nodes = nodes;
        self
    }

    /// Attach affected links.
    pub fn with_links(mut self, links: Vec<String>) -> Self {
        self.links = links;
        self
    }
}

// ============================================================================
// Validation functions
// ============================================================================

/// Validate a snapshot.
///
/// Errors: duplicate node ids, dangling link endpoints, self-loops and
/// duplicate unordered pairs. Warnings: nodes without coordinates.
pub fn validate_snapshot(snapshot: &Snapshot) -> ValidationResult {
    let mut result = ValidationResult::new();

    check_duplicate_nodes(snapshot, &mut result);
    check_dangling_links(snapshot, &mut result);
    check_self_loops(snapshot, &mut result);
    check_duplicate_pairs(snapshot, &mut result);
    check_positions(snapshot, &mut result);

    result
}

fn describe(link: &EdgeRecord) -> String {
    format!("{}: {} -> {}", link.ref_id, link.source, link.target)
}

fn check_duplicate_nodes(snapshot: &Snapshot, result: &mut ValidationResult) {
    let mut seen = HashSet::new();
    let duplicates: Vec<NodeId> = snapshot
        .nodes
        .iter()
        .filter(|n| !seen.insert(n.id))
        .map(|n| n.id)
        .collect();

    if !duplicates.is_empty() {
        result.add_error(
            ValidationIssue::new(
                "DUPLICATE_NODES",
                format!("{} node id(s) appear more than once", duplicates.len()),
            )
            .with_nodes(duplicates),
        );
    }
}

fn check_dangling_links(snapshot: &Snapshot, result: &mut ValidationResult) {
    let ids: HashSet<NodeId> = snapshot.nodes.iter().map(|n| n.id).collect();
    let dangling: Vec<String> = snapshot
        .links
        .iter()
        .filter(|l| !ids.contains(&l.source) || !ids.contains(&l.target))
        .map(describe)
        .collect();

    if !dangling.is_empty() {
        result.add_error(
            ValidationIssue::new(
                "DANGLING_LINKS",
                format!("{} link(s) reference missing nodes", dangling.len()),
            )
            .with_links(dangling),
        );
    }
}

fn check_self_loops(snapshot: &Snapshot, result: &mut ValidationResult) {
    let loops: Vec<String> = snapshot
        .links
        .iter()
        .filter(|l| l.source == l.target)
        .map(describe)
        .collect();

    if !loops.is_empty() {
        result.add_error(
            ValidationIssue::new("SELF_LOOPS", format!("{} link(s) are self-loops", loops.len()))
                .with_links(loops),
        );
    }
}

fn check_duplicate_pairs(snapshot: &Snapshot, result: &mut ValidationResult) {
    let mut seen = HashSet::new();
    let duplicates: Vec<String> = snapshot
        .links
        .iter()
        .filter(|l| !seen.insert(l.pair_key()))
        .map(describe)
        .collect();

    if !duplicates.is_empty() {
        result.add_error(
            ValidationIssue::new(
                "DUPLICATE_PAIRS",
                format!("{} link(s) repeat an existing node pair", duplicates.len()),
            )
            .with_links(duplicates),
        );
    }
}

fn check_positions(snapshot: &Snapshot, result: &mut ValidationResult) {
    let unplaced: Vec<NodeId> = snapshot
        .nodes
        .iter()
        .filter(|n| !n.has_position())
        .map(|n| n.id)
        .collect();

    if !unplaced.is_empty() {
        result.add_warning(
            ValidationIssue::new(
                "MISSING_COORDINATES",
                format!("{} node(s) have no coordinates", unplaced.len()),
            )
            .with_nodes(unplaced),
        );
    }
}

// ============================================================================
// Tests
// ============================================================================

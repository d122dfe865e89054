//! Handler functions for graph CLI commands.
//!
//! `graph [build]` runs the rebuild pipeline; `validate`, `stats` and
//! `ego` read the stored snapshot only; `paths` and `related` query the
//! live graph export.

use std::path::Path;

use prosograph_core::traits::ConfigProvider;
use prosograph_core::{Error, Result};
use prosograph_graph::{
    Engine, EngineSettings, NodeId, RebuildOutcome, Snapshot, compute_stats, ego_network,
    load_snapshot, validate_snapshot,
};

// ============================================================================
// Option types
// ============================================================================

/// Options for `graph paths`.
#[derive(Debug, Clone, Copy)]
pub struct PathOptions {
    /// Start node.
    pub source: i64,
    /// End node.
    pub target: i64,
    /// Maximum number of hops.
    pub step: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// Rebuild the cached layout if the graph changed, or always when `force`.
pub async fn handle_build<C: ConfigProvider>(
    config: &C,
    settings: EngineSettings,
    force: bool,
) -> Result<RebuildOutcome> {
    let engine = Engine::from_config(config, settings)?;
    let outcome = engine.pipeline().run(force).await?;

    match &outcome {
        RebuildOutcome::Skipped => {
            println!("Graph unchanged; cached layout kept. Use --force to rebuild anyway.")
        }
        RebuildOutcome::Empty => println!("No visualizable nodes; wrote an empty graph network."),
        RebuildOutcome::Rebuilt {
            nodes,
            links,
            statistics,
        } => {
            println!("Graph network rebuilt:");
            println!("  Nodes:      {nodes}");
            println!("  Links:      {links}");
            println!("  Extraction: {}", statistics.file_create_time);
            println!("  Simulation: {}", statistics.simulation_time);
            println!("  Saved to:   {}", config.snapshot_path()?.display());
        }
    }
    Ok(outcome)
}

/// Validate the stored snapshot; fails if it has errors.
pub async fn handle_validate<C: ConfigProvider>(config: &C) -> Result<()> {
    let snapshot = load_snapshot_or_error(&config.snapshot_path()?)?;
    let result = validate_snapshot(&snapshot);

    if result.valid {
        println!("Graph network is valid.");
    } else {
        println!("Graph network has validation issues:");
    }

    for error in &result.errors {
        println!("  ERROR [{}]: {}", error.code, error.message);
        for node in &error.nodes {
            println!("    - node {node}");
        }
        for link in &error.links {
            println!("    - {link}");
        }
    }
    for warning in &result.warnings {
        println!("  WARN  [{}]: {}", warning.code, warning.message);
        for node in &warning.nodes {
            println!("    - node {node}");
        }
    }

    println!(
        "\nSummary: {} error(s), {} warning(s)",
        result.errors.len(),
        result.warnings.len()
    );

    if result.valid {
        Ok(())
    } else {
        Err(Error::operation(format!(
            "Graph network validation failed with {} error(s)",
            result.errors.len()
        )))
    }
}

/// Show statistics of the stored snapshot.
pub async fn handle_stats<C: ConfigProvider>(config: &C, top: usize) -> Result<()> {
    let snapshot = load_snapshot_or_error(&config.snapshot_path()?)?;
    let stats = compute_stats(&snapshot, top);

    println!("Graph Network Statistics");
    println!("========================");
    println!("Built:        {}", snapshot.updated_at.to_rfc3339());
    println!("Nodes:        {}", stats.node_count);
    println!("  Orphans:    {}", stats.orphan_count);
    println!("Links:        {}", stats.link_count);
    println!("Avg degree:   {:.2}", stats.avg_degree);
    println!("Extraction:   {}", snapshot.statistics.file_create_time);
    println!("Simulation:   {}", snapshot.statistics.simulation_time);

    if !stats.type_distribution.is_empty() {
        println!("\nTypes:");
        for (kind, count) in &stats.type_distribution {
            println!("  {kind}: {count}");
        }
    }

    if !stats.label_distribution.is_empty() {
        println!("\nRelationships:");
        let mut labels: Vec<_> = stats.label_distribution.iter().collect();
        labels.sort_by(|a, b| b.1.cmp(a.1));
        for (label, count) in labels {
            println!("  {label}: {count}");
        }
    }

    if !stats.top_nodes.is_empty() {
        println!("\nMost connected:");
        for (i, node) in stats.top_nodes.iter().enumerate() {
            println!("  {}. {} [{}] ({} links)", i + 1, node.label, node.id, node.degree);
        }
    }

    Ok(())
}

/// Show the ego network of `id` from the stored snapshot.
pub async fn handle_ego<C: ConfigProvider>(
    config: &C,
    settings: &EngineSettings,
    id: i64,
) -> Result<()> {
    let snapshot = load_snapshot_or_error(&config.snapshot_path()?)?;
    let network = ego_network(&snapshot, NodeId::new(id), settings.style.focused_size)?;

    let (focal, neighbours) = match network.nodes.split_first() {
        Some(split) => split,
        None => return Err(Error::not_found(format!("node {id}"))),
    };
    println!("{} [{}] ({})", focal.label, focal.id, focal.kind);
    if neighbours.is_empty() {
        println!("  (no linked nodes)");
    }
    for link in &network.links {
        let Some(other) = link.other_end(focal.id) else {
            continue;
        };
        let label = neighbours
            .iter()
            .find(|n| n.id == other)
            .map(|n| format!("{} ({})", n.label, n.kind))
            .unwrap_or_else(|| other.to_string());
        println!("  --[{}]-- {label} [{other}]", link.label);
    }
    println!("\n{} linked node(s)", neighbours.len());
    Ok(())
}

/// Show the shortest paths between two nodes of the live graph.
pub async fn handle_paths<C: ConfigProvider>(
    config: &C,
    settings: EngineSettings,
    options: PathOptions,
) -> Result<()> {
    let engine = Engine::from_config(config, settings)?;
    let paths = engine
        .paths()
        .shortest_paths(
            NodeId::new(options.source),
            NodeId::new(options.target),
            options.step,
        )
        .await?;

    if paths.is_empty() {
        println!(
            "No path from {} to {} within {} hop(s).",
            options.source, options.target, options.step
        );
        return Ok(());
    }

    for (i, path) in paths.iter().enumerate() {
        println!("Path {} ({} hops):", i + 1, path.hops());
        println!("  {} ({})", path.source.label, path.source.node_type);
        for segment in &path.segments {
            println!(
                "    --[{}]--> {} ({})",
                segment.relationship.rel_type, segment.target.label, segment.target.node_type
            );
        }
    }
    Ok(())
}

/// List the nodes within `step` hops of `id` in the live graph.
pub async fn handle_related<C: ConfigProvider>(
    config: &C,
    settings: EngineSettings,
    id: i64,
    step: usize,
) -> Result<()> {
    let engine = Engine::from_config(config, settings)?;
    let nodes = engine
        .explore()
        .related_nodes(NodeId::new(id), step)
        .await?;

    println!("Within {step} hop(s) of {id}:");
    if nodes.is_empty() {
        println!("  (no related nodes)");
    }
    for node in &nodes {
        println!("  - {} [{}] ({})", node.label, node.id, node.node_type);
    }
    println!("\n{} related node(s)", nodes.len());
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Load the snapshot, pointing at `graph build` when there is none.
fn load_snapshot_or_error(path: &Path) -> Result<Snapshot> {
    if !path.exists() {
        return Err(Error::not_found(format!(
            "no graph network at {}; run `prosograph graph` first",
            path.display()
        )));
    }
    load_snapshot(path)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use prosograph_graph::fixtures::sample_export;
    use prosograph_graph::save_snapshot;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[derive(Clone)]
    struct TestConfig {
        dir: PathBuf,
    }

    impl ConfigProvider for TestConfig {
        fn project_name(&self) -> &str {
            "test"
        }

        fn archive_dir(&self) -> Result<PathBuf> {
            Ok(self.dir.join("archive"))
        }

        fn source_path(&self) -> Result<PathBuf> {
            Ok(self.dir.join("export.json"))
        }
    }

    /// Write the sample export next to an empty archive.
    fn setup(dir: &std::path::Path) -> TestConfig {
        let json = serde_json::to_string(&sample_export()).unwrap();
        std::fs::write(dir.join("export.json"), json).unwrap();
        TestConfig {
            dir: dir.to_path_buf(),
        }
    }

    async fn built(dir: &std::path::Path) -> TestConfig {
        let config = setup(dir);
        handle_build(&config, EngineSettings::default(), false)
            .await
            .unwrap();
        config
    }

    // ------------------------------------------------------------------------
    // build
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_build_then_skip_then_force() {
        let dir = tempdir().unwrap();
        let config = setup(dir.path());
        let settings = EngineSettings::default();

        let first = handle_build(&config, settings.clone(), false).await.unwrap();
        assert!(matches!(first, RebuildOutcome::Rebuilt { nodes: 8, .. }));
        assert!(config.snapshot_path().unwrap().exists());

        let second = handle_build(&config, settings.clone(), false).await.unwrap();
        assert_eq!(second, RebuildOutcome::Skipped);

        let forced = handle_build(&config, settings, true).await.unwrap();
        assert!(forced.wrote_snapshot());
    }

    #[tokio::test]
    async fn test_build_without_export() {
        let dir = tempdir().unwrap();
        let config = TestConfig {
            dir: dir.path().to_path_buf(),
        };
        let err = handle_build(&config, EngineSettings::default(), false)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    // ------------------------------------------------------------------------
    // validate and stats
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_validate_built_snapshot() {
        let dir = tempdir().unwrap();
        let config = built(dir.path()).await;
        assert!(handle_validate(&config).await.is_ok());
    }

    #[tokio::test]
    async fn test_validate_reports_errors() {
        let dir = tempdir().unwrap();
        let config = built(dir.path()).await;
        let path = config.snapshot_path().unwrap();
        let mut snapshot = load_snapshot(&path).unwrap();
        let mut looped = snapshot.links[0].clone();
        looped.target = looped.source;
        snapshot.links.push(looped);
        save_snapshot(&path, &snapshot).unwrap();

        let err = handle_validate(&config).await.unwrap_err();
        assert!(err.to_string().contains("validation failed"));
    }

    #[tokio::test]
    async fn test_stats_and_validate_without_snapshot() {
        let dir = tempdir().unwrap();
        let config = setup(dir.path());
        assert!(handle_stats(&config, 5).await.unwrap_err().is_not_found());
        assert!(handle_validate(&config).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_stats() {
        let dir = tempdir().unwrap();
        let config = built(dir.path()).await;
        assert!(handle_stats(&config, 3).await.is_ok());
    }

    // ------------------------------------------------------------------------
    // ego, paths, related
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_ego() {
        let dir = tempdir().unwrap();
        let config = built(dir.path()).await;
        let settings = EngineSettings::default();
        assert!(handle_ego(&config, &settings, 1).await.is_ok());
        assert!(
            handle_ego(&config, &settings, 999)
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn test_paths() {
        let dir = tempdir().unwrap();
        let config = setup(dir.path());
        let found = PathOptions {
            source: 2,
            target: 30,
            step: 6,
        };
        assert!(
            handle_paths(&config, EngineSettings::default(), found)
                .await
                .is_ok()
        );

        let too_short = PathOptions { step: 1, ..found };
        assert!(
            handle_paths(&config, EngineSettings::default(), too_short)
                .await
                .is_ok()
        );

        let out_of_range = PathOptions { step: 0, ..found };
        assert!(
            handle_paths(&config, EngineSettings::default(), out_of_range)
                .await
                .unwrap_err()
                .is_invalid_input()
        );
    }

    #[tokio::test]
    async fn test_related() {
        let dir = tempdir().unwrap();
        let config = setup(dir.path());
        assert!(
            handle_related(&config, EngineSettings::default(), 2, 2)
                .await
                .is_ok()
        );
        assert!(
            handle_related(&config, EngineSettings::default(), 999, 1)
                .await
                .unwrap_err()
                .is_not_found()
        );
    }
}

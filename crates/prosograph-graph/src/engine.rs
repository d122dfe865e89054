//! Wiring of the services over shared seams.
//!
//! [`Engine`] owns one graph source, one taxonomy resolver and the two
//! repositories, and hands out the services built on them. It is cheap
//! to clone and is what the HTTP layer and CLI hold.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use prosograph_core::{ConfigProvider, Result};

use crate::cache_guard::{CacheGuard, FingerprintRepository, JsonFingerprintRepository};
use crate::ego::EgoNetworkService;
use crate::explore::ExploreService;
use crate::extractor::GraphExtractor;
use crate::layout::{LayoutParams, LayoutSimulator, LocalLayoutParams};
use crate::local_layout::LocalLayoutService;
use crate::memory::InMemoryGraphSource;
use crate::path_finder::PathFinder;
use crate::persistence::{FileSnapshotRepository, SnapshotRepository};
use crate::pipeline::RebuildPipeline;
use crate::source::{GraphSource, TaxonomyResolver};
use crate::style::NodeStyle;

/// Tunable behaviour of the engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Full-layout simulation parameters.
    pub layout: LayoutParams,
    /// Overrides for interactive re-layout.
    pub local_layout: LocalLayoutParams,
    /// Node sizes and colours.
    pub style: NodeStyle,
}

/// The assembled visualization engine.
#[derive(Clone)]
pub struct Engine {
    snapshots: Arc<dyn SnapshotRepository>,
    pipeline: Arc<RebuildPipeline>,
    ego: Arc<EgoNetworkService>,
    paths: Arc<PathFinder>,
    explore: Arc<ExploreService>,
    local_layout: LocalLayoutService,
}

impl Engine {
    /// Assemble an engine over explicit seams.
    pub fn new(
        source: Arc<dyn GraphSource>,
        resolver: Arc<dyn TaxonomyResolver>,
        snapshots: Arc<dyn SnapshotRepository>,
        fingerprints: Arc<dyn FingerprintRepository>,
        settings: EngineSettings,
    ) -> Self {
        let style = settings.style;
        let pipeline = RebuildPipeline::new(
            CacheGuard::new(source.clone(), fingerprints),
            GraphExtractor::new(source.clone(), resolver.clone(), style.clone()),
            LayoutSimulator::new(settings.layout.clone()),
            snapshots.clone(),
        );
        Self {
            ego: Arc::new(EgoNetworkService::new(snapshots.clone(), style.focused_size)),
            paths: Arc::new(PathFinder::new(
                source.clone(),
                resolver.clone(),
                style.clone(),
            )),
            explore: Arc::new(ExploreService::new(source, resolver, style)),
            local_layout: LocalLayoutService::new(&settings.layout, &settings.local_layout),
            pipeline: Arc::new(pipeline),
            snapshots,
        }
    }

    /// Assemble an engine from deployment configuration.
    ///
    /// The graph source is the JSON export at `source_path`; snapshot and
    /// fingerprint live under the archive directory.
    pub fn from_config<C: ConfigProvider>(config: &C, settings: EngineSettings) -> Result<Self> {
        let source_path = config.source_path()?;
        log::info!("Loading graph export from {}", source_path.display());
        let source = Arc::new(InMemoryGraphSource::load_json(&source_path)?);
        log::info!(
            "Loaded {} nodes and {} relationships",
            source.node_count(),
            source.relationship_count()
        );

        let snapshots = Arc::new(FileSnapshotRepository::new(config.snapshot_path()?));
        let fingerprints = Arc::new(JsonFingerprintRepository::new(config.fingerprint_path()?));
        Ok(Self::new(
            source.clone(),
            source,
            snapshots,
            fingerprints,
            settings,
        ))
    }

    /// Snapshot storage.
    pub fn snapshots(&self) -> &Arc<dyn SnapshotRepository> {
        &self.snapshots
    }

    /// The rebuild pipeline.
    pub fn pipeline(&self) -> &Arc<RebuildPipeline> {
        &self.pipeline
    }

    /// Ego networks over the snapshot.
    pub fn ego(&self) -> &EgoNetworkService {
        &self.ego
    }

    /// Shortest paths over the live source.
    pub fn paths(&self) -> &PathFinder {
        &self.paths
    }

    /// Related nodes and heatmap.
    pub fn explore(&self) -> &ExploreService {
        &self.explore
    }

    /// Interactive re-layout.
    pub fn local_layout(&self) -> &LocalLayoutService {
        &self.local_layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_export;
    use crate::types::NodeId;
    use std::path::PathBuf;

    #[derive(Clone)]
    struct DirConfig {
        dir: PathBuf,
    }

    impl ConfigProvider for DirConfig {
        fn project_name(&self) -> &str {
            "prosograph-test"
        }

        fn archive_dir(&self) -> Result<PathBuf> {
            Ok(self.dir.join("archive"))
        }

        fn source_path(&self) -> Result<PathBuf> {
            Ok(self.dir.join("export.json"))
        }
    }

    fn write_export(dir: &std::path::Path) {
        let json = serde_json::to_string(&sample_export()).unwrap();
        std::fs::write(dir.join("export.json"), json).unwrap();
    }

    #[tokio::test]
    async fn test_from_config_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        write_export(dir.path());
        let config = DirConfig {
            dir: dir.path().to_path_buf(),
        };
        let engine = Engine::from_config(&config, EngineSettings::default()).unwrap();

        assert!(engine.pipeline().run(false).await.unwrap().wrote_snapshot());
        assert!(config.snapshot_path().unwrap().exists());
        assert!(config.fingerprint_path().unwrap().exists());

        let ego = engine.ego().ego_network(NodeId::new(1)).await.unwrap();
        assert_eq!(ego.nodes.len(), 4);
        assert_eq!(ego.nodes[0].size, NodeStyle::default().focused_size);

        let raw = engine.snapshots().read_raw().await.unwrap();
        assert!(raw.contains("\"updatedAt\""));
    }

    #[tokio::test]
    async fn test_from_config_missing_export() {
        let dir = tempfile::tempdir().unwrap();
        let config = DirConfig {
            dir: dir.path().to_path_buf(),
        };
        let err = Engine::from_config(&config, EngineSettings::default())
            .err()
            .unwrap();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_settings_deserialize_partial() {
        let settings: EngineSettings =
            serde_json::from_str(r#"{"layout": {"link_distance": 150.0}}"#).unwrap();
        assert_eq!(settings.layout.link_distance, 150.0);
        assert_eq!(settings.local_layout, LocalLayoutParams::default());
    }
}

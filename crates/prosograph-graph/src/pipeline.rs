//! The full rebuild path: check, extract, lay out, persist.
//!
//! At most one rebuild runs at a time; concurrent callers queue on the
//! pipeline's lock and re-check staleness once they get it, so a burst of
//! triggers produces a single rebuild. Readers never see a partial
//! snapshot because the repository replaces it atomically.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Mutex;

use prosograph_core::{Error, Result};

use crate::cache_guard::CacheGuard;
use crate::extractor::GraphExtractor;
use crate::layout::LayoutSimulator;
use crate::persistence::SnapshotRepository;
use crate::types::{Snapshot, SnapshotStatistics};

/// What a pipeline run did.
#[derive(Clone, Debug, PartialEq)]
pub enum RebuildOutcome {
    /// The fingerprint was unchanged; nothing was rebuilt.
    Skipped,
    /// A new snapshot was written.
    Rebuilt {
        /// Laid-out nodes.
        nodes: usize,
        /// Deduplicated links.
        links: usize,
        /// Timings recorded in the snapshot.
        statistics: SnapshotStatistics,
    },
    /// The source had nothing to visualize; an empty snapshot was written.
    Empty,
}

impl RebuildOutcome {
    /// Whether a snapshot was written.
    pub fn wrote_snapshot(&self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

/// Serialized rebuilds of the cached layout.
pub struct RebuildPipeline {
    guard: CacheGuard,
    extractor: GraphExtractor,
    simulator: LayoutSimulator,
    snapshots: Arc<dyn SnapshotRepository>,
    lock: Mutex<()>,
}

impl RebuildPipeline {
    /// Assemble a pipeline.
    pub fn new(
        guard: CacheGuard,
        extractor: GraphExtractor,
        simulator: LayoutSimulator,
        snapshots: Arc<dyn SnapshotRepository>,
    ) -> Self {
        Self {
            guard,
            extractor,
            simulator,
            snapshots,
            lock: Mutex::new(()),
        }
    }

    /// Rebuild if the graph changed, or unconditionally when `force`.
    ///
    /// If the rebuild fails after the staleness check recorded a new
    /// fingerprint, the fingerprint is cleared so the next run retries.
    /// A failed snapshot write leaves the previous snapshot in place.
    pub async fn run(&self, force: bool) -> Result<RebuildOutcome> {
        let _running = self.lock.lock().await;

        if force {
            log::info!("Forced rebuild requested");
            self.guard.record().await?;
        } else if !self.guard.should_rebuild().await? {
            log::info!("Graph unchanged, keeping cached layout");
            return Ok(RebuildOutcome::Skipped);
        }

        match self.rebuild().await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                log::warn!("Rebuild failed: {e}");
                if let Err(clear) = self.guard.invalidate().await {
                    log::warn!("Could not clear fingerprint after failed rebuild: {clear}");
                }
                Err(e)
            }
        }
    }

    async fn rebuild(&self) -> Result<RebuildOutcome> {
        let started = Instant::now();
        let graph = self.extractor.extract().await?;
        let file_create_time_ms = started.elapsed().as_millis() as u64;

        if graph.is_empty() {
            log::warn!("No visualizable nodes found, writing an empty snapshot");
            self.snapshots.write(&Snapshot::empty()).await?;
            return Ok(RebuildOutcome::Empty);
        }

        let started = Instant::now();
        let simulator = self.simulator.clone();
        let links = graph.links;
        let (nodes, links) = tokio::task::spawn_blocking(move || {
            simulator.simulate(graph.nodes, &links).map(|nodes| (nodes, links))
        })
        .await
        .map_err(|e| Error::operation(format!("layout task failed: {e}")))??;
        let simulation_time_ms = started.elapsed().as_millis() as u64;

        let statistics = SnapshotStatistics::new(file_create_time_ms, simulation_time_ms);
        let snapshot = Snapshot {
            nodes,
            links,
            statistics: statistics.clone(),
            updated_at: Utc::now(),
        };
        self.snapshots.write(&snapshot).await?;

        log::info!(
            "Rebuilt graph network: {} nodes, {} links (extract {}, layout {})",
            snapshot.nodes.len(),
            snapshot.links.len(),
            statistics.file_create_time,
            statistics.simulation_time
        );
        Ok(RebuildOutcome::Rebuilt {
            nodes: snapshot.nodes.len(),
            links: snapshot.links.len(),
            statistics,
        })
    }
}

//! Snapshot persistence.
//!
//! The laid-out graph is stored as a single JSON document. Writes go to a
//! temporary file in the same directory which is then renamed over the
//! target, so readers observe either the previous or the new snapshot and
//! never a partially written one.
//!
//! - [`save_snapshot`] / [`load_snapshot`]: synchronous file helpers
//! - [`SnapshotRepository`]: injected storage seam used by the engine
//! - [`FileSnapshotRepository`] / [`MemorySnapshotRepository`]: the two
//!   implementations

use async_trait::async_trait;
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;

use prosograph_core::{Error, Result};

use crate::types::Snapshot;

// ============================================================================
// File helpers
// ============================================================================

/// Serialize `value` as JSON and atomically replace `path` with it.
///
/// Creates the parent directory if needed.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| {
        Error::snapshot_io(format!("cannot create {}: {e}", dir.display()))
    })?;

    let tmp = NamedTempFile::new_in(&dir)
        .map_err(|e| Error::snapshot_io(format!("cannot create temp file in {}: {e}", dir.display())))?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer(&mut writer, value)?;
        writer
            .flush()
            .map_err(|e| Error::snapshot_io(format!("cannot write {}: {e}", path.display())))?;
    }
    tmp.persist(path)
        .map_err(|e| Error::snapshot_io(format!("cannot replace {}: {}", path.display(), e.error)))?;
    Ok(())
}

/// Save a snapshot to a JSON file.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    write_json_atomic(path, snapshot)?;
    log::info!(
        "Wrote snapshot to {} ({} nodes, {} links)",
        path.display(),
        snapshot.nodes.len(),
        snapshot.links.len()
    );
    Ok(())
}

/// Load a snapshot from a JSON file.
pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let json = load_snapshot_raw(path)?;
    load_snapshot_from_str(&json)
}

/// Read the snapshot file verbatim.
pub fn load_snapshot_raw(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::file_not_found(path));
    }
    std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))
}

/// Parse a snapshot from a JSON string.
pub fn load_snapshot_from_str(json: &str) -> Result<Snapshot> {
    serde_json::from_str(json)
        .map_err(|e| Error::snapshot_io(format!("Failed to parse snapshot JSON: {e}")))
}

/// Run blocking file I/O off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::operation(format!("blocking task failed: {e}")))?
}

// ============================================================================
// Repository seam
// ============================================================================

/// Storage for the current snapshot.
///
/// Reads never fail: a missing or unreadable snapshot is reported as
/// `None`, which callers treat as "no cache yet".
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Replace the stored snapshot.
    async fn write(&self, snapshot: &Snapshot) -> Result<()>;

    /// The stored snapshot, if there is a valid one.
    async fn read(&self) -> Option<Snapshot>;

    /// The stored snapshot as JSON text, if there is a valid one.
    async fn read_raw(&self) -> Option<String>;
}

/// Snapshot stored in a JSON file.
#[derive(Clone, Debug)]
pub struct FileSnapshotRepository {
    path: PathBuf,
}

impl FileSnapshotRepository {
    /// Store the snapshot at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotRepository for FileSnapshotRepository {
    async fn write(&self, snapshot: &Snapshot) -> Result<()> {
        let path = self.path.clone();
        let snapshot = snapshot.clone();
        blocking(move || save_snapshot(&path, &snapshot)).await
    }

    async fn read(&self) -> Option<Snapshot> {
        let path = self.path.clone();
        match blocking(move || load_snapshot(&path)).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                if !e.is_not_found() {
                    log::warn!("Ignoring unreadable snapshot: {e}");
                }
                None
            }
        }
    }

    async fn read_raw(&self) -> Option<String> {
        let path = self.path.clone();
        let loaded = blocking(move || {
            let json = load_snapshot_raw(&path)?;
            load_snapshot_from_str(&json)?;
            Ok(json)
        })
        .await;
        match loaded {
            Ok(json) => Some(json),
            Err(e) => {
                if !e.is_not_found() {
                    log::warn!("Ignoring unreadable snapshot: {e}");
                }
                None
            }
        }
    }
}

/// Snapshot held in memory, for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemorySnapshotRepository {
    snapshot: RwLock<Option<Snapshot>>,
    writes: AtomicUsize,
}

impl MemorySnapshotRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository already holding `snapshot`.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: RwLock::new(Some(snapshot)),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of completed writes.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotRepository for MemorySnapshotRepository {
    async fn write(&self, snapshot: &Snapshot) -> Result<()> {
        let mut slot = self
            .snapshot
            .write()
            .map_err(|_| Error::snapshot_io("snapshot lock poisoned"))?;
        *slot = Some(snapshot.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn read(&self) -> Option<Snapshot> {
        self.snapshot.read().ok()?.clone()
    }

    async fn read_raw(&self) -> Option<String> {
        let snapshot = self.read().await?;
        serde_json::to_string(&snapshot).ok()
    }
}

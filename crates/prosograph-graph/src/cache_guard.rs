//! Staleness check for the cached layout.
//!
//! [`CacheGuard`] compares per-type counts of public nodes against the
//! counts recorded at the last rebuild. Equal counts do not prove the
//! graph is unchanged; they are a cheap approximation.
//!
//! When a rebuild is signalled the new fingerprint is stored *before* the
//! rebuild runs. The rebuild pipeline calls [`CacheGuard::invalidate`] if
//! the rebuild then fails, so the next check rebuilds again.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use prosograph_core::{Error, Result};

use crate::persistence::{blocking, write_json_atomic};
use crate::source::GraphSource;
use crate::types::{CountFingerprint, SourceLabel};

// ============================================================================
// Fingerprint storage
// ============================================================================

/// Storage for the last recorded fingerprint.
#[async_trait]
pub trait FingerprintRepository: Send + Sync {
    /// The stored fingerprint, `None` if nothing was recorded yet.
    async fn load(&self) -> Result<Option<CountFingerprint>>;

    /// Replace the stored fingerprint.
    async fn store(&self, fingerprint: &CountFingerprint) -> Result<()>;

    /// Forget the stored fingerprint.
    async fn clear(&self) -> Result<()>;
}

/// Fingerprint kept in a JSON side file next to the snapshot.
#[derive(Clone, Debug)]
pub struct JsonFingerprintRepository {
    path: PathBuf,
}

impl JsonFingerprintRepository {
    /// Store the fingerprint at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the fingerprint file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FingerprintRepository for JsonFingerprintRepository {
    async fn load(&self) -> Result<Option<CountFingerprint>> {
        let path = self.path.clone();
        blocking(move || {
            if !path.exists() {
                return Ok(None);
            }
            let json = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
            let fingerprint = serde_json::from_str(&json).map_err(|e| {
                Error::snapshot_io(format!("Failed to parse {}: {e}", path.display()))
            })?;
            Ok(Some(fingerprint))
        })
        .await
    }

    async fn store(&self, fingerprint: &CountFingerprint) -> Result<()> {
        let path = self.path.clone();
        let fingerprint = *fingerprint;
        blocking(move || write_json_atomic(&path, &fingerprint)).await
    }

    async fn clear(&self) -> Result<()> {
        let path = self.path.clone();
        blocking(move || match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io_with_path(e, &path)),
        })
        .await
    }
}

/// Fingerprint held in memory. Counts writes so tests can assert that a
/// check left storage untouched.
#[derive(Debug, Default)]
pub struct InMemoryFingerprintRepository {
    fingerprint: Mutex<Option<CountFingerprint>>,
    writes: AtomicUsize,
}

impl InMemoryFingerprintRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository already holding `fingerprint`.
    pub fn with_fingerprint(fingerprint: CountFingerprint) -> Self {
        Self {
            fingerprint: Mutex::new(Some(fingerprint)),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of `store` and `clear` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<CountFingerprint>>> {
        self.fingerprint
            .lock()
            .map_err(|_| Error::snapshot_io("fingerprint lock poisoned"))
    }
}

#[async_trait]
impl FingerprintRepository for InMemoryFingerprintRepository {
    async fn load(&self) -> Result<Option<CountFingerprint>> {
        Ok(*self.slot()?)
    }

    async fn store(&self, fingerprint: &CountFingerprint) -> Result<()> {
        *self.slot()? = Some(*fingerprint);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.slot()? = None;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Guard
// ============================================================================

/// Decides whether the cached layout must be rebuilt.
#[derive(Clone)]
pub struct CacheGuard {
    source: Arc<dyn GraphSource>,
    repository: Arc<dyn FingerprintRepository>,
}

impl CacheGuard {
    /// Create a guard over `source`, recording fingerprints in `repository`.
    pub fn new(source: Arc<dyn GraphSource>, repository: Arc<dyn FingerprintRepository>) -> Self {
        Self { source, repository }
    }

    /// Count public nodes of each visualizable type, one query per type.
    pub async fn current_fingerprint(&self) -> Result<CountFingerprint> {
        Ok(CountFingerprint {
            events: self.source.count_public(SourceLabel::Event).await?,
            organisations: self.source.count_public(SourceLabel::Organisation).await?,
            people: self.source.count_public(SourceLabel::Person).await?,
            resources: self.source.count_public(SourceLabel::Resource).await?,
        })
    }

    /// Whether a rebuild is needed.
    ///
    /// Stores the current fingerprint whenever it returns `true`. An
    /// unreadable stored fingerprint counts as absent.
    pub async fn should_rebuild(&self) -> Result<bool> {
        let current = self.current_fingerprint().await?;
        let stored = match self.repository.load().await {
            Ok(stored) => stored,
            Err(e) => {
                log::warn!("Stored fingerprint unreadable, treating as absent: {e}");
                None
            }
        };

        match stored {
            Some(previous) if previous == current => {
                log::debug!("Fingerprint unchanged: {current:?}");
                Ok(false)
            }
            Some(previous) => {
                log::info!("Fingerprint changed: {previous:?} -> {current:?}");
                self.repository.store(&current).await?;
                Ok(true)
            }
            None => {
                log::info!("No stored fingerprint, first build");
                self.repository.store(&current).await?;
                Ok(true)
            }
        }
    }

    /// Store the current fingerprint unconditionally, for forced rebuilds.
    pub async fn record(&self) -> Result<CountFingerprint> {
        let current = self.current_fingerprint().await?;
        self.repository.store(&current).await?;
        Ok(current)
    }

    /// Forget the stored fingerprint so the next check rebuilds.
    pub async fn invalidate(&self) -> Result<()> {
        self.repository.clear().await
    }
}

//! Core traits for Prosograph.
//!
//! The primary trait is [`ConfigProvider`], which abstracts where the
//! engine finds its archive directory and graph source, so nothing in the
//! engine reads a hardcoded path.

use std::path::PathBuf;

use crate::Result;
use crate::util::paths::{FINGERPRINT_FILE, SNAPSHOT_FILE};

/// Trait for deployment configuration.
///
/// # Bounds
///
/// - `Send + Sync`: Configuration must be shareable across threads
/// - `Clone`: Configuration can be duplicated for passing to subsystems
/// - `'static`: Configuration lifetime is not borrowed
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use prosograph_core::traits::ConfigProvider;
/// use prosograph_core::Result;
///
/// #[derive(Clone)]
/// struct StaticConfig {
///     archive: PathBuf,
/// }
///
/// impl ConfigProvider for StaticConfig {
///     fn project_name(&self) -> &str {
///         "prosograph"
///     }
///
///     fn archive_dir(&self) -> Result<PathBuf> {
///         Ok(self.archive.clone())
///     }
///
///     fn source_path(&self) -> Result<PathBuf> {
///         Ok(self.archive.join("export.json"))
///     }
/// }
///
/// let config = StaticConfig { archive: PathBuf::from("/srv/archive") };
/// assert_eq!(
///     config.snapshot_path().unwrap(),
///     PathBuf::from("/srv/archive/graph-network.json")
/// );
/// ```
pub trait ConfigProvider: Send + Sync + Clone + 'static {
    /// The project name, used for env var prefixes and default paths.
    fn project_name(&self) -> &str;

    /// Directory under which the snapshot and fingerprint files live.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be determined.
    fn archive_dir(&self) -> Result<PathBuf>;

    /// Location of the property-graph export backing the graph source.
    fn source_path(&self) -> Result<PathBuf>;

    /// Path of the persisted layout snapshot.
    fn snapshot_path(&self) -> Result<PathBuf> {
        Ok(self.archive_dir()?.join(SNAPSHOT_FILE))
    }

    /// Path of the persisted count fingerprint.
    fn fingerprint_path(&self) -> Result<PathBuf> {
        Ok(self.archive_dir()?.join(FINGERPRINT_FILE))
    }
}

//! Path resolution utilities.
//!
//! Names of the files kept in the archive directory, plus expansion of
//! user-supplied paths (`~`, `$VAR`).

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// File name of the persisted layout snapshot.
pub const SNAPSHOT_FILE: &str = "graph-network.json";

/// File name of the persisted count fingerprint.
pub const FINGERPRINT_FILE: &str = "graph-network-counts.json";

/// Expands `~` and environment variables (`$VAR`, `${VAR}`) in a path string.
///
/// Fails with a configuration error when a referenced variable is unset.
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw)
        .map_err(|e| Error::config(format!("Cannot expand path '{raw}': {e}")))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

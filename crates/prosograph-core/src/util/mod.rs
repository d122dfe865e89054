//! Utility modules.
//!
//! # Modules
//!
//! - [`paths`]: Path resolution helpers (`~`/`$VAR` expansion, archive file names)

pub mod paths;

//! Prosograph Core: shared errors, traits, and utilities.
//!
//! This crate provides the foundational types used across all Prosograph
//! crates. It has no internal Prosograph dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`traits`]: Configuration abstraction consumed by the engine
//! - [`util`]: Path helpers

pub mod error;
pub mod traits;
pub mod util;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use traits::ConfigProvider;

//! Error types for Prosograph operations.
//!
//! This module provides a common `Error` type and `Result<T>` alias used across
//! all Prosograph crates. Uses `thiserror` for derive macros.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur in Prosograph operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error, optionally tied to a path.
    #[error("I/O error{}: {source}", path_suffix(.path))]
    Io {
        /// Underlying error.
        #[source]
        source: std::io::Error,
        /// Path involved, when known.
        path: Option<PathBuf>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A node, file, or record was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data or format, including bad request parameters.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A graph source query failed.
    #[error("Data source error: {0}")]
    DataSource(String),

    /// Reading or writing a persisted snapshot or fingerprint failed.
    #[error("Snapshot I/O error: {0}")]
    SnapshotIo(String),

    /// A layout was requested for a graph without nodes.
    #[error("Empty graph: {0}")]
    EmptyGraph(String),

    /// Generic operation failure.
    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    /// Wrap an I/O error without path context.
    pub fn io(source: std::io::Error) -> Self {
        Self::Io { source, path: None }
    }

    /// Wrap an I/O error with the path that caused it.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().to_path_buf()),
        }
    }

    /// Create a not-found error for a missing file.
    pub fn file_not_found(path: impl AsRef<Path>) -> Self {
        Self::NotFound(format!("file {}", path.as_ref().display()))
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Create a data source error.
    pub fn data_source(msg: impl Into<String>) -> Self {
        Self::DataSource(msg.into())
    }

    /// Create a snapshot I/O error.
    pub fn snapshot_io(msg: impl Into<String>) -> Self {
        Self::SnapshotIo(msg.into())
    }

    /// Create an empty graph error.
    pub fn empty_graph(msg: impl Into<String>) -> Self {
        Self::EmptyGraph(msg.into())
    }

    /// Create a generic operation error.
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Whether this error means the requested entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this error came from the graph source.
    pub fn is_data_source(&self) -> bool {
        matches!(self, Self::DataSource(_))
    }

    /// Whether this error is a caller mistake (bad input).
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidData(_) | Self::EmptyGraph(_))
    }

    /// Whether retrying the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DataSource(_) | Self::Io { .. } | Self::SnapshotIo(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::io(source)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

fn path_suffix(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" at {}", p.display()))
        .unwrap_or_default()
}

/// Result type alias using Prosograph's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_with_path_display() {
        let err = Error::io_with_path(
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            "/archive/graph-network.json",
        );
        let msg = err.to_string();
        assert!(msg.contains("/archive/graph-network.json"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn test_io_without_path_display() {
        let err = Error::io(std::io::Error::other("boom"));
        assert_eq!(err.to_string(), "I/O error: boom");
    }

    #[test]
    fn test_inspectors() {
        assert!(Error::not_found("node 1").is_not_found());
        assert!(Error::data_source("down").is_data_source());
        assert!(Error::data_source("down").is_retryable());
        assert!(Error::invalid_data("step").is_invalid_input());
        assert!(Error::empty_graph("no nodes").is_invalid_input());
        assert!(!Error::config("x").is_retryable());
    }

    #[test]
    fn test_from_serde_json() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}

//! Command-line interface for Prosograph.
//!
//! - `prosograph graph [--force]` rebuilds the cached layout when the
//!   graph changed; `graph validate|stats|ego|paths|related` inspect it
//! - `prosograph serve` runs the HTTP API, optionally re-checking the
//!   graph on a schedule
//! - `prosograph config path|get|set|init|export` manages configuration

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;
pub mod graph_handlers;

pub use app::ProsographCli;
pub use cli::{CliArgs, Command, ConfigAction, GraphCommand, GraphSubcommand};
pub use config::ProsographConfig;

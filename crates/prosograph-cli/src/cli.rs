//! CLI argument parsing and command definitions.
//!
//! `serve` runs the HTTP API, `graph` rebuilds and inspects the cached
//! layout, `config` manages the configuration file.

use clap::{Parser, Subcommand};

use prosograph_graph::{MAX_STEPS, MIN_STEPS};

// ============================================================================
// CLI argument types
// ============================================================================

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "prosograph", author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "PROSOGRAPH_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API.
    Serve {
        /// Port to listen on (overrides `server.port`).
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind (overrides `server.host`).
        #[arg(long)]
        host: Option<String>,

        /// Seconds between background rebuild checks (overrides
        /// `server.rebuild_interval_secs`; 0 disables).
        #[arg(long)]
        rebuild_interval: Option<u64>,
    },

    /// Rebuild or inspect the graph network. Rebuilds when no subcommand
    /// is given.
    Graph(GraphCommand),

    /// Configuration operations.
    Config(ConfigCommand),

    /// Print version information.
    Version,
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Get a configuration value by dotted key.
    Get {
        /// Dotted key (e.g., "server.port").
        key: String,
    },

    /// Set a configuration value by dotted key.
    Set {
        /// Dotted key (e.g., "server.port").
        key: String,

        /// Value to set.
        value: String,
    },

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },

    /// Export configuration as environment variables.
    Export {
        /// Format as Docker --env flags.
        #[arg(long)]
        docker_env: bool,
    },
}

/// Graph command and its flags.
#[derive(Parser, Debug)]
pub struct GraphCommand {
    /// Rebuild even if the node counts are unchanged.
    #[arg(long, global = true)]
    pub force: bool,

    /// Graph subcommand to execute.
    #[command(subcommand)]
    pub command: Option<GraphSubcommand>,
}

/// Available graph subcommands.
#[derive(Subcommand, Debug)]
pub enum GraphSubcommand {
    /// Rebuild the cached layout if the graph changed.
    Build,

    /// Check the stored snapshot for integrity problems.
    Validate,

    /// Show statistics of the stored snapshot.
    Stats {
        /// Number of most connected nodes to list.
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Show the ego network of a node.
    Ego {
        /// Node id.
        #[arg(long)]
        id: i64,
    },

    /// Show the shortest paths between two nodes.
    Paths {
        /// Start node id.
        #[arg(long)]
        source: i64,

        /// End node id.
        #[arg(long)]
        target: i64,

        /// Maximum number of hops.
        #[arg(long, default_value_t = MAX_STEPS)]
        step: usize,
    },

    /// List the nodes within a number of hops of a node.
    Related {
        /// Node id.
        #[arg(long)]
        id: i64,

        /// Number of hops.
        #[arg(long, default_value_t = MIN_STEPS)]
        step: usize,
    },
}

// ============================================================================
// Tests
// ============================================================================

//! The Prosograph CLI application.

use std::time::Duration;

use tracing_subscriber::EnvFilter;

use prosograph_core::Result;
use prosograph_graph::Engine;

use crate::cli::{CliArgs, Command, GraphCommand, GraphSubcommand};
use crate::config::ProsographConfig;
use crate::graph_handlers::PathOptions;
use crate::{config_handlers, graph_handlers};

// ============================================================================
// ProsographCli
// ============================================================================

/// The CLI application over a loaded configuration.
pub struct ProsographCli {
    name: String,
    config: ProsographConfig,
    version: String,
}

impl ProsographCli {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(name: impl Into<String>, args: &CliArgs) -> Result<Self> {
        let config = ProsographConfig::load(args.config.as_deref())?;
        Ok(Self::new(name, config))
    }

    /// Create an application over an explicit config.
    pub fn new(name: impl Into<String>, config: ProsographConfig) -> Self {
        Self {
            name: name.into(),
            config,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Override the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// The loaded configuration.
    pub fn config(&self) -> &ProsographConfig {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// `RUST_LOG` wins; otherwise `--quiet` means `warn`, `--verbose`
    /// means `debug`, and the default is `info`.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // A subscriber may already be installed (tests).
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }

    /// Run the CLI with the given arguments.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        self.init_logging(args.verbose, args.quiet);

        match args.command {
            Some(Command::Version) => {
                println!("{} {}", self.name, self.version);
                Ok(())
            }
            Some(Command::Serve {
                port,
                host,
                rebuild_interval,
            }) => {
                let mut options = self.config.server_options();
                if let Some(port) = port {
                    options.port = port;
                }
                if let Some(host) = host {
                    options.host = host;
                }
                if let Some(secs) = rebuild_interval {
                    options.rebuild_interval = (secs > 0).then(|| Duration::from_secs(secs));
                }
                let engine = Engine::from_config(&self.config, self.config.engine_settings())?;
                prosograph_api::serve(engine, options).await
            }
            Some(Command::Graph(graph)) => self.handle_graph(graph).await,
            Some(Command::Config(config_cmd)) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            None => {
                println!("{} {}: use --help for usage", self.name, self.version);
                Ok(())
            }
        }
    }

    /// Dispatch graph subcommands to handlers.
    async fn handle_graph(&self, graph: GraphCommand) -> Result<()> {
        let config = &self.config;
        let settings = config.engine_settings();
        tracing::debug!(force = graph.force, "graph command");

        match graph.command.unwrap_or(GraphSubcommand::Build) {
            GraphSubcommand::Build => {
                graph_handlers::handle_build(config, settings, graph.force).await?;
                Ok(())
            }
            GraphSubcommand::Validate => graph_handlers::handle_validate(config).await,
            GraphSubcommand::Stats { top } => graph_handlers::handle_stats(config, top).await,
            GraphSubcommand::Ego { id } => graph_handlers::handle_ego(config, &settings, id).await,
            GraphSubcommand::Paths {
                source,
                target,
                step,
            } => {
                let options = PathOptions {
                    source,
                    target,
                    step,
                };
                graph_handlers::handle_paths(config, settings, options).await
            }
            GraphSubcommand::Related { id, step } => {
                graph_handlers::handle_related(config, settings, id, step).await
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

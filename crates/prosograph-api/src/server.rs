//! Serving the router, with an optional scheduled rebuild.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use prosograph_core::{Error, Result};
use prosograph_graph::{Engine, RebuildPipeline};

use crate::routes::router;
use crate::state::AppState;

/// Where and how to serve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerOptions {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Period of the background rebuild check, if any.
    pub rebuild_interval: Option<Duration>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            rebuild_interval: None,
        }
    }
}

impl ServerOptions {
    /// `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Bind and serve until Ctrl-C.
pub async fn serve(engine: Engine, options: ServerOptions) -> Result<()> {
    let address = options.address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| Error::operation(format!("could not bind {address}: {e}")))?;
    tracing::info!("Listening on {address}");
    serve_on(listener, engine, options.rebuild_interval).await
}

/// Serve on an already bound listener until Ctrl-C.
pub async fn serve_on(
    listener: TcpListener,
    engine: Engine,
    rebuild_interval: Option<Duration>,
) -> Result<()> {
    let scheduler = rebuild_interval
        .filter(|every| !every.is_zero())
        .map(|every| spawn_scheduled_rebuild(engine.pipeline().clone(), every));

    let served = axum::serve(listener, router(AppState::new(engine)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Error::io);

    if let Some(handle) = scheduler {
        handle.abort();
    }
    served
}

/// Run the pipeline every `every`, starting immediately.
///
/// Runs share the pipeline's single-flight lock with any other caller, and
/// a failed run is logged and retried on the next tick. `every` must be
/// non-zero.
pub fn spawn_scheduled_rebuild(pipeline: Arc<RebuildPipeline>, every: Duration) -> JoinHandle<()> {
    tracing::info!("Scheduling a rebuild check every {}s", every.as_secs());
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match pipeline.run(false).await {
                Ok(outcome) => tracing::debug!(?outcome, "scheduled rebuild check finished"),
                Err(e) => tracing::warn!(error = %e, "scheduled rebuild failed"),
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

// ============================================================================
// Tests
// ============================================================================

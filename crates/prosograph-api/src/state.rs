//! Shared handler state.

use prosograph_graph::Engine;

/// State cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    engine: Engine,
}

impl AppState {
    /// Wrap an assembled engine.
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// The engine behind the routes.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

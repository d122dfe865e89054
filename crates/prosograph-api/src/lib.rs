//! HTTP surface of the Prosograph graph engine.
//!
//! Six routes over an [`Engine`](prosograph_graph::Engine), each answering
//! with the `{status, data, error, msg}` [`Envelope`]:
//!
//! | route | answer |
//! |---|---|
//! | `GET /graph-network` | the stored snapshot, as a JSON string |
//! | `GET /item-network?_id=` | ego network of a node |
//! | `GET /related-nodes?_id=&step=` | nodes within `step` hops (default 1) |
//! | `GET /related-paths?sourceId=&targetId=&step=` | shortest paths (default bound 6) |
//! | `POST /item-graph-simulation` | local re-layout of a posted subgraph |
//! | `GET /heatmap` | people per diocese |

pub mod envelope;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use envelope::{ApiError, ApiResult, Envelope};
pub use routes::router;
pub use server::{ServerOptions, serve, serve_on, spawn_scheduled_rebuild};
pub use state::AppState;

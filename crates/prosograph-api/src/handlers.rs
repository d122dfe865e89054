//! Route handlers.
//!
//! Query parameters arrive as optional strings and are parsed here, so a
//! missing or malformed parameter is answered with a 400 envelope rather
//! than a bare extractor rejection.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use serde::Deserialize;

use prosograph_core::Error;
use prosograph_graph::{
    EgoNetwork, HeatmapEntry, LocalLayoutRequest, LocalLayoutResult, MAX_STEPS, MIN_STEPS, NodeId,
    NodeView, Path,
};

use crate::envelope::{ApiError, ApiResult, Envelope};
use crate::state::AppState;

/// Default hop bound of `/related-nodes`.
pub const DEFAULT_RELATED_STEPS: usize = MIN_STEPS;

/// Default hop bound of `/related-paths`.
pub const DEFAULT_PATH_STEPS: usize = MAX_STEPS;

// ============================================================================
// Query parameters
// ============================================================================

/// `?_id=`
#[derive(Debug, Default, Deserialize)]
pub struct ItemQuery {
    #[serde(rename = "_id")]
    id: Option<String>,
}

/// `?_id=&step=`
#[derive(Debug, Default, Deserialize)]
pub struct RelatedNodesQuery {
    #[serde(rename = "_id")]
    id: Option<String>,
    step: Option<String>,
}

/// `?sourceId=&targetId=&step=`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedPathsQuery {
    source_id: Option<String>,
    target_id: Option<String>,
    step: Option<String>,
}

fn required_id(value: Option<&str>, name: &str) -> Result<NodeId, ApiError> {
    match value.map(str::trim) {
        None | Some("") => Err(ApiError::bad_request(format!("{name} is required"))),
        Some(raw) => Ok(raw.parse::<NodeId>()?),
    }
}

fn steps_or(value: Option<&str>, default: usize) -> Result<usize, ApiError> {
    match value.map(str::trim) {
        None | Some("") => Ok(default),
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| ApiError::bad_request(format!("step must be a number, got '{raw}'"))),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// `GET /graph-network`: the stored snapshot, verbatim, as a string.
pub async fn graph_network(State(state): State<AppState>) -> ApiResult<String> {
    let raw = state
        .engine()
        .snapshots()
        .read_raw()
        .await
        .ok_or_else(|| Error::not_found("the graph network has not been built yet"))?;
    Ok(Envelope::ok(raw, "Graph network loaded"))
}

/// `GET /item-network?_id=`: ego network of one node.
pub async fn item_network(
    State(state): State<AppState>,
    Query(query): Query<ItemQuery>,
) -> ApiResult<EgoNetwork> {
    let id = required_id(query.id.as_deref(), "_id")?;
    let network = state.engine().ego().ego_network(id).await?;
    Ok(Envelope::ok(network, "Item network loaded"))
}

/// `GET /related-nodes?_id=&step=`: nodes within `step` hops.
pub async fn related_nodes(
    State(state): State<AppState>,
    Query(query): Query<RelatedNodesQuery>,
) -> ApiResult<Vec<NodeView>> {
    let id = required_id(query.id.as_deref(), "_id")?;
    let steps = steps_or(query.step.as_deref(), DEFAULT_RELATED_STEPS)?;
    let nodes = state.engine().explore().related_nodes(id, steps).await?;
    Ok(Envelope::ok(nodes, "Related nodes loaded"))
}

/// `GET /related-paths?sourceId=&targetId=&step=`: shortest paths.
///
/// No path within the bound is a success with an empty list.
pub async fn related_paths(
    State(state): State<AppState>,
    Query(query): Query<RelatedPathsQuery>,
) -> ApiResult<Vec<Path>> {
    let source = required_id(query.source_id.as_deref(), "sourceId")?;
    let target = required_id(query.target_id.as_deref(), "targetId")?;
    let steps = steps_or(query.step.as_deref(), DEFAULT_PATH_STEPS)?;
    let paths = state
        .engine()
        .paths()
        .shortest_paths(source, target, steps)
        .await?;
    Ok(Envelope::ok(paths, "Related paths loaded"))
}

/// `POST /item-graph-simulation`: re-layout of a caller-supplied subgraph.
pub async fn item_graph_simulation(
    State(state): State<AppState>,
    body: Result<Json<LocalLayoutRequest>, JsonRejection>,
) -> ApiResult<LocalLayoutResult> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let service = state.engine().local_layout().clone();
    let result = tokio::task::spawn_blocking(move || service.handle(request))
        .await
        .map_err(|e| Error::operation(format!("layout task failed: {e}")))??;
    Ok(Envelope::ok(result, "Simulation complete"))
}

/// `GET /heatmap`: people per diocese, with locations.
pub async fn heatmap(State(state): State<AppState>) -> ApiResult<Vec<HeatmapEntry>> {
    let entries = state.engine().explore().heatmap().await?;
    Ok(Envelope::ok(entries, "Heatmap loaded"))
}

/// Any other route.
pub async fn not_found() -> ApiError {
    ApiError::from(Error::not_found("no such route"))
}

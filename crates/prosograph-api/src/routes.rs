//! Router assembly.

use axum::Router;
use axum::routing::{get, post};

use crate::handlers;
use crate::state::AppState;

/// The API router with its state attached.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/graph-network", get(handlers::graph_network))
        .route("/item-network", get(handlers::item_network))
        .route("/related-nodes", get(handlers::related_nodes))
        .route("/related-paths", get(handlers::related_paths))
        .route(
            "/item-graph-simulation",
            post(handlers::item_graph_simulation),
        )
        .route("/heatmap", get(handlers::heatmap))
        .fallback(handlers::not_found)
        .with_state(state)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use prosograph_graph::fixtures::sample_source;
    use prosograph_graph::{
        Engine, EngineSettings, InMemoryFingerprintRepository, MemorySnapshotRepository,
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn engine() -> Engine {
        let source = Arc::new(sample_source());
        Engine::new(
            source.clone(),
            source,
            Arc::new(MemorySnapshotRepository::new()),
            Arc::new(InMemoryFingerprintRepository::new()),
            EngineSettings::default(),
        )
    }

    async fn built_engine() -> Engine {
        let engine = engine();
        engine.pipeline().run(false).await.unwrap();
        engine
    }

    async fn send(engine: &Engine, request: Request<Body>) -> (StatusCode, Value) {
        let response = router(AppState::new(engine.clone()))
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_json(engine: &Engine, uri: &str) -> (StatusCode, Value) {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        send(engine, request).await
    }

    async fn post_json(engine: &Engine, uri: &str, body: String) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        send(engine, request).await
    }

    fn ids(data: &Value) -> Vec<i64> {
        data.as_array()
            .unwrap()
            .iter()
            .map(|n| n["id"].as_i64().unwrap())
            .collect()
    }

    // ------------------------------------------------------------------------
    // /graph-network
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_graph_network_before_build() {
        let (status, body) = get_json(&engine(), "/graph-network").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], json!(false));
        assert_eq!(body["data"], Value::Null);
        assert_eq!(body["error"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_graph_network_is_string_payload() {
        let engine = built_engine().await;
        let (status, body) = get_json(&engine, "/graph-network").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!(true));

        let snapshot: Value = serde_json::from_str(body["data"].as_str().unwrap()).unwrap();
        assert_eq!(snapshot["nodes"].as_array().unwrap().len(), 8);
        assert_eq!(snapshot["links"].as_array().unwrap().len(), 8);
        assert!(snapshot["updatedAt"].is_string());
    }

    // ------------------------------------------------------------------------
    // /item-network
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_item_network() {
        let engine = built_engine().await;
        let (status, body) = get_json(&engine, "/item-network?_id=1").await;
        assert_eq!(status, StatusCode::OK);
        let nodes = &body["data"]["nodes"];
        assert_eq!(ids(nodes)[0], 1);
        assert_eq!(nodes.as_array().unwrap().len(), 4);
        assert_eq!(body["data"]["links"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_item_network_missing_id() {
        let engine = built_engine().await;
        let (status, body) = get_json(&engine, "/item-network").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], json!(false));
    }

    #[tokio::test]
    async fn test_item_network_bad_and_unknown_id() {
        let engine = built_engine().await;
        let (status, _) = get_json(&engine, "/item-network?_id=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = get_json(&engine, "/item-network?_id=999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // ------------------------------------------------------------------------
    // /related-nodes and /related-paths
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_related_nodes_default_step() {
        let (status, body) = get_json(&engine(), "/related-nodes?_id=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body["data"]), vec![10, 20]);
        assert_eq!(body["data"][1]["type"], json!("Classpiece"));
    }

    #[tokio::test]
    async fn test_related_nodes_step_out_of_range() {
        let (status, body) = get_json(&engine(), "/related-nodes?_id=2&step=9").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], json!(false));
    }

    #[tokio::test]
    async fn test_related_paths() {
        let (status, body) =
            get_json(&engine(), "/related-paths?sourceId=2&targetId=30").await;
        assert_eq!(status, StatusCode::OK);
        let paths = body["data"].as_array().unwrap();
        assert_eq!(paths.len(), 3);
        assert!(
            paths
                .iter()
                .all(|p| p["segments"].as_array().unwrap().len() == 3)
        );
        assert_eq!(paths[0]["source"]["id"], json!(2));
        assert_eq!(paths[0]["target"]["id"], json!(30));
    }

    #[tokio::test]
    async fn test_related_paths_none_within_bound() {
        let (status, body) =
            get_json(&engine(), "/related-paths?sourceId=2&targetId=30&step=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!(true));
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn test_related_paths_missing_target() {
        let (status, _) = get_json(&engine(), "/related-paths?sourceId=2").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    // ------------------------------------------------------------------------
    // /item-graph-simulation
    // ------------------------------------------------------------------------

    fn layout_node(id: i64) -> Value {
        json!({
            "id": id,
            "label": format!("N{id}"),
            "type": "Person",
            "color": "#5fa8d3",
            "strokeColor": "#1b4965",
            "size": 5.0,
            "count": 1
        })
    }

    #[tokio::test]
    async fn test_item_graph_simulation() {
        let body = json!({
            "nodes": [layout_node(1), layout_node(2), layout_node(3)],
            "links": [
                {"refId": 10, "source": 1, "target": 2, "label": "knows"},
                {"refId": 11, "source": 1, "target": 3, "label": "knows"}
            ],
            "centerX": 100.0,
            "centerY": -50.0
        });
        let (status, response) =
            post_json(&engine(), "/item-graph-simulation", body.to_string()).await;
        assert_eq!(status, StatusCode::OK);

        let nodes = response["data"]["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0]["x"], json!(100.0));
        assert_eq!(nodes[0]["y"], json!(-50.0));
        assert!(nodes.iter().all(|n| n["x"].is_number() && n["y"].is_number()));
        assert_eq!(response["data"]["links"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_item_graph_simulation_empty_nodes() {
        let body = json!({"nodes": [], "links": []});
        let (status, response) =
            post_json(&engine(), "/item-graph-simulation", body.to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["status"], json!(false));
    }

    #[tokio::test]
    async fn test_item_graph_simulation_malformed_body() {
        let (status, response) =
            post_json(&engine(), "/item-graph-simulation", "{not json".to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["status"], json!(false));
    }

    // ------------------------------------------------------------------------
    // /heatmap and fallback
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_heatmap() {
        let (status, body) = get_json(&engine(), "/heatmap").await;
        assert_eq!(status, StatusCode::OK);
        let entries = body["data"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["id"], json!(10));
        assert_eq!(entries[0]["count"], json!(3));
        assert_eq!(entries[0]["locations"][0]["label"], json!("Cork"));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, body) = get_json(&engine(), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], json!(false));
    }
}

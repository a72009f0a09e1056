//! Integration tests for the HTTP surface

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use interview_router_api::handler::{create_router, AppState};
use interview_router_core::{
    HealthMonitor, HealthTable, ModelResolver, MonitorSettings, Probe, ProbeError, ProbeOutcome,
    SimulationConfig,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

/// Probe with a fixed latency per model; missing models fail.
struct FixedProbe(HashMap<&'static str, u64>);

#[async_trait]
impl Probe for FixedProbe {
    async fn probe(&self, model: &str) -> Result<ProbeOutcome, ProbeError> {
        self.0
            .get(model)
            .map(|latency| ProbeOutcome::success(*latency))
            .ok_or_else(|| ProbeError::Transport("unreachable".to_string()))
    }
}

fn app_with(latencies: &[(&'static str, u64)]) -> (axum::Router, Arc<HealthMonitor>) {
    let table = HealthTable::new(["gpt-4o", "claude-3-sonnet"]);
    let probe = Arc::new(FixedProbe(latencies.iter().copied().collect()));
    let monitor = Arc::new(HealthMonitor::new(
        table.clone(),
        probe,
        MonitorSettings::default(),
    ));
    let resolver = ModelResolver::new(
        vec![SimulationConfig::new(
            "sim-frontend-01",
            "Frontend Engineer Interview",
            "gpt-4o",
            "claude-3-sonnet",
        )],
        table,
    );
    let state = Arc::new(AppState::new(resolver, Arc::clone(&monitor)));
    (create_router(state), monitor)
}

async fn post_json(app: axum::Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read(response).await
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(response).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_resolve_healthy_primary() {
    let (app, monitor) = app_with(&[("gpt-4o", 120), ("claude-3-sonnet", 200)]);
    monitor.run_probe_cycle().await;

    let (status, body) = post_json(
        app,
        "/api/v1/resolve-model",
        r#"{"simulationId":"sim-frontend-01"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["modelToUse"], "gpt-4o");
    assert_eq!(body["fallbackOccurred"], false);
    assert_eq!(body["details"]["status"], "HEALTHY");
    assert_eq!(body["details"]["latencyMs"], 120);
}

#[tokio::test]
async fn test_resolve_falls_back_when_primary_slow() {
    let (app, monitor) = app_with(&[("gpt-4o", 5200), ("claude-3-sonnet", 200)]);
    monitor.run_probe_cycle().await;

    let (status, body) = post_json(
        app,
        "/api/v1/resolve-model",
        r#"{"simulationId":"sim-frontend-01"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["modelToUse"], "claude-3-sonnet");
    assert_eq!(body["fallbackOccurred"], true);
    assert_eq!(body["details"]["status"], "UNHEALTHY");
    assert!(body["reason"].as_str().unwrap().contains("5200"));
}

#[tokio::test]
async fn test_resolve_before_first_cycle_falls_back() {
    let (app, _monitor) = app_with(&[("gpt-4o", 120)]);

    let (status, body) = post_json(
        app,
        "/api/v1/resolve-model",
        r#"{"simulationId":"sim-frontend-01"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fallbackOccurred"], true);
    assert_eq!(body["details"]["status"], "UNKNOWN");
    assert!(body["details"]["latencyMs"].is_null());
}

#[tokio::test]
async fn test_missing_simulation_id_is_bad_request() {
    let (app, _monitor) = app_with(&[]);

    let (status, body) = post_json(app.clone(), "/api/v1/resolve-model", "{}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidInput");

    let (status, _) = post_json(app, "/api/v1/resolve-model", r#"{"simulationId":""}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_simulation_is_not_found() {
    let (app, _monitor) = app_with(&[]);

    let (status, body) = post_json(
        app,
        "/api/v1/resolve-model",
        r#"{"simulationId":"nonexistent"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "SimulationNotFound");
}

#[tokio::test]
async fn test_models_health_snapshot() {
    let (app, monitor) = app_with(&[("gpt-4o", 120)]);
    monitor.run_probe_cycle().await;

    let (status, body) = get_json(app, "/api/v1/models/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gpt-4o"]["status"], "HEALTHY");
    assert_eq!(body["claude-3-sonnet"]["status"], "UNHEALTHY");
}

#[tokio::test]
async fn test_simulations_listing() {
    let (app, _monitor) = app_with(&[]);

    let (status, body) = get_json(app, "/api/v1/simulations").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], "sim-frontend-01");
    assert_eq!(body[0]["primaryModel"], "gpt-4o");
    assert_eq!(body[0]["secondaryModel"], "claude-3-sonnet");
}

#[tokio::test]
async fn test_liveness_reports_cycles() {
    let (app, monitor) = app_with(&[]);
    monitor.run_probe_cycle().await;

    let (status, body) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["cyclesCompleted"], 1);
}

#[tokio::test]
async fn test_malformed_body_returns_api_error() {
    let (app, _monitor) = app_with(&[]);

    let (status, body) = post_json(
        app.clone(),
        "/api/v1/resolve-model",
        r#"{"simulationId":5}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidInput");

    let (status, body) = post_json(app, "/api/v1/resolve-model", "{ not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidInput");
}

#[tokio::test]
async fn test_missing_content_type_returns_api_error() {
    let (app, _monitor) = app_with(&[]);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/resolve-model")
                .body(Body::from(r#"{"simulationId":"sim-frontend-01"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    let (status, body) = read(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidInput");
}

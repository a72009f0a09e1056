//! HTTP handlers for the interview router
//!
//! Routes:
//! - POST /api/v1/resolve-model - Pick the model for a simulation
//! - GET /api/v1/models/health - Current health table
//! - GET /api/v1/simulations - Simulation catalog
//! - GET /health - Liveness

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

use interview_router_core::{
    HealthMonitor, ModelHealth, ModelResolver, ResolutionResult, RouterError, SimulationConfig,
};

/// Application state
pub struct AppState {
    pub resolver: ModelResolver,
    pub monitor: Arc<HealthMonitor>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(resolver: ModelResolver, monitor: Arc<HealthMonitor>) -> Self {
        Self {
            resolver,
            monitor,
            started_at: Instant::now(),
        }
    }
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/resolve-model", post(resolve_model))
        .route("/api/v1/models/health", get(models_health))
        .route("/api/v1/simulations", get(list_simulations))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        cycles_completed: state.monitor.cycles_completed(),
    })
}

/// Resolve the model for a simulation
async fn resolve_model(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ResolveModelRequest>, JsonRejection>,
) -> Result<Json<ResolutionResult>, (StatusCode, Json<ApiError>)> {
    let Json(request) = payload.map_err(|rejection| {
        error_response(RouterError::invalid_input(format!(
            "malformed request body: {}",
            rejection.body_text()
        )))
    })?;
    let simulation_id = request.simulation_id.unwrap_or_default();

    state
        .resolver
        .resolve(&simulation_id)
        .map(Json)
        .map_err(error_response)
}

/// Snapshot of the health table
async fn models_health(State(state): State<Arc<AppState>>) -> Json<BTreeMap<String, ModelHealth>> {
    Json(state.resolver.table().snapshot())
}

/// Simulation catalog
async fn list_simulations(State(state): State<Arc<AppState>>) -> Json<Vec<SimulationConfig>> {
    Json(state.resolver.simulations())
}

/// Map a core error to an HTTP response
pub fn error_response(err: RouterError) -> (StatusCode, Json<ApiError>) {
    let (status, error) = match &err {
        RouterError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "InvalidInput"),
        RouterError::SimulationNotFound(_) => (StatusCode::NOT_FOUND, "SimulationNotFound"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
    };

    if !err.is_user_error() {
        tracing::error!(error = %err, "resolution failed");
    }

    (
        status,
        Json(ApiError {
            error: error.to_string(),
            message: err.to_string(),
        }),
    )
}

/// Resolve request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveModelRequest {
    #[serde(default)]
    pub simulation_id: Option<String>,
}

/// Liveness response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_secs: u64,
    pub cycles_completed: u64,
}

/// API error
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_status_codes() {
        let (status, body) = error_response(RouterError::invalid_input("simulationId is required"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "InvalidInput");

        let (status, body) = error_response(RouterError::SimulationNotFound("x".to_string()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "SimulationNotFound");

        let (status, _) = error_response(RouterError::configuration("bad"));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_request_accepts_missing_id() {
        let request: ResolveModelRequest = serde_json::from_str("{}").unwrap();
        assert!(request.simulation_id.is_none());

        let request: ResolveModelRequest =
            serde_json::from_str(r#"{"simulationId":"sim-frontend-01"}"#).unwrap();
        assert_eq!(request.simulation_id.as_deref(), Some("sim-frontend-01"));
    }
}

//! Model resolution
//!
//! Picks the model that should serve a simulation from the primary model's
//! current health. The secondary model's health is not consulted: when the
//! primary is anything other than `HEALTHY`, the secondary is returned as is.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::SimulationConfig;
use crate::error::{Result, RouterError};
use crate::health::{HealthStatus, HealthTable, ModelHealth};

/// Outcome of a resolution request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    /// Model that should serve the simulation
    pub model_to_use: String,

    /// Whether the secondary model was chosen
    pub fallback_occurred: bool,

    /// Human-readable justification
    pub reason: String,

    /// Primary model's health at decision time
    pub details: ModelHealth,
}

/// Read-only resolver over a simulation catalog and a health table
#[derive(Debug, Clone)]
pub struct ModelResolver {
    simulations: Arc<HashMap<String, SimulationConfig>>,
    table: HealthTable,
}

impl ModelResolver {
    /// Create a resolver
    ///
    /// Later entries win if two simulations share an id.
    pub fn new(simulations: impl IntoIterator<Item = SimulationConfig>, table: HealthTable) -> Self {
        let simulations = simulations
            .into_iter()
            .map(|sim| (sim.id.clone(), sim))
            .collect();

        Self {
            simulations: Arc::new(simulations),
            table,
        }
    }

    /// Look up a simulation by id
    pub fn simulation(&self, simulation_id: &str) -> Option<&SimulationConfig> {
        self.simulations.get(simulation_id)
    }

    /// All simulations, ordered by id
    pub fn simulations(&self) -> Vec<SimulationConfig> {
        let mut sims: Vec<SimulationConfig> = self.simulations.values().cloned().collect();
        sims.sort_by(|a, b| a.id.cmp(&b.id));
        sims
    }

    /// The health table this resolver reads
    pub fn table(&self) -> &HealthTable {
        &self.table
    }

    /// Decide which model should serve `simulation_id` right now
    pub fn resolve(&self, simulation_id: &str) -> Result<ResolutionResult> {
        let simulation_id = simulation_id.trim();
        if simulation_id.is_empty() {
            return Err(RouterError::invalid_input("simulationId is required"));
        }

        let config = self
            .simulations
            .get(simulation_id)
            .ok_or_else(|| RouterError::SimulationNotFound(simulation_id.to_string()))?;

        let primary = self.table.get(&config.primary_model);

        if primary.status == HealthStatus::Healthy {
            debug!(
                %simulation_id,
                model = %config.primary_model,
                "primary model healthy"
            );
            return Ok(ResolutionResult {
                model_to_use: config.primary_model.clone(),
                fallback_occurred: false,
                reason: format!("Primary model {} is healthy.", config.primary_model),
                details: primary,
            });
        }

        let latency = primary
            .latency_ms
            .map(|ms| format!("{}ms", ms))
            .unwrap_or_else(|| "n/a".to_string());

        warn!(
            %simulation_id,
            primary = %config.primary_model,
            secondary = %config.secondary_model,
            status = %primary.status,
            latency = %latency,
            "falling back to secondary model"
        );

        Ok(ResolutionResult {
            model_to_use: config.secondary_model.clone(),
            fallback_occurred: true,
            reason: format!(
                "Primary model {} is unhealthy (Status: {}, Latency: {}). Falling back to {}.",
                config.primary_model, primary.status, latency, config.secondary_model
            ),
            details: primary,
        })
    }
}

//! Router configuration
//!
//! Settings come from an optional YAML, TOML or JSON file, then environment
//! overrides, then validation. Without a file the built-in catalog is used.
//!
//! # Environment Overrides
//!
//! - `ROUTER_LATENCY_THRESHOLD_MS`
//! - `ROUTER_PROBE_INTERVAL_MS`
//! - `ROUTER_PROBE_TIMEOUT_MS`

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, RouterError};
use crate::monitor::{
    MonitorSettings, DEFAULT_LATENCY_THRESHOLD_MS, DEFAULT_PROBE_INTERVAL_MS,
    DEFAULT_PROBE_TIMEOUT_MS,
};
use crate::probe::{HttpProbe, Probe, SimulatedProbe};

/// One interview scenario and its model preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Unique simulation identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Preferred model
    #[serde(alias = "primary_model")]
    pub primary_model: String,

    /// Model used when the primary is not confirmed healthy
    #[serde(alias = "secondary_model")]
    pub secondary_model: String,
}

impl SimulationConfig {
    /// Create a simulation entry
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        primary_model: impl Into<String>,
        secondary_model: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            primary_model: primary_model.into(),
            secondary_model: secondary_model.into(),
        }
    }
}

/// A model the router knows about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEndpoint {
    /// Model identifier
    pub id: String,

    /// Health URL used by the HTTP probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_url: Option<String>,
}

impl ModelEndpoint {
    /// Model without a health URL
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            health_url: None,
        }
    }

    /// Set the health URL
    pub fn with_health_url(mut self, url: impl Into<String>) -> Self {
        self.health_url = Some(url.into());
        self
    }
}

/// Which probe implementation to build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    /// Random latency and failures, no network
    #[default]
    Simulated,
    /// GET each model's `health_url`
    Http,
}

/// Probe selection and simulated-probe tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeSettings {
    /// Probe implementation to build
    #[serde(default)]
    pub kind: ProbeKind,

    /// Probability that a simulated probe fails
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,

    /// Lower bound of simulated probe latency
    #[serde(default = "default_min_latency")]
    pub min_latency_ms: u64,

    /// Upper bound of simulated probe latency
    #[serde(default = "default_max_latency")]
    pub max_latency_ms: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            kind: ProbeKind::default(),
            failure_rate: default_failure_rate(),
            min_latency_ms: default_min_latency(),
            max_latency_ms: default_max_latency(),
        }
    }
}

fn default_failure_rate() -> f64 {
    0.1
}

fn default_min_latency() -> u64 {
    50
}

fn default_max_latency() -> u64 {
    2000
}

fn default_latency_threshold() -> u64 {
    DEFAULT_LATENCY_THRESHOLD_MS
}

fn default_probe_interval() -> u64 {
    DEFAULT_PROBE_INTERVAL_MS
}

fn default_probe_timeout() -> u64 {
    DEFAULT_PROBE_TIMEOUT_MS
}

/// Complete router settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterSettings {
    #[serde(default = "default_latency_threshold")]
    pub latency_threshold_ms: u64,

    #[serde(default = "default_probe_interval")]
    pub probe_interval_ms: u64,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,

    /// Known models; empty means "every model a simulation references"
    #[serde(default)]
    pub models: Vec<ModelEndpoint>,

    #[serde(default)]
    pub simulations: Vec<SimulationConfig>,

    #[serde(default)]
    pub probe: ProbeSettings,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            latency_threshold_ms: DEFAULT_LATENCY_THRESHOLD_MS,
            probe_interval_ms: DEFAULT_PROBE_INTERVAL_MS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            models: vec![
                ModelEndpoint::new("gpt-4o"),
                ModelEndpoint::new("gpt-4o-mini"),
                ModelEndpoint::new("claude-3-sonnet"),
                ModelEndpoint::new("claude-3-opus"),
            ],
            simulations: vec![
                SimulationConfig::new(
                    "sim-frontend-01",
                    "Frontend Engineer Interview",
                    "gpt-4o",
                    "claude-3-sonnet",
                ),
                SimulationConfig::new(
                    "sim-backend-01",
                    "Backend Systems Interview",
                    "claude-3-opus",
                    "gpt-4o",
                ),
                SimulationConfig::new(
                    "sim-behavioral-01",
                    "Behavioral Interview",
                    "gpt-4o-mini",
                    "claude-3-sonnet",
                ),
                SimulationConfig::new(
                    "sim-system-design-01",
                    "System Design Interview",
                    "gpt-4o",
                    "claude-3-opus",
                ),
            ],
            probe: ProbeSettings::default(),
        }
    }
}

impl RouterSettings {
    /// Load settings from an optional file, apply env overrides, validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env_overrides()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse a settings file, picking the format from its extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let settings: Self = match extension.as_deref() {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };

        tracing::debug!(path = %path.display(), "loaded router settings");
        Ok(settings)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let overrides: [(&str, &mut u64); 3] = [
            ("ROUTER_LATENCY_THRESHOLD_MS", &mut self.latency_threshold_ms),
            ("ROUTER_PROBE_INTERVAL_MS", &mut self.probe_interval_ms),
            ("ROUTER_PROBE_TIMEOUT_MS", &mut self.probe_timeout_ms),
        ];

        for (name, field) in overrides {
            if let Some(raw) = lookup(name) {
                *field = raw.trim().parse().map_err(|_| {
                    RouterError::configuration(format!("{} must be an integer, got '{}'", name, raw))
                })?;
                tracing::debug!(variable = name, value = *field, "applied environment override");
            }
        }

        Ok(())
    }

    /// Check settings for consistency
    ///
    /// When `models` is non-empty, every simulation must reference listed
    /// models only.
    pub fn validate(&self) -> Result<()> {
        if self.latency_threshold_ms == 0 {
            return Err(RouterError::configuration("latency_threshold_ms must be greater than 0"));
        }
        if self.probe_interval_ms == 0 {
            return Err(RouterError::configuration("probe_interval_ms must be greater than 0"));
        }
        if self.probe_timeout_ms == 0 {
            return Err(RouterError::configuration("probe_timeout_ms must be greater than 0"));
        }

        let mut seen = HashSet::new();
        for sim in &self.simulations {
            if sim.id.trim().is_empty() {
                return Err(RouterError::configuration("simulation id must not be empty"));
            }
            if !seen.insert(sim.id.as_str()) {
                return Err(RouterError::configuration(format!(
                    "duplicate simulation id '{}'",
                    sim.id
                )));
            }
            if sim.primary_model.trim().is_empty() || sim.secondary_model.trim().is_empty() {
                return Err(RouterError::configuration(format!(
                    "simulation '{}' must name both a primary and a secondary model",
                    sim.id
                )));
            }
        }

        if !self.models.is_empty() {
            let listed: HashSet<&str> = self.models.iter().map(|m| m.id.as_str()).collect();
            for sim in &self.simulations {
                for model in [&sim.primary_model, &sim.secondary_model] {
                    if !listed.contains(model.as_str()) {
                        return Err(RouterError::configuration(format!(
                            "simulation '{}' references unregistered model '{}'",
                            sim.id, model
                        )));
                    }
                }
            }
        }

        let rate = self.probe.failure_rate;
        if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
            return Err(RouterError::configuration(format!(
                "probe.failure_rate must be between 0 and 1, got {}",
                rate
            )));
        }
        if self.probe.min_latency_ms > self.probe.max_latency_ms {
            return Err(RouterError::configuration(format!(
                "probe.min_latency_ms ({}) must not exceed probe.max_latency_ms ({})",
                self.probe.min_latency_ms, self.probe.max_latency_ms
            )));
        }

        if self.probe.kind == ProbeKind::Http {
            for model in self.known_models() {
                let has_url = self
                    .models
                    .iter()
                    .any(|m| m.id == model && m.health_url.is_some());
                if !has_url {
                    tracing::warn!(%model, "no health_url configured; model will always probe unhealthy");
                }
            }
        }

        Ok(())
    }

    /// Key set for the health table
    pub fn known_models(&self) -> BTreeSet<String> {
        let mut models: BTreeSet<String> = self.models.iter().map(|m| m.id.clone()).collect();
        for sim in &self.simulations {
            models.insert(sim.primary_model.clone());
            models.insert(sim.secondary_model.clone());
        }
        models
    }

    /// Timing parameters for the health monitor
    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            latency_threshold_ms: self.latency_threshold_ms,
            probe_interval_ms: self.probe_interval_ms,
            probe_timeout_ms: self.probe_timeout_ms,
        }
    }

    /// Build the configured probe
    pub fn build_probe(&self) -> Result<Arc<dyn Probe>> {
        match self.probe.kind {
            ProbeKind::Simulated => Ok(Arc::new(SimulatedProbe::new(
                self.probe.failure_rate,
                self.probe.min_latency_ms,
                self.probe.max_latency_ms,
            ))),
            ProbeKind::Http => {
                let mut probe = HttpProbe::new(Duration::from_millis(self.probe_timeout_ms))
                    .map_err(|e| RouterError::configuration(e.to_string()))?;
                for model in &self.models {
                    if let Some(url) = &model.health_url {
                        probe.add_target(model.id.clone(), url.clone());
                    }
                }
                Ok(Arc::new(probe))
            }
        }
    }
}

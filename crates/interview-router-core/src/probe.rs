//! Model probes
//!
//! A [`Probe`] performs one health check against one model. The monitor only
//! sees the outcome; how the upstream provider is reached is up to the
//! implementation. Two are provided:
//!
//! - [`HttpProbe`] issues a GET against a per-model health URL
//! - [`SimulatedProbe`] fabricates latency and failures for local runs

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

/// Outcome of a probe that reached its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeOutcome {
    /// Whether the model answered successfully
    pub success: bool,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

impl ProbeOutcome {
    /// Successful probe with the given latency
    pub fn success(latency_ms: u64) -> Self {
        Self {
            success: true,
            latency_ms,
        }
    }

    /// Failed probe with the given latency
    pub fn failure(latency_ms: u64) -> Self {
        Self {
            success: false,
            latency_ms,
        }
    }
}

/// Errors a probe can report instead of an outcome
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The probe did not finish within its time budget
    #[error("Probe timed out after {0}ms")]
    Timeout(u64),

    /// Network or protocol failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The probe has no way to reach this model
    #[error("No probe target configured for model: {0}")]
    UnknownModel(String),
}

/// Health check capability for a single model
///
/// Implementations must be cheap to call repeatedly and safe to share
/// between tasks.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Probe: Send + Sync {
    /// Probe one model
    async fn probe(&self, model: &str) -> Result<ProbeOutcome, ProbeError>;
}

/// Probe that issues `GET <health_url>` for each model
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    targets: HashMap<String, String>,
}

impl HttpProbe {
    /// Create a probe with the given per-request timeout
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("interview-router/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProbeError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            targets: HashMap::new(),
        })
    }

    /// Register a health URL for a model (builder pattern)
    pub fn with_target(mut self, model: impl Into<String>, url: impl Into<String>) -> Self {
        self.targets.insert(model.into(), url.into());
        self
    }

    /// Register a health URL for a model
    pub fn add_target(&mut self, model: impl Into<String>, url: impl Into<String>) {
        self.targets.insert(model.into(), url.into());
    }

    /// Models with a registered health URL
    pub fn targets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.targets.iter().map(|(m, u)| (m.as_str(), u.as_str()))
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, model: &str) -> Result<ProbeOutcome, ProbeError> {
        let url = self
            .targets
            .get(model)
            .ok_or_else(|| ProbeError::UnknownModel(model.to_string()))?;

        let start = Instant::now();
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout(start.elapsed().as_millis() as u64)
            } else {
                ProbeError::Transport(e.to_string())
            }
        })?;
        let latency_ms = start.elapsed().as_millis() as u64;

        if response.status().is_success() {
            Ok(ProbeOutcome::success(latency_ms))
        } else {
            tracing::debug!(%model, status = %response.status(), "health endpoint returned non-2xx");
            Ok(ProbeOutcome::failure(latency_ms))
        }
    }
}

/// Probe that fabricates outcomes without touching the network
///
/// Latency is drawn uniformly from `[min_latency_ms, max_latency_ms]` and the
/// probe actually waits that long, so slow models also slow the cycle.
#[derive(Debug, Clone)]
pub struct SimulatedProbe {
    failure_rate: f64,
    min_latency_ms: u64,
    max_latency_ms: u64,
}

impl SimulatedProbe {
    /// Create a simulated probe
    ///
    /// `failure_rate` is clamped to `[0, 1]` and NaN is treated as 0; the
    /// latency bounds are swapped if given in the wrong order.
    pub fn new(failure_rate: f64, min_latency_ms: u64, max_latency_ms: u64) -> Self {
        let (min_latency_ms, max_latency_ms) = if min_latency_ms <= max_latency_ms {
            (min_latency_ms, max_latency_ms)
        } else {
            (max_latency_ms, min_latency_ms)
        };

        let failure_rate = if failure_rate.is_nan() {
            0.0
        } else {
            failure_rate.clamp(0.0, 1.0)
        };

        Self {
            failure_rate,
            min_latency_ms,
            max_latency_ms,
        }
    }

    fn draw(&self) -> ProbeOutcome {
        let mut rng = rand::thread_rng();
        let latency_ms = rng.gen_range(self.min_latency_ms..=self.max_latency_ms);
        let success = !rng.gen_bool(self.failure_rate);
        ProbeOutcome {
            success,
            latency_ms,
        }
    }
}

impl Default for SimulatedProbe {
    fn default() -> Self {
        Self::new(0.1, 50, 2000)
    }
}

#[async_trait]
impl Probe for SimulatedProbe {
    async fn probe(&self, _model: &str) -> Result<ProbeOutcome, ProbeError> {
        let outcome = self.draw();
        tokio::time::sleep(Duration::from_millis(outcome.latency_ms)).await;
        Ok(outcome)
    }
}

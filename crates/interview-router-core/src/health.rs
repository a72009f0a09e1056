//! Shared model health state
//!
//! The [`HealthTable`] is the only shared mutable state in the router. The
//! health monitor is its single writer; resolvers read from it concurrently.
//! Keys are fixed when the table is built and every entry is replaced as a
//! whole, so a reader never sees a status from one probe paired with the
//! latency of another.

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Health classification of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    /// No probe has completed for this model yet
    Unknown,
    /// Last probe succeeded under the latency threshold
    Healthy,
    /// Last probe failed, timed out, or was too slow
    Unhealthy,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Unknown => write!(f, "UNKNOWN"),
            HealthStatus::Healthy => write!(f, "HEALTHY"),
            HealthStatus::Unhealthy => write!(f, "UNHEALTHY"),
        }
    }
}

/// Latest known health of a single model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelHealth {
    /// Current classification
    pub status: HealthStatus,

    /// Latency reported by the last probe, if any
    pub latency_ms: Option<u64>,

    /// When the last probe completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_at: Option<DateTime<Utc>>,
}

impl ModelHealth {
    /// Entry for a model that has never been probed
    pub fn unknown() -> Self {
        Self {
            status: HealthStatus::Unknown,
            latency_ms: None,
            checked_at: None,
        }
    }

    /// Entry for a completed probe
    pub fn probed(status: HealthStatus, latency_ms: Option<u64>) -> Self {
        Self {
            status,
            latency_ms,
            checked_at: Some(Utc::now()),
        }
    }

    /// Whether the model is confirmed healthy
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

impl Default for ModelHealth {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Model id → latest health, with a key set fixed at construction
///
/// Cloning is cheap and every clone observes the same entries, so one table
/// can be handed to both the monitor and any number of resolvers.
#[derive(Clone, Default)]
pub struct HealthTable {
    entries: Arc<HashMap<String, ArcSwap<ModelHealth>>>,
}

impl HealthTable {
    /// Create a table with every model in `UNKNOWN` state
    pub fn new<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = models
            .into_iter()
            .map(|model| (model.into(), ArcSwap::from_pointee(ModelHealth::unknown())))
            .collect();

        Self {
            entries: Arc::new(entries),
        }
    }

    /// Current entry for a model
    ///
    /// Models outside the key set read as `UNKNOWN`.
    pub fn get(&self, model: &str) -> ModelHealth {
        self.entries
            .get(model)
            .map(|entry| ModelHealth::clone(&entry.load()))
            .unwrap_or_default()
    }

    /// Replace a model's entry
    ///
    /// Returns `false` and leaves the table untouched if the model is not
    /// part of the key set.
    pub fn record(&self, model: &str, health: ModelHealth) -> bool {
        match self.entries.get(model) {
            Some(entry) => {
                entry.store(Arc::new(health));
                true
            }
            None => false,
        }
    }

    /// Whether the model is part of the key set
    pub fn contains(&self, model: &str) -> bool {
        self.entries.contains_key(model)
    }

    /// Model identifiers in sorted order
    pub fn models(&self) -> Vec<String> {
        let mut models: Vec<String> = self.entries.keys().cloned().collect();
        models.sort();
        models
    }

    /// Copy of every entry, ordered by model id
    pub fn snapshot(&self) -> BTreeMap<String, ModelHealth> {
        self.entries
            .iter()
            .map(|(model, entry)| (model.clone(), ModelHealth::clone(&entry.load())))
            .collect()
    }

    /// Number of models tracked
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table tracks no models
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for HealthTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.snapshot()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_table_is_unknown() {
        let table = HealthTable::new(["gpt-4o", "claude-3-sonnet"]);

        assert_eq!(table.len(), 2);
        for model in table.models() {
            let health = table.get(&model);
            assert_eq!(health.status, HealthStatus::Unknown);
            assert_eq!(health.latency_ms, None);
            assert!(health.checked_at.is_none());
        }
    }

    #[test]
    fn test_record_replaces_whole_entry() {
        let table = HealthTable::new(["gpt-4o"]);

        assert!(table.record("gpt-4o", ModelHealth::probed(HealthStatus::Healthy, Some(120))));
        let health = table.get("gpt-4o");
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.latency_ms, Some(120));
        assert!(health.checked_at.is_some());

        assert!(table.record("gpt-4o", ModelHealth::probed(HealthStatus::Unhealthy, Some(5200))));
        let health = table.get("gpt-4o");
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(health.latency_ms, Some(5200));
    }

    #[test]
    fn test_key_set_is_fixed() {
        let table = HealthTable::new(["gpt-4o"]);

        assert!(!table.record("mystery-model", ModelHealth::probed(HealthStatus::Healthy, Some(1))));
        assert!(!table.contains("mystery-model"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("mystery-model").status, HealthStatus::Unknown);
    }

    #[test]
    fn test_clones_share_entries() {
        let table = HealthTable::new(["gpt-4o"]);
        let reader = table.clone();

        table.record("gpt-4o", ModelHealth::probed(HealthStatus::Healthy, Some(80)));
        assert!(reader.get("gpt-4o").is_healthy());
    }

    #[test]
    fn test_separate_tables_are_independent() {
        let a = HealthTable::new(["gpt-4o"]);
        let b = HealthTable::new(["gpt-4o"]);

        a.record("gpt-4o", ModelHealth::probed(HealthStatus::Healthy, Some(80)));
        assert_eq!(b.get("gpt-4o").status, HealthStatus::Unknown);
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let table = HealthTable::new(["gpt-4o", "claude-3-sonnet", "claude-3-opus"]);
        let keys: Vec<_> = table.snapshot().into_keys().collect();
        assert_eq!(keys, vec!["claude-3-opus", "claude-3-sonnet", "gpt-4o"]);
    }

    #[test]
    fn test_model_health_serialization() {
        let health = ModelHealth {
            status: HealthStatus::Unhealthy,
            latency_ms: Some(5200),
            checked_at: None,
        };
        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["status"], "UNHEALTHY");
        assert_eq!(json["latencyMs"], 5200);
        assert!(json.get("checkedAt").is_none());

        let unknown = serde_json::to_value(ModelHealth::unknown()).unwrap();
        assert_eq!(unknown["status"], "UNKNOWN");
        assert!(unknown["latencyMs"].is_null());
    }

    #[test]
    fn test_concurrent_readers_see_consistent_pairs() {
        let table = HealthTable::new(["gpt-4o"]);
        let writer = table.clone();

        let handle = std::thread::spawn(move || {
            for i in 0..2000u64 {
                let health = if i % 2 == 0 {
                    ModelHealth::probed(HealthStatus::Healthy, Some(100))
                } else {
                    ModelHealth::probed(HealthStatus::Unhealthy, Some(9000))
                };
                writer.record("gpt-4o", health);
            }
        });

        for _ in 0..2000 {
            let health = table.get("gpt-4o");
            match health.status {
                HealthStatus::Healthy => assert_eq!(health.latency_ms, Some(100)),
                HealthStatus::Unhealthy => assert_eq!(health.latency_ms, Some(9000)),
                HealthStatus::Unknown => assert_eq!(health.latency_ms, None),
            }
        }

        handle.join().unwrap();
    }
}

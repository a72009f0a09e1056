//! Interview Router Core
//!
//! Health monitoring and primary/secondary failover for the models that
//! serve interview simulations.
//!
//! # Architecture
//!
//! ```text
//! HealthMonitor ──(probe, classify, record)──▶ HealthTable ◀──(read)── ModelResolver
//!       │                                                                  │
//!       └── Probe (HttpProbe | SimulatedProbe | custom)    resolve(simulation_id)
//! ```
//!
//! The monitor and the resolver never talk to each other; the table is
//! their only shared state. Both receive the same [`HealthTable`] at
//! construction, so independent instances can coexist in one process.
//!
//! # Example
//!
//! ```rust,ignore
//! use interview_router_core::{HealthMonitor, HealthTable, ModelResolver, RouterSettings};
//! use std::sync::Arc;
//!
//! let settings = RouterSettings::load(None)?;
//! let table = HealthTable::new(settings.known_models());
//! let monitor = Arc::new(HealthMonitor::new(
//!     table.clone(),
//!     settings.build_probe()?,
//!     settings.monitor_settings(),
//! ));
//! let handle = monitor.start().await;
//!
//! let resolver = ModelResolver::new(settings.simulations.clone(), table);
//! let result = resolver.resolve("sim-frontend-01")?;
//!
//! handle.stop().await;
//! ```

pub mod config;
pub mod error;
pub mod health;
pub mod monitor;
pub mod probe;
pub mod resolver;

pub use config::{ModelEndpoint, ProbeKind, ProbeSettings, RouterSettings, SimulationConfig};
pub use error::{Result, RouterError};
pub use health::{HealthStatus, HealthTable, ModelHealth};
pub use monitor::{classify, HealthMonitor, MonitorHandle, MonitorSettings};
pub use probe::{HttpProbe, Probe, ProbeError, ProbeOutcome, SimulatedProbe};
pub use resolver::{ModelResolver, ResolutionResult};

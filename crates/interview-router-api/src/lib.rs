//! Interview Router API
//!
//! HTTP surface over the interview router core. The server owns the
//! process lifecycle: it builds one health table, hands it to the monitor
//! and the resolver, and runs the monitor for as long as it serves.

pub mod handler;

use std::sync::Arc;

use interview_router_core::{HealthMonitor, HealthTable, ModelResolver, Result, RouterSettings};

/// Build a monitor and a resolver sharing one health table
pub fn build_components(settings: &RouterSettings) -> Result<(ModelResolver, Arc<HealthMonitor>)> {
    let table = HealthTable::new(settings.known_models());
    let probe = settings.build_probe()?;
    let monitor = Arc::new(HealthMonitor::new(
        table.clone(),
        probe,
        settings.monitor_settings(),
    ));
    let resolver = ModelResolver::new(settings.simulations.clone(), table);
    Ok((resolver, monitor))
}

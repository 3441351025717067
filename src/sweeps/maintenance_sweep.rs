/// DB maintenance sweep (SPEC_FULL.md §4.8): purges expired rows, checkpoints
/// the WAL, and vacuums on a slower cadence.
use std::sync::Arc;

use crate::config::EventsConfig;
use crate::logger::{self, LogTag};
use crate::store::EventStore;

pub async fn run_once(store: &Arc<EventStore>, config: &EventsConfig, run_vacuum: bool) {
    let report = store.run_maintenance(config.max_sol_flow_age_days, config.max_event_age_days).await;
    if let Err(e) = store.wal_checkpoint().await {
        logger::warning(LogTag::Sweep, &format!("maintenance_sweep: wal_checkpoint failed: {}", e));
    }

    if run_vacuum {
        if let Err(e) = store.incremental_vacuum().await {
            logger::warning(LogTag::Sweep, &format!("maintenance_sweep: incremental_vacuum failed: {}", e));
        }
    }

    logger::info(
        LogTag::Sweep,
        &format!(
            "maintenance_sweep: purged {} cache rows, {} sol_flows, {} events",
            report.cache_rows_purged, report.sol_flows_purged, report.events_purged
        ),
    );
}

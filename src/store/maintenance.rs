use crate::logger::{self, LogTag};

use super::EventStore;

/// Outcome of one maintenance pass, logged at INFO
/// (SPEC_FULL.md §4.8 "DB maintenance").
#[derive(Debug, Default)]
pub struct MaintenanceReport {
    pub cache_rows_purged: usize,
    pub sol_flows_purged: usize,
    pub events_purged: usize,
}

impl EventStore {
    /// Purges expired cache rows plus sol_flows/events past their retention
    /// windows; runs every 6h per the sweep schedule (SPEC_FULL.md §4.8).
    pub async fn run_maintenance(&self, max_sol_flow_age_days: i64, max_event_age_days: i64) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();

        match self.cache_purge_expired().await {
            Ok(n) => report.cache_rows_purged = n,
            Err(e) => logger::warning(LogTag::EventStore, &format!("cache purge failed: {}", e)),
        }
        match self.purge_old_sol_flows(max_sol_flow_age_days).await {
            Ok(n) => report.sol_flows_purged = n,
            Err(e) => logger::warning(LogTag::EventStore, &format!("sol_flows purge failed: {}", e)),
        }
        match self.purge_old_events(max_event_age_days).await {
            Ok(n) => report.events_purged = n,
            Err(e) => logger::warning(LogTag::EventStore, &format!("events purge failed: {}", e)),
        }

        logger::info(
            LogTag::EventStore,
            &format!(
                "maintenance: {} cache rows, {} sol_flows, {} events purged",
                report.cache_rows_purged, report.sol_flows_purged, report.events_purged
            ),
        );
        report
    }

    /// Forces a WAL checkpoint (SPEC_FULL.md §4.8).
    pub async fn wal_checkpoint(&self) -> Result<(), String> {
        let conn = self.get_write_connection()?;
        conn.pragma_update(None, "wal_checkpoint", "PASSIVE")
            .map_err(|e| format!("wal_checkpoint failed: {}", e))?;
        Ok(())
    }

    /// Runs SQLite's incremental vacuum; called roughly every 24h
    /// (SPEC_FULL.md §4.8).
    pub async fn incremental_vacuum(&self) -> Result<(), String> {
        let conn = self.get_write_connection()?;
        conn.execute_batch("PRAGMA incremental_vacuum;")
            .map_err(|e| format!("incremental_vacuum failed: {}", e))?;
        Ok(())
    }
}

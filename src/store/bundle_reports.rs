use rusqlite::{params, OptionalExtension};

use crate::model::bundle::BundleExtractionReport;

use super::{now_unix, EventStore};

const FRESHNESS_SECS: f64 = 24.0 * 3600.0;

impl EventStore {
    pub async fn bundle_report_upsert(&self, report: &BundleExtractionReport) -> Result<(), String> {
        let conn = self.get_write_connection()?;
        let report_json = serde_json::to_string(report).map_err(|e| format!("bundle report serialize failed: {}", e))?;
        conn.execute(
            "INSERT INTO bundle_reports (mint, deployer, report_json, recorded_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(mint) DO UPDATE SET deployer = excluded.deployer, report_json = excluded.report_json, recorded_at = excluded.recorded_at",
            params![report.mint, report.deployer, report_json, now_unix()],
        )
        .map_err(|e| format!("bundle_report_upsert failed: {}", e))?;
        Ok(())
    }

    /// Returns the cached report only if recorded within the 24-h freshness
    /// window (SPEC_FULL.md §4.5, §6).
    pub async fn bundle_report_get_fresh(&self, mint: &str) -> Result<Option<BundleExtractionReport>, String> {
        let conn = self.get_read_connection()?;
        let cutoff = now_unix() - FRESHNESS_SECS;
        let row: Option<String> = conn
            .query_row(
                "SELECT report_json FROM bundle_reports WHERE mint = ?1 AND recorded_at >= ?2",
                params![mint, cutoff],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| format!("bundle_report_get_fresh failed: {}", e))?;

        match row {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| format!("bundle_report_get_fresh decode failed: {}", e)),
            None => Ok(None),
        }
    }

    /// Count of prior bundle reports in which `wallet` appears as a bundle
    /// buyer, used by `prior_bundle_count` (SPEC_FULL.md §4.5 Phase 2).
    pub async fn count_prior_bundle_appearances(&self, wallet: &str) -> Result<u64, String> {
        let conn = self.get_read_connection()?;
        let mut stmt = conn
            .prepare("SELECT report_json FROM bundle_reports")
            .map_err(|e| format!("count_prior_bundle_appearances prepare failed: {}", e))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| format!("count_prior_bundle_appearances failed: {}", e))?;

        let mut count = 0u64;
        for row in rows {
            let json = row.map_err(|e| format!("count_prior_bundle_appearances row decode failed: {}", e))?;
            if let Ok(report) = serde_json::from_str::<BundleExtractionReport>(&json) {
                if report.wallets.iter().any(|w| w.wallet == wallet) {
                    count += 1;
                }
            }
        }
        Ok(count)
    }
}

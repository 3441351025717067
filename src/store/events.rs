use chrono::{DateTime, Utc};
use rusqlite::{params, ToSql};

use crate::model::events::{EventType, TokenEvent};

use super::{now_unix, EventStore};

fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<TokenEvent> {
    let event_type: String = row.get("event_type")?;
    let created_at: Option<String> = row.get("created_at")?;
    let rugged_at: Option<String> = row.get("rugged_at")?;
    let recorded_at: f64 = row.get("recorded_at")?;
    let extra_json: String = row.get("extra_json")?;

    Ok(TokenEvent {
        id: row.get("id")?,
        event_type: EventType::from_str(&event_type).unwrap_or(EventType::TokenCreated),
        mint: row.get("mint")?,
        deployer: row.get("deployer")?,
        name: row.get("name")?,
        symbol: row.get("symbol")?,
        narrative: row.get("narrative")?,
        mcap_usd: row.get("mcap_usd")?,
        liq_usd: row.get("liq_usd")?,
        created_at: created_at.and_then(|s| DateTime::parse_from_rfc3339(&s).ok()).map(|d| d.with_timezone(&Utc)),
        rugged_at: rugged_at.and_then(|s| DateTime::parse_from_rfc3339(&s).ok()).map(|d| d.with_timezone(&Utc)),
        recorded_at: DateTime::from_timestamp(recorded_at as i64, 0).unwrap_or_else(Utc::now),
        extra: serde_json::from_str(&extra_json).unwrap_or(serde_json::json!({})),
    })
}

impl EventStore {
    /// Appends a row with server-side `recorded_at` (SPEC_FULL.md §4.2).
    pub async fn insert_event(&self, event: &TokenEvent) -> Result<i64, String> {
        let conn = self.get_write_connection()?;
        let extra_json = serde_json::to_string(&event.extra).unwrap_or_else(|_| "{}".to_string());
        conn.execute(
            "INSERT INTO intelligence_events
                (event_type, mint, deployer, name, symbol, narrative, mcap_usd, liq_usd, created_at, rugged_at, recorded_at, extra_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                event.event_type.as_str(),
                event.mint,
                event.deployer,
                event.name,
                event.symbol,
                event.narrative,
                event.mcap_usd,
                event.liq_usd,
                event.created_at.map(|d| d.to_rfc3339()),
                event.rugged_at.map(|d| d.to_rfc3339()),
                now_unix(),
                extra_json,
            ],
        )
        .map_err(|e| format!("insert_event failed: {}", e))?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent `token_created` row for `mint`, used both to guard
    /// against re-inserting the launch event on every `analyze()` call and
    /// as the read side of the signal 6-8 lazy-enrichment cache
    /// (SPEC_FULL.md §4.7).
    pub async fn get_token_created_event(&self, mint: &str) -> Result<Option<TokenEvent>, String> {
        let rows = self
            .query_events("event_type = ?1 AND mint = ?2", &[&EventType::TokenCreated.as_str(), &mint], 1, "recorded_at DESC")
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Merges `extra` into the `extra_json` of an existing row by id
    /// (SPEC_FULL.md §4.7 "lazily populate extra_json on the first run and
    /// cache the result"). Does not touch any other column; the row's
    /// identity, mint and recorded history are unaffected.
    pub async fn update_event_extra(&self, id: i64, extra: &serde_json::Value) -> Result<(), String> {
        let conn = self.get_write_connection()?;
        let extra_json = serde_json::to_string(extra).unwrap_or_else(|_| "{}".to_string());
        conn.execute("UPDATE intelligence_events SET extra_json = ?1 WHERE id = ?2", params![extra_json, id])
            .map_err(|e| format!("update_event_extra failed: {}", e))?;
        Ok(())
    }

    /// Generic parameterised read (SPEC_FULL.md §4.2 `query_events`).
    ///
    /// `where_clause` is trusted in-process code (built from static strings
    /// by callers, never from user input); `params` are bound positionally.
    pub async fn query_events(
        &self,
        where_clause: &str,
        params_list: &[&dyn ToSql],
        limit: usize,
        order_by: &str,
    ) -> Result<Vec<TokenEvent>, String> {
        let conn = self.get_read_connection()?;
        let sql = format!(
            "SELECT id, event_type, mint, deployer, name, symbol, narrative, mcap_usd, liq_usd,
                    created_at, rugged_at, recorded_at, extra_json
             FROM intelligence_events
             WHERE {}
             ORDER BY {}
             LIMIT {}",
            where_clause, order_by, limit
        );
        let mut stmt = conn.prepare(&sql).map_err(|e| format!("query_events prepare failed: {}", e))?;
        let rows = stmt
            .query_map(params_list, row_to_event)
            .map_err(|e| format!("query_events failed: {}", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("query_events row decode failed: {}", e))
    }

    pub async fn get_events_by_mint(&self, mint: &str, limit: usize) -> Result<Vec<TokenEvent>, String> {
        self.query_events("mint = ?1", &[&mint], limit, "recorded_at DESC").await
    }

    /// Count of prior `token_created` events by `deployer` recorded before
    /// `before`, used by Bundle Phase 2's `same_deployer_prior_launches`
    /// (SPEC_FULL.md §4.5 Phase 2, §9 resolved open question #2).
    pub async fn count_prior_launches(&self, deployer: &str, before: DateTime<Utc>) -> Result<u64, String> {
        let conn = self.get_read_connection()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM intelligence_events
                 WHERE event_type = ?1 AND deployer = ?2 AND recorded_at < ?3",
                params![EventType::TokenCreated.as_str(), deployer, before.timestamp() as f64],
                |row| row.get(0),
            )
            .map_err(|e| format!("count_prior_launches failed: {}", e))?;
        Ok(count.max(0) as u64)
    }

    /// Deployers with at least `min_tokens` recorded `token_created` events,
    /// used by the hourly cartel sweep (SPEC_FULL.md §4.8 "Cartel sweep").
    pub async fn deployers_with_min_launches(&self, min_tokens: usize) -> Result<Vec<String>, String> {
        let conn = self.get_read_connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT deployer FROM intelligence_events
                 WHERE event_type = ?1 AND deployer IS NOT NULL
                 GROUP BY deployer HAVING COUNT(*) >= ?2",
            )
            .map_err(|e| format!("deployers_with_min_launches prepare failed: {}", e))?;
        let rows = stmt
            .query_map(params![EventType::TokenCreated.as_str(), min_tokens as i64], |row| row.get::<_, String>(0))
            .map_err(|e| format!("deployers_with_min_launches failed: {}", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("deployers_with_min_launches row decode failed: {}", e))
    }

    /// Every distinct address that has ever appeared as a deployer, used by
    /// cartel signals that need to test "is this a known deployer wallet"
    /// (SPEC_FULL.md §4.7 signals 2, 6).
    pub async fn all_deployers(&self) -> Result<std::collections::HashSet<String>, String> {
        let conn = self.get_read_connection()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT deployer FROM intelligence_events WHERE event_type = ?1 AND deployer IS NOT NULL")
            .map_err(|e| format!("all_deployers prepare failed: {}", e))?;
        let rows = stmt
            .query_map(params![EventType::TokenCreated.as_str()], |row| row.get::<_, String>(0))
            .map_err(|e| format!("all_deployers failed: {}", e))?;
        rows.collect::<Result<std::collections::HashSet<_>, _>>()
            .map_err(|e| format!("all_deployers row decode failed: {}", e))
    }

    /// Every `token_created` event recorded for `deployer`, oldest first.
    pub async fn get_launches_by_deployer(&self, deployer: &str) -> Result<Vec<TokenEvent>, String> {
        self.query_events("event_type = ?1 AND deployer = ?2", &[&EventType::TokenCreated.as_str(), &deployer], 10_000, "recorded_at ASC").await
    }

    /// Rug confirmations (`token_rugged` events) recorded for `mint`s created
    /// by `deployer`.
    pub async fn count_rugs_by_deployer(&self, deployer: &str) -> Result<u64, String> {
        let conn = self.get_read_connection()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM intelligence_events
                 WHERE event_type = ?1 AND deployer = ?2",
                params![EventType::TokenRugged.as_str(), deployer],
                |row| row.get(0),
            )
            .map_err(|e| format!("count_rugs_by_deployer failed: {}", e))?;
        Ok(count.max(0) as u64)
    }

    /// Deletes events older than `max_age_days`; used by DB maintenance
    /// (SPEC_FULL.md §4.8).
    pub async fn purge_old_events(&self, max_age_days: i64) -> Result<usize, String> {
        let conn = self.get_write_connection()?;
        let cutoff = now_unix() - (max_age_days as f64 * 86_400.0);
        conn.execute("DELETE FROM intelligence_events WHERE recorded_at < ?1", params![cutoff])
            .map_err(|e| format!("purge_old_events failed: {}", e))
    }
}

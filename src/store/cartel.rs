use rusqlite::params;

use crate::model::cartel::{CartelEdge, SignalType};

use super::{now_unix, EventStore};

impl EventStore {
    /// Normalises the wallet pair, then replaces strength/evidence only if
    /// the new strength is >= the stored one (SPEC_FULL.md §4.2, §8
    /// round-trip property: `upsert(a,b,..s1); upsert(b,a,..s2)` yields one
    /// row with `strength = max(s1,s2)`).
    pub async fn cartel_edge_upsert(&self, edge: &CartelEdge) -> Result<(), String> {
        let (wallet_a, wallet_b) = CartelEdge::normalize_pair(edge.wallet_a.clone(), edge.wallet_b.clone());
        let conn = self.get_write_connection()?;
        let evidence_json = serde_json::to_string(&edge.evidence).unwrap_or_else(|_| "{}".to_string());
        conn.execute(
            "INSERT INTO cartel_edges (wallet_a, wallet_b, signal_type, signal_strength, evidence_json, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(wallet_a, wallet_b, signal_type) DO UPDATE SET
                signal_strength = MAX(signal_strength, excluded.signal_strength),
                evidence_json = CASE WHEN excluded.signal_strength >= signal_strength THEN excluded.evidence_json ELSE evidence_json END,
                recorded_at = excluded.recorded_at",
            params![
                wallet_a,
                wallet_b,
                edge.signal_type.as_str(),
                edge.signal_strength,
                evidence_json,
                now_unix(),
            ],
        )
        .map_err(|e| format!("cartel_edge_upsert failed: {}", e))?;
        Ok(())
    }

    /// All edges touching `wallet`, for community-detection fan-in
    /// (SPEC_FULL.md §4.7 "Load all edges involving the deployer").
    pub async fn cartel_edges_for_wallet(&self, wallet: &str) -> Result<Vec<CartelEdge>, String> {
        let conn = self.get_read_connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT wallet_a, wallet_b, signal_type, signal_strength, evidence_json, recorded_at
                 FROM cartel_edges WHERE wallet_a = ?1 OR wallet_b = ?1",
            )
            .map_err(|e| format!("cartel_edges_for_wallet prepare failed: {}", e))?;
        let rows = stmt
            .query_map(params![wallet], row_to_edge)
            .map_err(|e| format!("cartel_edges_for_wallet failed: {}", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("cartel_edges_for_wallet row decode failed: {}", e))
    }

    pub async fn cartel_edges_all(&self) -> Result<Vec<CartelEdge>, String> {
        let conn = self.get_read_connection()?;
        let mut stmt = conn
            .prepare("SELECT wallet_a, wallet_b, signal_type, signal_strength, evidence_json, recorded_at FROM cartel_edges")
            .map_err(|e| format!("cartel_edges_all prepare failed: {}", e))?;
        let rows = stmt
            .query_map([], row_to_edge)
            .map_err(|e| format!("cartel_edges_all failed: {}", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("cartel_edges_all row decode failed: {}", e))
    }

    /// Records a shared operator fingerprint mapping
    /// (feeds signal 1, `dna_match`, SPEC_FULL.md §4.7).
    pub async fn record_operator_mapping(&self, fingerprint: &str, wallet: &str) -> Result<(), String> {
        let conn = self.get_write_connection()?;
        conn.execute(
            "INSERT OR IGNORE INTO operator_mappings (fingerprint, wallet, recorded_at) VALUES (?1, ?2, ?3)",
            params![fingerprint, wallet, now_unix()],
        )
        .map_err(|e| format!("record_operator_mapping failed: {}", e))?;
        Ok(())
    }

    /// Wallet groups that share an operator fingerprint
    /// (SPEC_FULL.md §4.7 signal 1).
    pub async fn operator_fingerprint_groups(&self) -> Result<Vec<(String, Vec<String>)>, String> {
        let conn = self.get_read_connection()?;
        let mut stmt = conn
            .prepare("SELECT fingerprint, wallet FROM operator_mappings ORDER BY fingerprint")
            .map_err(|e| format!("operator_fingerprint_groups prepare failed: {}", e))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|e| format!("operator_fingerprint_groups failed: {}", e))?;

        let mut groups: std::collections::BTreeMap<String, Vec<String>> = std::collections::BTreeMap::new();
        for pair in rows {
            let (fingerprint, wallet) = pair.map_err(|e| format!("operator_fingerprint_groups row decode failed: {}", e))?;
            groups.entry(fingerprint).or_default().push(wallet);
        }
        Ok(groups.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::cartel::SignalType;

    async fn temp_store() -> EventStore {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.db");
        // Leak the tempdir so the file isn't removed before the store closes.
        std::mem::forget(dir);
        EventStore::new(path.to_str().unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn upsert_normalizes_pair_and_keeps_max_strength() {
        let store = temp_store().await;

        let e1 = CartelEdge::new("wallet_y", "wallet_x", SignalType::SolTransfer, 0.4, serde_json::json!({"n": 1}));
        store.cartel_edge_upsert(&e1).await.unwrap();

        // Re-emit with the pair reversed and a lower strength: row must stay at 0.4.
        let e2 = CartelEdge::new("wallet_x", "wallet_y", SignalType::SolTransfer, 0.2, serde_json::json!({"n": 2}));
        store.cartel_edge_upsert(&e2).await.unwrap();

        let edges = store.cartel_edges_for_wallet("wallet_x").await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].wallet_a, "wallet_x");
        assert_eq!(edges[0].wallet_b, "wallet_y");
        assert_eq!(edges[0].signal_strength, 0.4);

        // A higher-strength re-emission replaces both strength and evidence.
        let e3 = CartelEdge::new("wallet_x", "wallet_y", SignalType::SolTransfer, 0.9, serde_json::json!({"n": 3}));
        store.cartel_edge_upsert(&e3).await.unwrap();
        let edges = store.cartel_edges_for_wallet("wallet_x").await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].signal_strength, 0.9);
        assert_eq!(edges[0].evidence, serde_json::json!({"n": 3}));
    }

    #[tokio::test]
    async fn distinct_signal_types_get_distinct_rows() {
        let store = temp_store().await;

        store
            .cartel_edge_upsert(&CartelEdge::new("a", "b", SignalType::DnaMatch, 0.95, serde_json::json!({})))
            .await
            .unwrap();
        store
            .cartel_edge_upsert(&CartelEdge::new("a", "b", SignalType::TimingSync, 0.5, serde_json::json!({})))
            .await
            .unwrap();

        let edges = store.cartel_edges_for_wallet("a").await.unwrap();
        assert_eq!(edges.len(), 2);
    }
}

fn row_to_edge(row: &rusqlite::Row) -> rusqlite::Result<CartelEdge> {
    let signal_type: String = row.get(2)?;
    let evidence_json: String = row.get(4)?;
    let recorded_at: f64 = row.get(5)?;
    Ok(CartelEdge {
        wallet_a: row.get(0)?,
        wallet_b: row.get(1)?,
        signal_type: SignalType::from_str(&signal_type).unwrap_or(SignalType::SolTransfer),
        signal_strength: row.get(3)?,
        evidence: serde_json::from_str(&evidence_json).unwrap_or(serde_json::json!({})),
        recorded_at: chrono::DateTime::from_timestamp(recorded_at as i64, 0).unwrap_or_else(chrono::Utc::now),
    })
}

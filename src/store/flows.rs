use rusqlite::params;

use crate::model::flow::{EntityType, LabeledEdge, SolFlowEdge};
use crate::wallet_labels;

use super::{now_unix, EventStore};

impl EventStore {
    /// Idempotent on `(mint, signature, from_address, to_address)`
    /// (SPEC_FULL.md §4.2, §8 round-trip property).
    pub async fn sol_flow_insert_batch(&self, rows: &[SolFlowEdge]) -> Result<usize, String> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut conn = self.get_write_connection()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| format!("sol_flow_insert_batch begin failed: {}", e))?;
        let mut inserted = 0usize;
        for row in rows {
            let changed = tx
                .execute(
                    "INSERT OR IGNORE INTO sol_flows
                        (mint, from_address, to_address, amount_lamports, signature, slot, block_time, hop)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        row.mint,
                        row.from_address,
                        row.to_address,
                        row.amount_lamports as i64,
                        row.signature,
                        row.slot as i64,
                        row.block_time,
                        row.hop as i64,
                    ],
                )
                .map_err(|e| format!("sol_flow_insert_batch insert failed: {}", e))?;
            inserted += changed;
        }
        tx.commit().map_err(|e| format!("sol_flow_insert_batch commit failed: {}", e))?;
        Ok(inserted)
    }

    /// Reconstructs the persisted edges for a mint without re-running the
    /// BFS (SPEC_FULL.md §4.6 "served straight from the `sol_flows` table").
    pub async fn get_sol_flow_rows(&self, mint: &str) -> Result<Vec<SolFlowEdge>, String> {
        let conn = self.get_read_connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT mint, from_address, to_address, amount_lamports, signature, slot, block_time, hop
                 FROM sol_flows WHERE mint = ?1 ORDER BY hop ASC, slot ASC",
            )
            .map_err(|e| format!("get_sol_flow_rows prepare failed: {}", e))?;
        let rows = stmt
            .query_map(params![mint], |row| {
                Ok(SolFlowEdge {
                    mint: row.get(0)?,
                    from_address: row.get(1)?,
                    to_address: row.get(2)?,
                    amount_lamports: row.get::<_, i64>(3)? as u64,
                    signature: row.get(4)?,
                    slot: row.get::<_, i64>(5)? as u64,
                    block_time: row.get(6)?,
                    hop: row.get::<_, i64>(7)? as usize,
                })
            })
            .map_err(|e| format!("get_sol_flow_rows failed: {}", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("get_sol_flow_rows row decode failed: {}", e))
    }

    /// Labels stored edges with the static wallet-identity classifier
    /// (SPEC_FULL.md §4.6 step 5, §4.11).
    pub async fn get_labeled_sol_flow(&self, mint: &str) -> Result<Vec<LabeledEdge>, String> {
        let rows = self.get_sol_flow_rows(mint).await?;
        Ok(rows
            .into_iter()
            .map(|edge| {
                let (from_label, from_entity) = wallet_labels::classify_address(&edge.from_address);
                let (to_label, to_entity) = wallet_labels::classify_address(&edge.to_address);
                LabeledEdge {
                    entity_type: to_entity.or(from_entity).map(|_| to_entity.unwrap_or(EntityType::Wallet)),
                    from_label,
                    to_label,
                    edge,
                }
            })
            .collect())
    }

    /// Hop-0 edges originating from `wallet` across every traced mint, used
    /// by the cartel `sol_transfer` signal (SPEC_FULL.md §4.7 signal 2).
    pub async fn sol_flow_edges_from(&self, wallet: &str) -> Result<Vec<SolFlowEdge>, String> {
        let conn = self.get_read_connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT mint, from_address, to_address, amount_lamports, signature, slot, block_time, hop
                 FROM sol_flows WHERE from_address = ?1 AND hop = 0",
            )
            .map_err(|e| format!("sol_flow_edges_from prepare failed: {}", e))?;
        let rows = stmt
            .query_map(params![wallet], |row| {
                Ok(SolFlowEdge {
                    mint: row.get(0)?,
                    from_address: row.get(1)?,
                    to_address: row.get(2)?,
                    amount_lamports: row.get::<_, i64>(3)? as u64,
                    signature: row.get(4)?,
                    slot: row.get::<_, i64>(5)? as u64,
                    block_time: row.get(6)?,
                    hop: row.get::<_, i64>(7)? as usize,
                })
            })
            .map_err(|e| format!("sol_flow_edges_from failed: {}", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("sol_flow_edges_from row decode failed: {}", e))
    }

    pub async fn purge_old_sol_flows(&self, max_age_days: i64) -> Result<usize, String> {
        let conn = self.get_write_connection()?;
        let cutoff = now_unix() as i64 - max_age_days * 86_400;
        conn.execute(
            "DELETE FROM sol_flows WHERE block_time IS NOT NULL AND block_time < ?1",
            params![cutoff],
        )
        .map_err(|e| format!("purge_old_sol_flows failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> EventStore {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.db");
        std::mem::forget(dir);
        EventStore::new(path.to_str().unwrap()).await.unwrap()
    }

    fn edge(sig: &str, hop: usize) -> SolFlowEdge {
        SolFlowEdge {
            mint: "MintAAAA".to_string(),
            from_address: "Deployer".to_string(),
            to_address: "Recipient".to_string(),
            amount_lamports: 500_000_000,
            signature: sig.to_string(),
            slot: 100,
            block_time: Some(1_700_000_000),
            hop,
        }
    }

    #[tokio::test]
    async fn batch_insert_is_idempotent_on_mint_signature_from_to() {
        let store = temp_store().await;
        let rows = vec![edge("sig1", 0), edge("sig2", 0)];

        let first = store.sol_flow_insert_batch(&rows).await.unwrap();
        assert_eq!(first, 2);

        // Same rows again: no new rows inserted.
        let second = store.sol_flow_insert_batch(&rows).await.unwrap();
        assert_eq!(second, 0);

        let all = store.get_sol_flow_rows("MintAAAA").await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn purge_removes_only_rows_older_than_cutoff() {
        let store = temp_store().await;
        let mut old = edge("old_sig", 0);
        old.block_time = Some(0);
        let fresh = edge("fresh_sig", 0);

        store.sol_flow_insert_batch(&[old, fresh]).await.unwrap();
        let removed = store.purge_old_sol_flows(90).await.unwrap();
        assert_eq!(removed, 1);

        let remaining = store.get_sol_flow_rows("MintAAAA").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].signature, "fresh_sig");
    }
}

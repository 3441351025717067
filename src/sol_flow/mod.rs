/// SOL Flow Tracer (SPEC_FULL.md §4.6): bounded breadth-first search over
/// balance deltas rooted at a deployer wallet.
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::timeout;

use crate::config::SolFlowConfig;
use crate::logger::{self, LogTag};
use crate::market::MarketClient;
use crate::model::{CrossChainExit, EntityType, LabeledEdge, SolFlowEdge, SolFlowReport};
use crate::rpc_client::RpcClient;
use crate::store::EventStore;
use crate::wallet_labels;

pub struct SolFlowTracer {
    rpc: Arc<RpcClient>,
    market: Arc<MarketClient>,
    store: Arc<EventStore>,
    config: SolFlowConfig,
    bridge_api_base: Option<String>,
}

impl SolFlowTracer {
    pub fn new(rpc: Arc<RpcClient>, market: Arc<MarketClient>, store: Arc<EventStore>, config: SolFlowConfig, bridge_api_base: Option<String>) -> Self {
        Self { rpc, market, store, config, bridge_api_base }
    }

    /// Runs the full BFS and persists every hop's edges; hard 20s timeout
    /// (SPEC_FULL.md §4.6, §5).
    pub async fn trace(&self, mint: &str, deployer: &str) -> SolFlowReport {
        let deadline = Duration::from_secs(self.config.trace_timeout_secs);
        match timeout(deadline, self.run_bfs(mint, deployer)).await {
            Ok(report) => report,
            Err(_) => {
                logger::warning(LogTag::SolFlow, &format!("trace({}) exceeded {}s, returning partial report", mint, self.config.trace_timeout_secs));
                SolFlowReport::empty(deployer)
            }
        }
    }

    /// Serves a previously-traced mint straight from stored rows, without
    /// re-running the BFS (SPEC_FULL.md §4.6).
    pub async fn get_sol_flow_report(&self, mint: &str) -> Option<SolFlowReport> {
        let rows = self.store.get_sol_flow_rows(mint).await.ok()?;
        if rows.is_empty() {
            return None;
        }

        let deployer = rows
            .iter()
            .find(|r| r.hop == 0)
            .or_else(|| rows.first())
            .map(|r| r.from_address.clone())?;

        let labeled = self.store.get_labeled_sol_flow(mint).await.ok()?;
        Some(self.build_report(&deployer, rows, labeled, Vec::new()).await)
    }

    async fn run_bfs(&self, mint: &str, deployer: &str) -> SolFlowReport {
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(deployer.to_string());
        let mut frontier: Vec<String> = vec![deployer.to_string()];
        let mut all_edges: Vec<SolFlowEdge> = Vec::new();

        for hop in 0..self.config.max_hops {
            if frontier.is_empty() {
                break;
            }

            let semaphore = Arc::new(Semaphore::new(self.config.hop_concurrency));
            let mut handles = Vec::new();

            for wallet in frontier.drain(..) {
                let rpc = self.rpc.clone();
                let permit = semaphore.clone();
                let min_lamports = self.config.min_transfer_lamports;
                let max_txn = self.config.max_txn_per_wallet;
                let mint = mint.to_string();

                handles.push(tokio::spawn(async move {
                    let _permit = permit.acquire_owned().await.ok()?;
                    Some(trace_wallet(&rpc, &mint, &wallet, hop, max_txn, min_lamports).await)
                }));
            }

            let mut hop_edges = Vec::new();
            for handle in handles {
                if let Ok(Some(edges)) = handle.await {
                    hop_edges.extend(edges);
                }
            }

            let _ = self.store.sol_flow_insert_batch(&hop_edges).await;

            let mut next_frontier = Vec::new();
            for edge in &hop_edges {
                if visited.insert(edge.to_address.clone()) && !wallet_labels::is_skip_address(&edge.to_address) {
                    next_frontier.push(edge.to_address.clone());
                }
            }

            all_edges.extend(hop_edges);
            frontier = next_frontier;
        }

        let cross_chain_exits = self.detect_bridge_exits(&all_edges).await;
        let labeled = all_edges
            .iter()
            .map(|edge| {
                let (from_label, from_entity) = wallet_labels::classify_address(&edge.from_address);
                let (to_label, to_entity) = wallet_labels::classify_address(&edge.to_address);
                LabeledEdge { edge: edge.clone(), from_label, to_label, entity_type: to_entity.or(from_entity) }
            })
            .collect();

        self.build_report(deployer, all_edges, labeled, cross_chain_exits).await
    }

    async fn detect_bridge_exits(&self, edges: &[SolFlowEdge]) -> Vec<CrossChainExit> {
        let Some(bridge_api_base) = &self.bridge_api_base else {
            return Vec::new();
        };

        let mut exits = Vec::new();
        for edge in edges {
            if wallet_labels::is_bridge_program(&edge.to_address) {
                if let Some(exit) = self.market.get_bridge_exit(bridge_api_base, &edge.from_address, &edge.to_address).await {
                    exits.push(exit);
                }
            }
        }
        exits
    }

    async fn build_report(&self, deployer: &str, edges: Vec<SolFlowEdge>, flows: Vec<LabeledEdge>, cross_chain_exits: Vec<CrossChainExit>) -> SolFlowReport {
        let total_extracted_sol: f64 = edges.iter().filter(|e| e.hop == 0).map(|e| e.amount_sol()).sum();

        let from_set: HashSet<&str> = edges.iter().map(|e| e.from_address.as_str()).collect();
        let terminal_wallets: Vec<String> = edges
            .iter()
            .map(|e| e.to_address.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .filter(|to| !from_set.contains(to.as_str()))
            .collect();

        let known_cex_detected = flows.iter().any(|f| f.entity_type == Some(EntityType::Cex));
        let hop_count = edges.iter().map(|e| e.hop).max().map(|h| h + 1).unwrap_or(0);
        let rug_timestamp = edges.iter().filter(|e| e.hop == 0).filter_map(|e| e.block_time).min();

        let total_extracted_usd = self.market.get_sol_usd_price().await.map(|price| total_extracted_sol * price);

        SolFlowReport {
            deployer: deployer.to_string(),
            flows,
            terminal_wallets,
            known_cex_detected,
            hop_count,
            total_extracted_sol,
            total_extracted_usd,
            rug_timestamp,
            cross_chain_exits,
        }
    }
}

async fn trace_wallet(rpc: &RpcClient, mint: &str, wallet: &str, hop: usize, max_txn: usize, min_lamports: u64) -> Vec<SolFlowEdge> {
    let mut edges = Vec::new();

    let signatures = rpc.get_recent_signatures(wallet, max_txn).await;
    for sig in signatures {
        if !sig.succeeded() {
            continue;
        }
        let Some(tx) = rpc.get_transaction(&sig.signature).await else { continue };

        let Some(source_index) = tx.account_keys.iter().position(|k| k.pubkey() == wallet) else { continue };
        if tx.lamport_delta(source_index) >= 0 {
            continue;
        }

        for (index, account) in tx.account_keys.iter().enumerate() {
            if index == source_index {
                continue;
            }
            let delta = tx.lamport_delta(index);
            if delta < min_lamports as i128 {
                continue;
            }
            if wallet_labels::is_skip_address(account.pubkey()) {
                continue;
            }

            edges.push(SolFlowEdge {
                mint: mint.to_string(),
                from_address: wallet.to_string(),
                to_address: account.pubkey().to_string(),
                amount_lamports: delta as u64,
                signature: sig.signature.clone(),
                slot: sig.slot,
                block_time: sig.block_time,
                hop,
            });
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_wallets_exclude_intermediate_hops() {
        let edges = vec![
            SolFlowEdge { mint: "m".into(), from_address: "A".into(), to_address: "B".into(), amount_lamports: 200_000_000, signature: "s1".into(), slot: 1, block_time: None, hop: 0 },
            SolFlowEdge { mint: "m".into(), from_address: "B".into(), to_address: "C".into(), amount_lamports: 150_000_000, signature: "s2".into(), slot: 2, block_time: None, hop: 1 },
        ];
        let from_set: HashSet<&str> = edges.iter().map(|e| e.from_address.as_str()).collect();
        let terminal: Vec<String> = edges.iter().map(|e| e.to_address.clone()).collect::<HashSet<_>>().into_iter().filter(|t| !from_set.contains(t.as_str())).collect();
        assert_eq!(terminal, vec!["C".to_string()]);
    }
}

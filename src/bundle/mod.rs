/// Bundle Forensics Pipeline (SPEC_FULL.md §4.5): classifies a launch's
/// buyer wallets as team-linked, coordinated, or early buyers by walking
/// their pre- and post-launch on-chain behaviour.
mod phase1;
mod phase2;
mod phase3;
mod phase4;
mod phase5;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::config::BundleConfig;
use crate::logger::{self, LogTag};
use crate::model::BundleExtractionReport;
use crate::rpc_client::RpcClient;
use crate::store::EventStore;

pub struct BundleForensics {
    rpc: Arc<RpcClient>,
    store: Arc<EventStore>,
    config: BundleConfig,
}

impl BundleForensics {
    pub fn new(rpc: Arc<RpcClient>, store: Arc<EventStore>, config: BundleConfig) -> Self {
        Self { rpc, store, config }
    }

    /// Runs the full five-phase pipeline, 24h-cache-first, hard 45s timeout
    /// (SPEC_FULL.md §4.5, §5).
    pub async fn analyze(&self, mint: &str, deployer: &str) -> Option<BundleExtractionReport> {
        if let Ok(Some(cached)) = self.store.bundle_report_get_fresh(mint).await {
            return Some(cached);
        }

        let deadline = Duration::from_secs(self.config.analysis_timeout_secs);
        let report = match timeout(deadline, self.run(mint, deployer)).await {
            Ok(report) => report,
            Err(_) => {
                logger::warning(LogTag::Bundle, &format!("analyze({}) exceeded {}s, skipping", mint, self.config.analysis_timeout_secs));
                None
            }
        };

        if let Some(report) = &report {
            let _ = self.store.bundle_report_upsert(report).await;
        }
        report
    }

    async fn run(&self, mint: &str, deployer: &str) -> Option<BundleExtractionReport> {
        let launch = phase1::detect_buyers(&self.rpc, &self.config, mint, deployer).await?;
        if launch.wallets.is_empty() {
            return None;
        }

        let total_sol_spent_by_bundle: f64 = launch.wallets.iter().map(|(_, sol)| sol).sum();

        let mut pre_sells = phase2::analyze_all(&self.rpc, &self.store, &self.config, deployer, launch.launch_time, &launch.wallets).await;

        let mut linked_set: HashSet<String> = HashSet::new();
        linked_set.insert(deployer.to_string());
        for (_, pre) in &pre_sells {
            if pre.prefund_source_is_deployer {
                if let Some(source) = &pre.prefund_source {
                    linked_set.insert(source.clone());
                }
            }
        }

        let mut post_sells = phase3::analyze_all(&self.rpc, &self.config, deployer, launch.launch_time, &launch.wallets, &linked_set).await;

        let coordination = phase4::compute(&self.config, &pre_sells, &post_sells);
        phase4::apply_backfill(&mut pre_sells, &mut post_sells, &coordination);

        let sol_spent_by_wallet: std::collections::HashMap<String, f64> = launch.wallets.into_iter().collect();
        let mut post_sells_by_wallet: std::collections::HashMap<String, _> = post_sells.into_iter().collect();

        let mut wallets = Vec::new();
        for (wallet, pre) in pre_sells {
            let sol_spent = sol_spent_by_wallet.get(&wallet).copied().unwrap_or(0.0);
            let post = post_sells_by_wallet.remove(&wallet).unwrap_or_default();
            wallets.push(phase5::wallet_verdict(&wallet, sol_spent, pre, post, &coordination));
        }

        let verdict = phase5::overall_verdict(&wallets, &coordination);
        let evidence_chain = phase5::evidence_chain(&wallets, &coordination, verdict);

        let total_sol_extracted_confirmed: f64 = wallets
            .iter()
            .flat_map(|w| &w.post_sell.destinations)
            .filter(|d| d.hop <= 1 && (d.link_to_deployer || d.indirect_via_intermediary))
            .map(|d| d.amount_lamports as f64 / 1e9)
            .sum();

        Some(BundleExtractionReport {
            mint: mint.to_string(),
            deployer: deployer.to_string(),
            launch_slot: launch.launch_slot,
            wallets,
            verdict,
            total_sol_spent_by_bundle,
            total_sol_extracted_confirmed,
            evidence_chain,
        })
    }
}

/// Cartel Builder (SPEC_FULL.md §4.7): emits cross-operator coordination
/// edges and serves on-demand community reports.
mod community;
mod operator_impact;
mod signals;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::{CartelConfig, DerivationsConfig};
use crate::model::{CartelReport, OperatorImpact};
use crate::rpc_client::RpcClient;
use crate::store::EventStore;

pub struct CartelBuilder {
    rpc: Arc<RpcClient>,
    store: Arc<EventStore>,
    config: CartelConfig,
}

impl CartelBuilder {
    pub fn new(rpc: Arc<RpcClient>, store: Arc<EventStore>, config: CartelConfig) -> Self {
        Self { rpc, store, config }
    }

    /// Runs signal 1 once, globally (SPEC_FULL.md §4.7 "run once per sweep").
    pub async fn run_dna_match(&self) -> usize {
        let edges = signals::dna_match_all(&self.store).await;
        let count = edges.len();
        for edge in &edges {
            let _ = self.store.cartel_edge_upsert(edge).await;
        }
        count
    }

    /// Runs signals 2-8 for a single deployer (SPEC_FULL.md §4.7 "per
    /// deployer"), persisting every emitted edge.
    pub async fn run_deployer_signals(&self, deployer: &str) -> usize {
        let known_deployers = self.store.all_deployers().await.unwrap_or_default();

        let (sol_transfer, timing_sync, phash_cluster, cross_holding, funding_link, shared_lp, sniper_ring) = tokio::join!(
            signals::sol_transfer(&self.store, deployer, &known_deployers),
            signals::timing_sync(&self.store, deployer),
            signals::phash_cluster(&self.store, &self.config, deployer),
            signals::cross_holding(&self.rpc, &self.store, deployer),
            signals::funding_link(&self.rpc, &self.store, deployer, &known_deployers),
            signals::shared_lp(&self.rpc, &self.store, &self.config, deployer),
            signals::sniper_ring(&self.rpc, &self.store, &self.config, deployer),
        );

        let mut all_edges = Vec::new();
        all_edges.extend(sol_transfer);
        all_edges.extend(timing_sync);
        all_edges.extend(phash_cluster);
        all_edges.extend(cross_holding);
        all_edges.extend(funding_link);
        all_edges.extend(shared_lp);
        all_edges.extend(sniper_ring);

        let count = all_edges.len();
        for edge in &all_edges {
            let _ = self.store.cartel_edge_upsert(edge).await;
        }
        count
    }

    /// On-demand community report for a deployer (SPEC_FULL.md §4.7
    /// "Community detection"), with a hard timeout so a pathological graph
    /// can't block a caller indefinitely.
    pub async fn community_report(&self, deployer: &str) -> Option<CartelReport> {
        let deadline = std::time::Duration::from_secs(self.config.community_timeout_secs);
        match tokio::time::timeout(deadline, community::report_for_deployer(&self.store, deployer)).await {
            Ok(report) => report,
            Err(_) => {
                crate::logger::warning(crate::logger::LogTag::Cartel, &format!("community_report({}) timed out", deployer));
                None
            }
        }
    }

    /// Aggregate campaign footprint for a community (SPEC_FULL.md §4.9
    /// "Operator impact"), bounded by `derivations_config`'s own timeouts.
    pub async fn operator_impact(&self, community: &CartelReport, now: DateTime<Utc>, derivations_config: &DerivationsConfig) -> Option<OperatorImpact> {
        operator_impact::compute(&self.store, community, now, derivations_config).await
    }
}

/// Cartel sweep (SPEC_FULL.md §4.8): hourly re-scan of every multi-launch
/// deployer's coordination signals.
use std::sync::Arc;

use crate::cartel::CartelBuilder;
use crate::config::CartelConfig;
use crate::logger::{self, LogTag};
use crate::store::EventStore;

pub async fn run_once(store: &Arc<EventStore>, cartel: &Arc<CartelBuilder>, config: &CartelConfig) -> usize {
    let dna_edges = cartel.run_dna_match().await;
    logger::info(LogTag::Sweep, &format!("cartel_sweep: dna_match emitted {} edges", dna_edges));

    let deployers = store.deployers_with_min_launches(config.min_tokens_for_scan).await.unwrap_or_default();
    let mut total_edges = 0usize;

    for batch in deployers.chunks(config.sweep_batch_size) {
        let mut handles = Vec::new();
        for deployer in batch {
            let cartel = cartel.clone();
            let deployer = deployer.clone();
            handles.push(tokio::spawn(async move { cartel.run_deployer_signals(&deployer).await }));
        }
        for handle in handles {
            total_edges += handle.await.unwrap_or(0);
        }
    }

    logger::info(LogTag::Sweep, &format!("cartel_sweep: {} deployers scanned, {} edges emitted", deployers.len(), total_edges));
    total_edges
}

/// Phase 2 (SPEC_FULL.md §4.5): per-wallet pre-launch behaviour, run
/// bounded-parallel across the bundle wallet set.
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;

use crate::config::BundleConfig;
use crate::model::PreSellBehavior;
use crate::rpc_client::RpcClient;
use crate::store::EventStore;
use crate::wallet_labels;

const PRE_LAUNCH_TX_SAMPLE: usize = 15;

pub async fn analyze_all(
    rpc: &Arc<RpcClient>,
    store: &Arc<EventStore>,
    config: &BundleConfig,
    deployer: &str,
    launch_time: Option<i64>,
    wallets: &[(String, f64)],
) -> Vec<(String, PreSellBehavior)> {
    let semaphore = Arc::new(Semaphore::new(wallets.len().max(1)));
    let mut handles = Vec::new();

    for (wallet, _) in wallets {
        let rpc = rpc.clone();
        let store = store.clone();
        let config = config.clone();
        let deployer = deployer.to_string();
        let wallet = wallet.clone();
        let permit = semaphore.clone();

        handles.push(tokio::spawn(async move {
            let _permit = permit.acquire_owned().await.ok()?;
            let behavior = analyze_one(&rpc, &store, &config, &deployer, launch_time, &wallet).await;
            Some((wallet, behavior))
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        if let Ok(Some(pair)) = handle.await {
            results.push(pair);
        }
    }
    results
}

async fn analyze_one(
    rpc: &RpcClient,
    store: &EventStore,
    config: &BundleConfig,
    deployer: &str,
    launch_time: Option<i64>,
    wallet: &str,
) -> PreSellBehavior {
    let sigs = rpc.get_recent_signatures(wallet, config.pre_sell_sig_limit).await;

    let now = Utc::now().timestamp();
    let earliest = sigs.iter().filter_map(|s| s.block_time).min();
    let wallet_age_days = earliest.map(|t| (now - t) as f64 / 86_400.0).unwrap_or(0.0);

    let launch_time = launch_time.unwrap_or(now);
    let pre_launch_window_start = launch_time - config.pre_launch_window_hours * 3600;

    let pre_launch_times: Vec<i64> = sigs.iter().filter_map(|s| s.block_time).filter(|t| *t < launch_time).collect();
    let is_dormant = match pre_launch_times.iter().max() {
        Some(last_pre) => (launch_time - last_pre) > config.dormant_threshold_days * 86_400,
        None => false,
    };

    let pre_launch_sigs: Vec<_> = sigs
        .iter()
        .filter(|s| s.block_time.map(|t| t >= pre_launch_window_start && t < launch_time).unwrap_or(false))
        .collect();
    let pre_launch_tx_count = pre_launch_sigs.len();

    let mut prefund_source: Option<String> = None;
    let mut largest_incoming: f64 = 0.0;
    let mut unique_mints: HashSet<String> = HashSet::new();

    for sig in pre_launch_sigs.iter().take(PRE_LAUNCH_TX_SAMPLE) {
        let Some(tx) = rpc.get_transaction(&sig.signature).await else { continue };
        let Some(wallet_index) = tx.account_keys.iter().position(|k| k.pubkey() == wallet) else { continue };

        let delta = tx.lamport_delta(wallet_index);
        if delta > 0 {
            let incoming_sol = delta as f64 / 1e9;
            if incoming_sol >= config.min_prefund_sol && incoming_sol > largest_incoming {
                let sender = tx
                    .account_keys
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != wallet_index)
                    .max_by_key(|(i, _)| (-tx.lamport_delta(*i)).max(0))
                    .map(|(_, a)| a.pubkey().to_string());

                if let Some(sender) = sender {
                    if !wallet_labels::is_skip_address(&sender) {
                        largest_incoming = incoming_sol;
                        prefund_source = Some(sender);
                    }
                }
            }
        }

        for entry in tx.pre_token_balances.iter().chain(tx.post_token_balances.iter()) {
            unique_mints.insert(entry.mint.clone());
        }
    }

    let prefund_source_is_deployer = prefund_source.as_deref() == Some(deployer);

    let launch_dt = DateTime::<Utc>::from_timestamp(launch_time, 0).unwrap_or_else(Utc::now);
    let same_deployer_prior_launches = store.count_prior_launches(deployer, launch_dt).await.unwrap_or(0);
    let prior_bundle_count = store.count_prior_bundle_appearances(wallet).await.unwrap_or(0);

    PreSellBehavior {
        wallet_age_days,
        is_dormant,
        pre_launch_tx_count,
        prefund_source,
        prefund_source_is_deployer,
        prefund_source_is_known_funder: false,
        pre_launch_unique_tokens: unique_mints.len(),
        same_deployer_prior_launches,
        prior_bundle_count,
    }
}

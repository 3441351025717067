/// Phase 3 (SPEC_FULL.md §4.5): per-wallet post-sell behaviour — full-sell
/// detection, outflow tracing, and second-hop intermediary detection.
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::config::BundleConfig;
use crate::model::{FundDestination, PostSellBehavior};
use crate::rpc_client::RpcClient;
use crate::wallet_labels;

pub async fn analyze_all(
    rpc: &Arc<RpcClient>,
    config: &BundleConfig,
    deployer: &str,
    launch_time: Option<i64>,
    wallets: &[(String, f64)],
    linked_set: &HashSet<String>,
) -> Vec<(String, PostSellBehavior)> {
    let semaphore = Arc::new(Semaphore::new(wallets.len().max(1)));
    let mut handles = Vec::new();

    for (wallet, _) in wallets {
        let rpc = rpc.clone();
        let config = config.clone();
        let deployer = deployer.to_string();
        let wallet = wallet.clone();
        let linked_set = linked_set.clone();
        let permit = semaphore.clone();

        handles.push(tokio::spawn(async move {
            let _permit = permit.acquire_owned().await.ok()?;
            let behavior = analyze_one(&rpc, &config, &deployer, launch_time, &wallet, &linked_set).await;
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
    config: &BundleConfig,
    deployer: &str,
    launch_time: Option<i64>,
    wallet: &str,
    linked_set: &HashSet<String>,
) -> PostSellBehavior {
    let Some(launch_time) = launch_time else {
        return PostSellBehavior::default();
    };

    let mut sigs = rpc.get_recent_signatures(wallet, config.pre_sell_sig_limit).await;
    sigs.retain(|s| s.block_time.map(|t| t >= launch_time).unwrap_or(false) && s.succeeded());
    sigs.sort_by_key(|s| s.slot);
    sigs.truncate(config.post_sell_scan_limit);

    let mut sell: Option<(u64, String, u64)> = None;

    for sig in &sigs {
        let Some(tx) = rpc.get_transaction(&sig.signature).await else { continue };
        let Some(wallet_index) = tx.account_keys.iter().position(|k| k.pubkey() == wallet) else { continue };

        let held_mints: Vec<&str> = tx
            .pre_token_balances
            .iter()
            .filter(|b| b.account_index == wallet_index && b.ui_token_amount.amount_f64() > 0.0)
            .map(|b| b.mint.as_str())
            .collect();
        if held_mints.is_empty() {
            continue;
        }

        let fully_sold = held_mints.iter().all(|mint| {
            tx.post_token_balances
                .iter()
                .find(|b| b.account_index == wallet_index && b.mint == *mint)
                .map(|b| b.ui_token_amount.amount_f64() <= 1.0)
                .unwrap_or(true)
        });

        if fully_sold {
            let received = tx.lamport_delta(wallet_index).max(0) as u64;
            sell = Some((sig.slot, sig.signature.clone(), received));
            break;
        }
    }

    let Some((sell_slot, sell_signature, sol_received_at_sell)) = sell else {
        return PostSellBehavior::default();
    };

    let post_sigs: Vec<_> = sigs
        .iter()
        .filter(|s| s.slot >= sell_slot && s.signature != sell_signature)
        .take(config.post_sell_outflow_limit)
        .collect();

    let mut destinations: HashMap<String, u64> = HashMap::new();
    for sig in &post_sigs {
        let Some(tx) = rpc.get_transaction(&sig.signature).await else { continue };
        let Some(wallet_index) = tx.account_keys.iter().position(|k| k.pubkey() == wallet) else { continue };

        let outflow = -tx.lamport_delta(wallet_index);
        if outflow < (config.min_outflow_sol * 1e9) as i128 {
            continue;
        }

        for (index, account) in tx.account_keys.iter().enumerate() {
            if index == wallet_index {
                continue;
            }
            let delta = tx.lamport_delta(index);
            if delta <= 0 || wallet_labels::is_skip_address(account.pubkey()) {
                continue;
            }
            *destinations.entry(account.pubkey().to_string()).or_insert(0) += delta as u64;
        }
    }

    let mut ranked: Vec<(String, u64)> = destinations.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(10);

    let mut second_hop_budget = config.second_hop_wallets;
    let mut fund_destinations = Vec::with_capacity(ranked.len());

    for (address, amount_lamports) in ranked {
        let link_to_deployer = linked_set.contains(&address);
        let direct_transfer_to_deployer = address == deployer;

        let mut indirect_via_intermediary = false;
        if !link_to_deployer && second_hop_budget > 0 {
            second_hop_budget -= 1;
            indirect_via_intermediary = trace_second_hop(rpc, config, &address, linked_set).await;
        }

        fund_destinations.push(FundDestination {
            address: address.clone(),
            amount_lamports,
            hop: 0,
            link_to_deployer,
            direct_transfer_to_deployer,
            transfer_to_deployer_linked_wallet: link_to_deployer && !direct_transfer_to_deployer,
            indirect_via_intermediary,
            seen_in_other_bundles: false,
        });
    }

    PostSellBehavior {
        full_sell_detected: true,
        sell_slot: Some(sell_slot),
        sell_signature: Some(sell_signature),
        sol_received_at_sell,
        destinations: fund_destinations,
    }
}

async fn trace_second_hop(rpc: &RpcClient, config: &BundleConfig, wallet: &str, linked_set: &HashSet<String>) -> bool {
    let sigs = rpc.get_recent_signatures(wallet, config.second_hop_sig_limit).await;
    for sig in sigs.iter().filter(|s| s.succeeded()).take(config.second_hop_tx_limit) {
        let Some(tx) = rpc.get_transaction(&sig.signature).await else { continue };
        let Some(wallet_index) = tx.account_keys.iter().position(|k| k.pubkey() == wallet) else { continue };

        if tx.lamport_delta(wallet_index) >= 0 {
            continue;
        }

        for (index, account) in tx.account_keys.iter().enumerate() {
            if index == wallet_index {
                continue;
            }
            if tx.lamport_delta(index) > 0 && linked_set.contains(account.pubkey()) {
                return true;
            }
        }
    }
    false
}

/// Phase 1 (SPEC_FULL.md §4.5): detect the launch-bundle wallet set from the
/// mint's earliest signatures.
use std::collections::HashMap;

use crate::config::BundleConfig;
use crate::rpc_client::RpcClient;
use crate::wallet_labels;

pub struct LaunchContext {
    pub launch_slot: u64,
    pub launch_time: Option<i64>,
    /// Bundle wallets ordered by descending SOL spent, capped at
    /// `max_bundle_wallets`.
    pub wallets: Vec<(String, f64)>,
}

pub async fn detect_buyers(rpc: &RpcClient, config: &BundleConfig, mint: &str, deployer: &str) -> Option<LaunchContext> {
    let sigs = rpc.get_launch_signatures(mint, config.max_launch_sigs).await;
    let first = sigs.first()?;
    let launch_slot = first.slot;
    let launch_time = first.block_time;

    let window_end = launch_slot + config.bundle_window_slots;
    let mut spent: HashMap<String, f64> = HashMap::new();

    for sig in sigs.iter().filter(|s| s.slot <= window_end && s.succeeded()) {
        let Some(tx) = rpc.get_transaction(&sig.signature).await else { continue };

        for (index, account) in tx.account_keys.iter().enumerate() {
            if !(account.is_signer() || index == 0) {
                continue;
            }

            let wallet = account.pubkey();
            if wallet == deployer || wallet_labels::is_skip_address(wallet) {
                continue;
            }

            let delta = tx.lamport_delta(index);
            if delta >= 0 {
                continue;
            }

            let sol_spent = (-delta) as f64 / 1e9;
            if sol_spent < config.min_buy_sol {
                continue;
            }

            *spent.entry(wallet.to_string()).or_insert(0.0) += sol_spent;
        }
    }

    let mut wallets: Vec<(String, f64)> = spent.into_iter().collect();
    wallets.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    wallets.truncate(config.max_bundle_wallets);

    Some(LaunchContext { launch_slot, launch_time, wallets })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallets_are_capped_and_sorted() {
        let mut spent: HashMap<String, f64> = HashMap::new();
        spent.insert("a".into(), 1.0);
        spent.insert("b".into(), 5.0);
        spent.insert("c".into(), 3.0);
        let mut wallets: Vec<(String, f64)> = spent.into_iter().collect();
        wallets.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        wallets.truncate(2);
        assert_eq!(wallets, vec![("b".to_string(), 5.0), ("c".to_string(), 3.0)]);
    }
}

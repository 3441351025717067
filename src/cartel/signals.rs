/// The eight cartel edge signals (SPEC_FULL.md §4.7).
use std::collections::HashSet;

use serde_json::json;

use crate::config::CartelConfig;
use crate::model::{CartelEdge, SignalType, TokenEvent};
use crate::narrative;
use crate::rpc_client::RpcClient;
use crate::similarity;
use crate::store::EventStore;

/// Signal 1, global: pairs every wallet sharing an operator fingerprint.
/// Run once per cartel sweep, not per deployer.
pub async fn dna_match_all(store: &EventStore) -> Vec<CartelEdge> {
    let groups = store.operator_fingerprint_groups().await.unwrap_or_default();
    let mut edges = Vec::new();
    for (fingerprint, wallets) in groups {
        for i in 0..wallets.len() {
            for j in (i + 1)..wallets.len() {
                edges.push(CartelEdge::new(&wallets[i], &wallets[j], SignalType::DnaMatch, 0.95, json!({ "fingerprint": fingerprint })));
            }
        }
    }
    edges
}

/// Signal 2: SOL transfers from `deployer` to another known deployer wallet.
pub async fn sol_transfer(store: &EventStore, deployer: &str, known_deployers: &HashSet<String>) -> Vec<CartelEdge> {
    let flows = store.sol_flow_edges_from(deployer).await.unwrap_or_default();
    let mut edges = Vec::new();
    for edge in flows {
        if edge.to_address == deployer || !known_deployers.contains(&edge.to_address) {
            continue;
        }
        let sol = edge.amount_sol();
        if sol < 0.1 {
            continue;
        }
        let strength = (sol / 10.0).min(1.0);
        edges.push(CartelEdge::new(deployer, &edge.to_address, SignalType::SolTransfer, strength, json!({ "amount_sol": sol, "mint": edge.mint })));
    }
    edges
}

/// Signal 3: other deployers launching in the same narrative within ±30 min.
pub async fn timing_sync(store: &EventStore, deployer: &str) -> Vec<CartelEdge> {
    let own_launches = store.get_launches_by_deployer(deployer).await.unwrap_or_default();
    if own_launches.is_empty() {
        return Vec::new();
    }

    let mut edges = Vec::new();
    for launch in &own_launches {
        let Some(created_at) = launch.created_at else { continue };
        let category = narrative::classify(launch.name.as_deref().unwrap_or(""), launch.symbol.as_deref().unwrap_or(""));

        let window = store
            .query_events(
                "event_type = ?1 AND narrative = ?2 AND deployer != ?3",
                &[&"token_created", &category.as_str(), &deployer],
                1000,
                "recorded_at DESC",
            )
            .await
            .unwrap_or_default();

        for other in window {
            let (Some(other_deployer), Some(other_created)) = (&other.deployer, other.created_at) else { continue };
            let delta_minutes = (created_at - other_created).num_minutes().abs();
            if delta_minutes > 30 {
                continue;
            }
            let strength = (1.0 - delta_minutes as f64 / 30.0).max(0.1);
            edges.push(CartelEdge::new(deployer, other_deployer, SignalType::TimingSync, strength, json!({ "narrative": category, "delta_minutes": delta_minutes })));
        }
    }
    edges
}

/// Signal 4: pHash Hamming-distance clustering across all deployers' tokens.
pub async fn phash_cluster(store: &EventStore, config: &CartelConfig, deployer: &str) -> Vec<CartelEdge> {
    let own_launches = store.get_launches_by_deployer(deployer).await.unwrap_or_default();
    let own_phashes: Vec<u64> = own_launches.iter().filter_map(token_phash).collect();
    if own_phashes.is_empty() {
        return Vec::new();
    }

    let all_deployers = store.all_deployers().await.unwrap_or_default();
    let mut edges = Vec::new();

    for other_deployer in all_deployers.iter().filter(|d| d.as_str() != deployer) {
        let other_launches = store.get_launches_by_deployer(other_deployer).await.unwrap_or_default();
        let other_phashes: Vec<u64> = other_launches.iter().filter_map(token_phash).collect();

        let mut best: Option<u32> = None;
        for a in &own_phashes {
            for b in &other_phashes {
                let distance = similarity::hamming_distance(*a, *b);
                if best.map(|d| distance < d).unwrap_or(true) {
                    best = Some(distance);
                }
            }
        }

        if let Some(distance) = best {
            if distance <= config.phash_hamming_threshold {
                let strength = (1.0 - distance as f64 / 64.0).max(0.5);
                edges.push(CartelEdge::new(deployer, other_deployer, SignalType::PhashCluster, strength, json!({ "hamming_distance": distance })));
            }
        }
    }
    edges
}

fn token_phash(event: &TokenEvent) -> Option<u64> {
    event.extra_object().get("phash").and_then(|v| v.as_u64())
}

/// Signal 5: deployer B currently holds a mint created by deployer A.
/// Only scanned for deployers with >= 3 launched tokens.
pub async fn cross_holding(rpc: &RpcClient, store: &EventStore, deployer: &str) -> Vec<CartelEdge> {
    let own_launches = store.get_launches_by_deployer(deployer).await.unwrap_or_default();
    if own_launches.len() < 3 {
        return Vec::new();
    }

    let own_mints: HashSet<String> = own_launches.iter().map(|e| e.mint.clone()).collect();
    let all_deployers = store.all_deployers().await.unwrap_or_default();
    let mut edges = Vec::new();

    for other_deployer in all_deployers.iter().filter(|d| d.as_str() != deployer) {
        let holdings = rpc.get_deployer_token_holdings(other_deployer).await;
        if holdings.iter().any(|mint| own_mints.contains(mint)) {
            edges.push(CartelEdge::new(deployer, other_deployer, SignalType::CrossHolding, 0.70, json!({})));
        }
    }
    edges
}

/// Signal 6: SOL transfers to/from a known deployer wallet in the 72h
/// before the deployer's earliest launch.
pub async fn funding_link(rpc: &RpcClient, store: &EventStore, deployer: &str, known_deployers: &HashSet<String>) -> Vec<CartelEdge> {
    let own_launches = store.get_launches_by_deployer(deployer).await.unwrap_or_default();
    let Some(earliest) = own_launches.iter().filter_map(|e| e.created_at).min() else {
        return Vec::new();
    };

    let sigs = rpc.get_recent_signatures(deployer, 200).await;
    let mut edges = Vec::new();

    for sig in sigs.iter().filter(|s| s.succeeded()) {
        let Some(block_time) = sig.block_time else { continue };
        let hours_before = (earliest.timestamp() - block_time) as f64 / 3600.0;
        if !(0.0..=72.0).contains(&hours_before) {
            continue;
        }

        let Some(tx) = rpc.get_transaction(&sig.signature).await else { continue };
        let Some(deployer_index) = tx.account_keys.iter().position(|k| k.pubkey() == deployer) else { continue };

        for (index, account) in tx.account_keys.iter().enumerate() {
            if index == deployer_index || !known_deployers.contains(account.pubkey()) {
                continue;
            }
            let delta = tx.lamport_delta(index).unsigned_abs() as f64 / 1e9;
            if delta < 0.05 {
                continue;
            }
            let amount_factor = (delta / 5.0).min(1.0);
            let time_factor = (1.0 - hours_before / 72.0).max(0.3);
            let strength = 0.6 * amount_factor + 0.4 * time_factor;
            edges.push(CartelEdge::new(deployer, account.pubkey(), SignalType::FundingLink, strength, json!({ "amount_sol": delta, "hours_before": hours_before })));
        }
    }
    edges
}

/// Reads `field` off `launch.extra_json`; on a cache miss, runs `fetch` to
/// do the RPC work and persists the result back onto the row so the next
/// sweep hits the cache (SPEC_FULL.md §4.7 "lazily populate extra_json on
/// the first run and cache the result").
async fn cached_field_or_populate<F, Fut>(store: &EventStore, launch: &TokenEvent, field: &str, fetch: F) -> Vec<String>
where
    F: FnOnce(String, String) -> Fut,
    Fut: std::future::Future<Output = Vec<String>>,
{
    let extra = launch.extra_object();
    if let Some(cached) = extra.get(field).and_then(|v| v.as_array()) {
        return cached.iter().filter_map(|v| v.as_str().map(|s| s.to_string())).collect();
    }

    let Some(id) = launch.id else { return Vec::new() };
    let deployer = launch.deployer.clone().unwrap_or_default();
    let fetched = fetch(launch.mint.clone(), deployer).await;

    let mut merged = extra.as_object().cloned().unwrap_or_default();
    merged.insert(field.to_string(), json!(fetched));
    let _ = store.update_event_extra(id, &serde_json::Value::Object(merged)).await;

    fetched
}

/// Signal 7: LP-provider overlap across tokens launched by different
/// deployers, using the `extra_json.lp_providers` cache. Populates the
/// cache for `deployer`'s own launches on a miss; other deployers' launches
/// are read as-is (populated whenever their own sweep runs).
pub async fn shared_lp(rpc: &RpcClient, store: &EventStore, config: &CartelConfig, deployer: &str) -> Vec<CartelEdge> {
    let own_launches = store.get_launches_by_deployer(deployer).await.unwrap_or_default();
    let mut own_lps: HashSet<String> = HashSet::new();
    for launch in &own_launches {
        let providers = cached_field_or_populate(store, launch, "lp_providers", |mint, launch_deployer| async move {
            rpc.get_lp_providers(&mint, &launch_deployer, config.lp_scan_sig_limit).await
        })
        .await;
        own_lps.extend(providers);
    }
    if own_lps.is_empty() {
        return Vec::new();
    }

    let all_deployers = store.all_deployers().await.unwrap_or_default();
    let mut edges = Vec::new();

    for other_deployer in all_deployers.iter().filter(|d| d.as_str() != deployer) {
        let other_launches = store.get_launches_by_deployer(other_deployer).await.unwrap_or_default();
        let other_lps: HashSet<String> = other_launches
            .iter()
            .flat_map(|e| e.extra_object().get("lp_providers").and_then(|v| v.as_array()).cloned().unwrap_or_default())
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect();

        let overlap = own_lps.intersection(&other_lps).count();
        if overlap > 0 {
            let strength = (0.65 + 0.1 * overlap as f64).min(1.0);
            edges.push(CartelEdge::new(deployer, other_deployer, SignalType::SharedLp, strength, json!({ "overlap_count": overlap })));
        }
    }
    edges
}

/// Signal 8: shared early-buyer wallets across tokens launched by different
/// deployers, using the `extra_json.early_buyers` cache. Populates the
/// cache for `deployer`'s own launches on a miss, same as [`shared_lp`].
pub async fn sniper_ring(rpc: &RpcClient, store: &EventStore, config: &CartelConfig, deployer: &str) -> Vec<CartelEdge> {
    let own_launches = store.get_launches_by_deployer(deployer).await.unwrap_or_default();
    let mut own_snipers: HashSet<String> = HashSet::new();
    for launch in &own_launches {
        let buyers = cached_field_or_populate(store, launch, "early_buyers", |mint, launch_deployer| async move {
            rpc.get_early_buyers(&mint, &launch_deployer, config.sniper_scan_sig_limit).await
        })
        .await;
        own_snipers.extend(buyers);
    }
    if own_snipers.is_empty() {
        return Vec::new();
    }

    let all_deployers = store.all_deployers().await.unwrap_or_default();
    let mut edges = Vec::new();

    for other_deployer in all_deployers.iter().filter(|d| d.as_str() != deployer) {
        let other_launches = store.get_launches_by_deployer(other_deployer).await.unwrap_or_default();
        let other_snipers: HashSet<String> = other_launches
            .iter()
            .flat_map(|e| e.extra_object().get("early_buyers").and_then(|v| v.as_array()).cloned().unwrap_or_default())
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect();

        let shared = own_snipers.intersection(&other_snipers).count();
        if shared >= config.min_sniper_overlap {
            let strength = (0.3 + 0.15 * shared as f64).min(1.0);
            edges.push(CartelEdge::new(deployer, other_deployer, SignalType::SniperRing, strength, json!({ "shared_count": shared })));
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_phash_reads_extra_json() {
        let mut event = TokenEvent::new(crate::model::EventType::TokenCreated, "mint");
        event.extra = json!({ "phash": 42 });
        assert_eq!(token_phash(&event), Some(42));
    }

    #[test]
    fn token_phash_missing_is_none() {
        let event = TokenEvent::new(crate::model::EventType::TokenCreated, "mint");
        assert_eq!(token_phash(&event), None);
    }
}

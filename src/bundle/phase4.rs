/// Phase 4 (SPEC_FULL.md §4.5): cross-wallet coordination signals computed
/// over the full bundle wallet set's Phase 2/3 results.
use std::collections::{HashMap, HashSet};

use crate::config::BundleConfig;
use crate::model::{PostSellBehavior, PreSellBehavior};

pub struct Coordination {
    pub common_prefund_sources: HashSet<String>,
    pub coordinated_sell_detected: bool,
    pub common_sink_wallets: HashSet<String>,
}

pub fn compute(
    config: &BundleConfig,
    pre_sells: &[(String, PreSellBehavior)],
    post_sells: &[(String, PostSellBehavior)],
) -> Coordination {
    let mut source_counts: HashMap<String, usize> = HashMap::new();
    for (_, pre) in pre_sells {
        if let Some(source) = &pre.prefund_source {
            *source_counts.entry(source.clone()).or_insert(0) += 1;
        }
    }
    let common_prefund_sources: HashSet<String> = source_counts.into_iter().filter(|(_, n)| *n >= 2).map(|(addr, _)| addr).collect();

    let mut sell_slots: Vec<u64> = post_sells.iter().filter_map(|(_, post)| post.sell_slot).collect();
    sell_slots.sort_unstable();
    let coordinated_sell_detected = sell_slots.windows(3).any(|w| w[2] - w[0] <= config.coordinated_sell_window_slots);

    let mut sink_counts: HashMap<String, usize> = HashMap::new();
    for (_, post) in post_sells {
        let mut seen_this_wallet: HashSet<&str> = HashSet::new();
        for dest in &post.destinations {
            if seen_this_wallet.insert(&dest.address) {
                *sink_counts.entry(dest.address.clone()).or_insert(0) += 1;
            }
        }
    }
    let common_sink_wallets: HashSet<String> = sink_counts.into_iter().filter(|(_, n)| *n >= 2).map(|(addr, _)| addr).collect();

    Coordination { common_prefund_sources, coordinated_sell_detected, common_sink_wallets }
}

pub fn apply_backfill(
    pre_sells: &mut [(String, PreSellBehavior)],
    post_sells: &mut [(String, PostSellBehavior)],
    coordination: &Coordination,
) {
    for (_, pre) in pre_sells.iter_mut() {
        if let Some(source) = &pre.prefund_source {
            if coordination.common_prefund_sources.contains(source) {
                pre.prefund_source_is_known_funder = true;
            }
        }
    }

    for (_, post) in post_sells.iter_mut() {
        for dest in post.destinations.iter_mut() {
            if coordination.common_sink_wallets.contains(&dest.address) {
                dest.seen_in_other_bundles = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_sells_within_window_are_coordinated() {
        let slots = vec![100u64, 101, 103];
        let mut sorted = slots.clone();
        sorted.sort_unstable();
        assert!(sorted.windows(3).any(|w| w[2] - w[0] <= 5));
    }

    #[test]
    fn widely_spaced_sells_are_not_coordinated() {
        let slots = vec![100u64, 500, 900];
        let mut sorted = slots.clone();
        sorted.sort_unstable();
        assert!(!sorted.windows(3).any(|w| w[2] - w[0] <= 5));
    }
}

/// Operator impact (SPEC_FULL.md §4.8, §4.9): aggregates a cartel
/// community's campaign footprint by summing the tiered extraction-rate
/// estimator across every community wallet and tracking its narrative
/// progression over time.
use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::timeout;

use crate::config::DerivationsConfig;
use crate::model::{CartelReport, NarrativeTimelineEntry, OperatorImpact};
use crate::store::EventStore;
use crate::sweeps;

pub async fn compute(store: &EventStore, community: &CartelReport, now: DateTime<Utc>, config: &DerivationsConfig) -> Option<OperatorImpact> {
    let deadline = Duration::from_secs(config.operator_impact_overall_timeout_secs);
    match timeout(deadline, build(store, community, now, config)).await {
        Ok(result) => result,
        Err(_) => None,
    }
}

async fn build(store: &EventStore, community: &CartelReport, now: DateTime<Utc>, config: &DerivationsConfig) -> Option<OperatorImpact> {
    if community.wallets.len() < 2 {
        return None;
    }

    let mut tokens_launched = 0u64;
    let mut tokens_rugged = 0u64;
    let mut estimated_extracted_usd = 0.0;
    let mut first_seen_by_narrative: BTreeMap<String, (DateTime<Utc>, u64)> = BTreeMap::new();
    let mut launch_timestamps: Vec<DateTime<Utc>> = Vec::new();

    for wallet in &community.wallets {
        let per_wallet_deadline = Duration::from_secs(config.operator_impact_per_wallet_timeout_secs);
        let Ok(Ok(launches)) = timeout(per_wallet_deadline, store.get_launches_by_deployer(wallet)).await else { continue };

        tokens_launched += launches.len() as u64;
        tokens_rugged += store.count_rugs_by_deployer(wallet).await.unwrap_or(0);
        estimated_extracted_usd += sweeps::estimate_extracted_usd_for_deployer(store, wallet).await;

        for launch in &launches {
            let Some(created_at) = launch.created_at else { continue };
            launch_timestamps.push(created_at);
            let narrative = launch.narrative.clone().unwrap_or_else(|| "other".to_string());
            let entry = first_seen_by_narrative.entry(narrative).or_insert((created_at, 0));
            if created_at < entry.0 {
                entry.0 = created_at;
            }
            entry.1 += 1;
        }
    }

    if launch_timestamps.is_empty() {
        return None;
    }

    let mut narrative_timeline: Vec<NarrativeTimelineEntry> = first_seen_by_narrative
        .into_iter()
        .map(|(narrative, (first_seen, token_count))| NarrativeTimelineEntry { narrative, first_seen, token_count })
        .collect();
    narrative_timeline.sort_by_key(|entry| entry.first_seen);

    let peak_concurrent_tokens = peak_within_window(&launch_timestamps, chrono::Duration::hours(config.operator_impact_peak_window_hours));
    let campaign_active = launch_timestamps.iter().any(|t| (now - *t) <= chrono::Duration::hours(config.operator_impact_campaign_active_hours));

    Some(OperatorImpact {
        community_id: community.community_id.clone(),
        tokens_launched,
        tokens_rugged,
        estimated_extracted_usd,
        narrative_timeline,
        peak_concurrent_tokens,
        campaign_active,
    })
}

/// Highest count of launches falling within any window anchored at an
/// observed launch timestamp, mirroring `narrative_timing`'s sliding window.
fn peak_within_window(timestamps: &[DateTime<Utc>], window: chrono::Duration) -> u64 {
    let mut sorted = timestamps.to_vec();
    sorted.sort();
    let mut peak = 0u64;
    for t in &sorted {
        let window_end = *t + window;
        let count = sorted.iter().filter(|x| **x >= *t && **x < window_end).count() as u64;
        peak = peak.max(count);
    }
    peak
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hours: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(0, 0).unwrap() + chrono::Duration::hours(hours)
    }

    #[test]
    fn peak_within_window_counts_the_densest_cluster() {
        let timestamps = vec![at(0), at(1), at(2), at(50), at(51)];
        assert_eq!(peak_within_window(&timestamps, chrono::Duration::hours(24)), 3);
    }

    #[test]
    fn peak_within_window_of_single_timestamp_is_one() {
        assert_eq!(peak_within_window(&[at(0)], chrono::Duration::hours(24)), 1);
    }
}

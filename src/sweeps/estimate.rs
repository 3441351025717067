/// Tiered extraction-rate estimator (SPEC_FULL.md §4.8), shared by the
/// cartel community report and operator impact.
use crate::store::EventStore;

pub fn extraction_rate(peak_mcap_usd: Option<f64>) -> f64 {
    match peak_mcap_usd {
        None => 0.15,
        Some(m) if m <= 0.0 => 0.15,
        Some(m) if m < 5_000.0 => 0.40,
        Some(m) if m < 50_000.0 => 0.30,
        Some(m) if m < 500_000.0 => 0.15,
        Some(_) => 0.08,
    }
}

/// `Σ peak_mcap × rate(peak_mcap)` over `deployer`'s rugged tokens
/// (SPEC_FULL.md §4.8 "Estimated extracted USD").
pub async fn estimate_extracted_usd_for_deployer(store: &EventStore, deployer: &str) -> f64 {
    let launches = store.get_launches_by_deployer(deployer).await.unwrap_or_default();
    let mut total = 0.0;
    for launch in launches {
        let events = store.get_events_by_mint(&launch.mint, 1000).await.unwrap_or_default();
        let rugged = events.iter().any(|e| e.event_type == crate::model::EventType::TokenRugged);
        if !rugged {
            continue;
        }
        let peak_mcap = events.iter().filter_map(|e| e.mcap_usd).fold(None, |acc: Option<f64>, m| Some(acc.map_or(m, |a| a.max(m))));
        total += peak_mcap.unwrap_or(0.0) * extraction_rate(peak_mcap);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_match_spec_thresholds() {
        assert_eq!(extraction_rate(Some(1_000.0)), 0.40);
        assert_eq!(extraction_rate(Some(10_000.0)), 0.30);
        assert_eq!(extraction_rate(Some(100_000.0)), 0.15);
        assert_eq!(extraction_rate(Some(1_000_000.0)), 0.08);
        assert_eq!(extraction_rate(None), 0.15);
        assert_eq!(extraction_rate(Some(0.0)), 0.15);
    }
}

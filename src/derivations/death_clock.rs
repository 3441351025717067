/// Death clock (SPEC_FULL.md §4.9): forecasts a token's remaining lifespan
/// from its deployer's own rug history.
use chrono::{DateTime, Utc};

use crate::model::{DeathClock, DeathClockBucket, EventType};
use crate::store::EventStore;

pub async fn compute(store: &EventStore, deployer: &str, current_created_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<DeathClock> {
    let launches = store.get_launches_by_deployer(deployer).await.ok()?;

    let mut lifespans = Vec::new();
    for launch in &launches {
        let Some(created_at) = launch.created_at else { continue };
        let history = store.get_events_by_mint(&launch.mint, 1000).await.unwrap_or_default();
        let rugged_at = history.iter().find(|e| e.event_type == EventType::TokenRugged).and_then(|e| e.rugged_at.or(Some(e.recorded_at)));
        if let Some(rugged_at) = rugged_at {
            lifespans.push((rugged_at - created_at).num_seconds().max(0) as f64);
        }
    }

    from_lifespans(&lifespans, current_created_at, now)
}

fn from_lifespans(lifespans: &[f64], current_created_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<DeathClock> {
    if lifespans.len() < 2 {
        return None;
    }

    let median = median_of(lifespans);
    let mean = lifespans.iter().sum::<f64>() / lifespans.len() as f64;
    let variance = lifespans.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / lifespans.len() as f64;
    let stdev = variance.sqrt().min(2.0 * median);

    let elapsed = (now - current_created_at).num_seconds().max(0) as f64;
    let ratio = if median > 0.0 { elapsed / median } else { 0.0 };

    let bucket = if ratio < 0.5 {
        DeathClockBucket::Low
    } else if ratio < 0.8 {
        DeathClockBucket::Medium
    } else if ratio < 1.0 {
        DeathClockBucket::High
    } else {
        DeathClockBucket::Critical
    };

    Some(DeathClock { median_lifespan_secs: median, stdev_lifespan_secs: stdev, elapsed_secs: elapsed, ratio, bucket })
}

fn median_of(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn insufficient_history_returns_none() {
        let now = Utc.timestamp_opt(1_000_000, 0).unwrap();
        assert!(from_lifespans(&[100.0], now, now).is_none());
    }

    #[test]
    fn ratio_past_one_is_critical() {
        let created = Utc.timestamp_opt(0, 0).unwrap();
        let now = Utc.timestamp_opt(1_000, 0).unwrap();
        let clock = from_lifespans(&[500.0, 500.0, 500.0], created, now).unwrap();
        assert_eq!(clock.bucket, DeathClockBucket::Critical);
    }

    #[test]
    fn stdev_is_capped_at_twice_median() {
        let created = Utc.timestamp_opt(0, 0).unwrap();
        let now = Utc.timestamp_opt(100, 0).unwrap();
        let clock = from_lifespans(&[1.0, 1.0, 100_000.0], created, now).unwrap();
        assert!(clock.stdev_lifespan_secs <= 2.0 * clock.median_lifespan_secs);
    }
}

/// Narrative timing (SPEC_FULL.md §4.9): places the current token within its
/// narrative category's hype cycle, relative to every other launch in the
/// same category over the lookback window.
use chrono::{DateTime, Duration, Utc};

use crate::config::DerivationsConfig;
use crate::model::{EventType, NarrativeStatus, NarrativeTiming};
use crate::store::EventStore;

pub async fn compute(
    store: &EventStore,
    narrative: &str,
    current_created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    config: &DerivationsConfig,
) -> Option<NarrativeTiming> {
    let cutoff = (now - Duration::days(config.narrative_lookback_days)).to_rfc3339();
    let event_type = EventType::TokenCreated.as_str();
    let events = store
        .query_events("event_type = ?1 AND narrative = ?2 AND created_at >= ?3", &[&event_type, &narrative, &cutoff], 10_000, "created_at ASC")
        .await
        .ok()?;

    let timestamps: Vec<DateTime<Utc>> = events.iter().filter_map(|e| e.created_at).collect();
    from_history(&timestamps, narrative, current_created_at, now, config)
}

fn from_history(timestamps: &[DateTime<Utc>], narrative: &str, current_created_at: DateTime<Utc>, now: DateTime<Utc>, config: &DerivationsConfig) -> Option<NarrativeTiming> {
    if timestamps.len() < config.min_narrative_history {
        return None;
    }

    let mut sorted = timestamps.to_vec();
    sorted.sort();

    let rank = sorted.iter().filter(|t| **t <= current_created_at).count();
    let cycle_percentile = rank as f64 / sorted.len() as f64;

    let peak_window_count = sliding_7day_peak(&sorted);
    let recent_cutoff = now - Duration::days(7);
    let recent_7d_count = sorted.iter().filter(|t| **t >= recent_cutoff).count() as u64;
    let momentum = if peak_window_count > 0 { (recent_7d_count as f64 / peak_window_count as f64).min(1.0) } else { 0.0 };

    let status = if momentum < 0.2 {
        NarrativeStatus::Early
    } else if momentum < 0.5 {
        NarrativeStatus::Rising
    } else if momentum < 0.75 {
        NarrativeStatus::Peak
    } else {
        NarrativeStatus::Late
    };

    Some(NarrativeTiming { narrative: narrative.to_string(), cycle_percentile, peak_window_count, momentum, status })
}

/// Highest count of launches falling within any 7-day window anchored at an
/// observed launch timestamp.
fn sliding_7day_peak(sorted: &[DateTime<Utc>]) -> u64 {
    let mut peak = 0u64;
    for t in sorted {
        let window_end = *t + Duration::days(7);
        let count = sorted.iter().filter(|x| **x >= *t && **x < window_end).count() as u64;
        peak = peak.max(count);
    }
    peak
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(days: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(0, 0).unwrap() + Duration::days(days)
    }

    fn config() -> DerivationsConfig {
        DerivationsConfig::default()
    }

    #[test]
    fn insufficient_history_returns_none() {
        let ts = vec![at(0), at(1), at(2)];
        assert!(from_history(&ts, "pepe", at(2), at(2), &config()).is_none());
    }

    #[test]
    fn dense_recent_cluster_is_late_momentum() {
        // 10 launches far in the past, then a dense burst in the last week.
        let mut ts: Vec<DateTime<Utc>> = (0..10).map(at).collect();
        for i in 0..8 {
            ts.push(at(90) - Duration::hours(i));
        }
        let now = at(90);
        let timing = from_history(&ts, "pepe", at(90), now, &config()).unwrap();
        assert!(timing.momentum > 0.5);
    }

    #[test]
    fn sparse_recent_activity_after_an_early_peak_is_early() {
        // Dense 7-day cluster near day 0 sets the peak; only one launch
        // lands in the most recent 7-day window.
        let mut ts: Vec<DateTime<Utc>> = (0..=6).map(at).collect();
        ts.extend((1..=8).map(|i| at(6 + i * 10)));
        let now = at(90);
        let timing = from_history(&ts, "pepe", now, now, &config()).unwrap();
        assert_eq!(timing.status, NarrativeStatus::Early);
    }
}

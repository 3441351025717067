/// Factory rhythm (SPEC_FULL.md §4.9): detects a deployer running a serial
/// token-launch operation from the regularity of its launch cadence and
/// naming scheme.
use chrono::{DateTime, Utc};

use crate::config::DerivationsConfig;
use crate::model::{FactoryRhythm, NamingPattern};
use crate::narrative;
use crate::store::EventStore;

pub async fn compute(store: &EventStore, deployer: &str, config: &DerivationsConfig) -> Option<FactoryRhythm> {
    let launches = store.get_launches_by_deployer(deployer).await.ok()?;

    let timestamps: Vec<DateTime<Utc>> = launches.iter().filter_map(|e| e.created_at).collect();
    let names: Vec<String> = launches.iter().filter_map(|e| e.name.clone()).collect();
    let mcaps: Vec<f64> = launches.iter().filter_map(|e| e.mcap_usd).collect();

    from_history(&timestamps, &names, &mcaps, config)
}

fn from_history(timestamps: &[DateTime<Utc>], names: &[String], mcaps: &[f64], config: &DerivationsConfig) -> Option<FactoryRhythm> {
    if timestamps.len() < config.min_factory_rhythm_history {
        return None;
    }

    let mut sorted = timestamps.to_vec();
    sorted.sort();
    let intervals: Vec<f64> = sorted.windows(2).map(|w| (w[1] - w[0]).num_seconds().max(0) as f64).collect();
    if intervals.is_empty() {
        return None;
    }

    let median_interval_secs = median_of(&intervals);
    let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
    let variance = intervals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / intervals.len() as f64;
    let stdev = variance.sqrt();
    let regularity = if median_interval_secs > 0.0 { (1.0 - stdev / median_interval_secs).clamp(0.0, 1.0) } else { 0.0 };

    let naming_pattern = detect_naming_pattern(names);
    let mcap_consistency = consistency_of(mcaps);

    let factory_score = 0.55 * regularity
        + 0.30 * if naming_pattern == NamingPattern::Incremental { 1.0 } else { 0.0 }
        + 0.15 * mcap_consistency;
    let is_factory = factory_score >= config.factory_score_threshold;

    Some(FactoryRhythm { median_interval_secs, regularity, naming_pattern, factory_score, is_factory })
}

/// Strips trailing digits off every name; a shared non-empty prefix across
/// all launches is read as a counter scheme ("Pepe 1", "Pepe 2", ...).
/// Falls back to the shared narrative category, else random.
fn detect_naming_pattern(names: &[String]) -> NamingPattern {
    if names.len() < 2 {
        return NamingPattern::Random;
    }

    let stripped: Vec<String> = names.iter().map(|n| n.trim_end_matches(|c: char| c.is_ascii_digit() || c.is_whitespace()).to_string()).collect();
    let first = &stripped[0];
    if !first.trim().is_empty() && stripped.iter().all(|s| s == first) {
        return NamingPattern::Incremental;
    }

    let categories: Vec<String> = names.iter().map(|n| narrative::classify(n, "")).collect();
    let themed = categories.iter().filter(|c| c.as_str() != "other").count();
    if themed > 0 && themed * 2 >= categories.len() {
        NamingPattern::Themed
    } else {
        NamingPattern::Random
    }
}

fn consistency_of(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean <= 0.0 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    let cv = variance.sqrt() / mean;
    (1.0 - cv).clamp(0.0, 1.0)
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

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn config() -> DerivationsConfig {
        DerivationsConfig::default()
    }

    #[test]
    fn short_history_returns_none() {
        let ts = [at(0), at(3600)];
        assert!(from_history(&ts, &[], &[], &config()).is_none());
    }

    #[test]
    fn regular_cadence_is_high_regularity() {
        let ts = vec![at(0), at(3600), at(7200), at(10800)];
        let names = vec!["Coin1".to_string(), "Coin2".to_string(), "Coin3".to_string(), "Coin4".to_string()];
        let clock = from_history(&ts, &names, &[], &config()).unwrap();
        assert!(clock.regularity > 0.9);
        assert_eq!(clock.naming_pattern, NamingPattern::Incremental);
        assert!(clock.is_factory);
    }

    #[test]
    fn irregular_cadence_with_unrelated_names_is_not_factory() {
        let ts = vec![at(0), at(500), at(900_000), at(901_000)];
        let names = vec!["Zebra".to_string(), "Quantum".to_string(), "Rocket".to_string(), "Ocean".to_string()];
        let clock = from_history(&ts, &names, &[], &config()).unwrap();
        assert!(!clock.is_factory);
    }

    #[test]
    fn naming_pattern_detects_incremental_prefix() {
        let names = vec!["Pepe1".to_string(), "Pepe2".to_string(), "Pepe3".to_string()];
        assert_eq!(detect_naming_pattern(&names), NamingPattern::Incremental);
    }
}

/// Alert sweep (SPEC_FULL.md §4.8): matches recent launches against active
/// subscriptions and dispatches one notification per match.
use std::sync::Arc;

use chrono::Utc;

use crate::config::SweepConfig;
use crate::logger::{self, LogTag};
use crate::model::{EventType, SubscriptionType, TokenEvent};
use crate::store::EventStore;

/// A single dispatched alert, handed to the caller-supplied notifier.
pub struct AlertMatch {
    pub chat_id: i64,
    pub event: TokenEvent,
}

pub async fn run_once(store: &Arc<EventStore>, config: &SweepConfig) -> Vec<AlertMatch> {
    let cutoff = Utc::now() - chrono::Duration::seconds(config.alert_sweep_lookback_secs);
    let recent = store
        .query_events(
            "event_type = ?1 AND recorded_at > ?2",
            &[&EventType::TokenCreated.as_str(), &(cutoff.timestamp() as f64)],
            10_000,
            "recorded_at DESC",
        )
        .await
        .unwrap_or_default();

    let subscriptions = store.all_subscriptions().await.unwrap_or_default();
    let mut matches = Vec::new();

    for subscription in &subscriptions {
        for event in &recent {
            let matched = match subscription.sub_type {
                SubscriptionType::Deployer => event.deployer.as_deref() == Some(subscription.value.as_str()),
                SubscriptionType::Narrative => event.narrative.as_deref() == Some(subscription.value.as_str()),
            };
            if matched {
                matches.push(AlertMatch { chat_id: subscription.chat_id, event: event.clone() });
            }
        }
    }

    logger::info(LogTag::Sweep, &format!("alert_sweep: {} matches across {} subscriptions", matches.len(), subscriptions.len()));
    matches
}

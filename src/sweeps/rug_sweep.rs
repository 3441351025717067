/// Rug sweep (SPEC_FULL.md §4.8): detects liquidity collapse on recent
/// launches and kicks off SOL-flow tracing for confirmed rugs.
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;

use crate::config::SweepConfig;
use crate::logger::{self, LogTag};
use crate::market::MarketClient;
use crate::model::{EventType, TokenEvent};
use crate::sol_flow::SolFlowTracer;
use crate::store::EventStore;

pub async fn run_once(store: &Arc<EventStore>, market: &Arc<MarketClient>, sol_flow: &Arc<SolFlowTracer>, config: &SweepConfig) -> usize {
    let cutoff = Utc::now() - chrono::Duration::hours(config.rug_sweep_lookback_hours);
    let candidates = store
        .query_events(
            "event_type = ?1 AND liq_usd > ?2 AND recorded_at > ?3",
            &[&EventType::TokenCreated.as_str(), &500.0f64, &(cutoff.timestamp() as f64)],
            10_000,
            "recorded_at DESC",
        )
        .await
        .unwrap_or_default();

    let mut not_yet_rugged = Vec::new();
    for candidate in candidates {
        let history = store.get_events_by_mint(&candidate.mint, 1000).await.unwrap_or_default();
        if !history.iter().any(|e| e.event_type == EventType::TokenRugged) {
            not_yet_rugged.push(candidate);
        }
    }

    let semaphore = Arc::new(Semaphore::new(config.rug_sweep_concurrency));
    let mut handles = Vec::new();

    for candidate in not_yet_rugged {
        let store = store.clone();
        let market = market.clone();
        let sol_flow = sol_flow.clone();
        let config = config.clone();
        let permit = semaphore.clone();

        handles.push(tokio::spawn(async move {
            let _permit = permit.acquire_owned().await.ok()?;
            check_candidate(&store, &market, &sol_flow, &config, candidate).await;
            Some(())
        }));
    }

    let mut rugged = 0usize;
    for handle in handles {
        if let Ok(Some(())) = handle.await {
            rugged += 1;
        }
    }
    rugged
}

async fn check_candidate(store: &EventStore, market: &MarketClient, sol_flow: &Arc<SolFlowTracer>, config: &SweepConfig, candidate: TokenEvent) {
    let pairs = market.get_pairs_for_mint(&candidate.mint).await;
    let total_liquidity: f64 = pairs.iter().filter_map(|p| p.liquidity_usd).sum();

    if total_liquidity >= config.rug_liquidity_threshold_usd {
        return;
    }

    let mut event = TokenEvent::new(EventType::TokenRugged, candidate.mint.clone());
    event.deployer = candidate.deployer.clone();
    event.name = candidate.name.clone();
    event.symbol = candidate.symbol.clone();
    event.liq_usd = Some(total_liquidity);
    event.rugged_at = Some(Utc::now());

    if let Err(e) = store.insert_event(&event).await {
        logger::warning(LogTag::Sweep, &format!("rug_sweep: failed to record token_rugged for {}: {}", candidate.mint, e));
        return;
    }

    logger::info(LogTag::Sweep, &format!("rug_sweep: {} rugged (liquidity ${:.2})", candidate.mint, total_liquidity));

    if let Some(deployer) = candidate.deployer {
        let mint = candidate.mint.clone();
        let sol_flow = sol_flow.clone();
        tokio::spawn(async move {
            sol_flow.trace(&mint, &deployer).await;
        });
    }
}

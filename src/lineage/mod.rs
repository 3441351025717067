/// Lineage Engine (SPEC_FULL.md §4.4): given a mint, finds its token family
/// (root launch + derivative relaunches) and a confidence score.
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;

use crate::config::SimilarityConfig;
use crate::http::HttpShell;
use crate::market::MarketClient;
use crate::model::{LineageMember, LineageResult, Token};
use crate::rpc_client::RpcClient;
use crate::similarity::{self, CompositeInputs};
use crate::store::EventStore;

pub struct LineageEngine {
    rpc: Arc<RpcClient>,
    market: Arc<MarketClient>,
    store: Arc<EventStore>,
    shell: Arc<HttpShell>,
    similarity: SimilarityConfig,
}

impl LineageEngine {
    pub fn new(rpc: Arc<RpcClient>, market: Arc<MarketClient>, store: Arc<EventStore>, shell: Arc<HttpShell>, similarity: SimilarityConfig) -> Self {
        Self { rpc, market, store, shell, similarity }
    }

    /// Cache key for a lineage result (SPEC_FULL.md §4.4 step 9).
    fn cache_key(mint: &str) -> String {
        format!("lineage:{}", mint)
    }

    pub async fn detect_lineage(&self, mint: &str) -> LineageResult {
        if let Some(cached) = self.store.cache_get_json::<LineageResult>(&Self::cache_key(mint)).await {
            return cached;
        }

        let result = self.compute_lineage(mint).await;
        let _ = self
            .store
            .cache_set_json(&Self::cache_key(mint), &result, std::time::Duration::from_secs(600))
            .await;
        result
    }

    async fn compute_lineage(&self, mint: &str) -> LineageResult {
        if !crate::model::is_valid_mint(mint) {
            return LineageResult::solo(crate::model::Token::empty(mint));
        }

        // Step 1: query token from best-liquidity pair.
        let pairs = self.market.get_pairs_for_mint(mint).await;
        let mut query_token = best_pair_token(mint, &pairs);

        // Step 2: enrich with on-chain deployer + timestamp.
        if let Some((deployer, created_at)) = self.rpc.get_deployer_and_timestamp(mint).await {
            query_token.deployer = Some(deployer);
            query_token.created_at = DateTime::<Utc>::from_timestamp(created_at, 0);
        }

        if query_token.has_no_identity() {
            return LineageResult::solo(query_token);
        }

        // Step 3: search by name (fallback: symbol), dedup, Solana-only.
        let search_term = if !query_token.name.trim().is_empty() { &query_token.name } else { &query_token.symbol };
        let mut candidate_pairs = self.market.search_pairs(search_term).await;
        if candidate_pairs.is_empty() && search_term != &query_token.symbol {
            candidate_pairs = self.market.search_pairs(&query_token.symbol).await;
        }

        let max_candidates = self.similarity.max_derivatives * 2;
        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(query_token.mint.clone());

        let candidates: Vec<Token> = candidate_pairs
            .into_iter()
            .filter(|p| p.chain_id == "solana")
            .filter(|p| seen.insert(p.mint.clone()))
            .take(max_candidates)
            .map(|p| pair_to_token(&p))
            .collect();

        // Step 4: cheap pre-filter.
        let survivors: Vec<Token> = candidates
            .into_iter()
            .filter(|c| similarity::passes_prefilter(&self.similarity, &query_token, c))
            .collect();

        // Step 5: bounded-parallel enrichment + scoring.
        let semaphore = Arc::new(Semaphore::new(self.similarity.candidate_enrichment_concurrency));
        let mut handles = Vec::new();

        for candidate in survivors {
            let rpc = self.rpc.clone();
            let shell = self.shell.clone();
            let store = self.store.clone();
            let similarity_cfg = self.similarity.clone();
            let query = query_token.clone();
            let permit = semaphore.clone();

            handles.push(tokio::spawn(async move {
                let _permit = permit.acquire_owned().await.ok()?;
                enrich_and_score(&rpc, &shell, &store, &similarity_cfg, &query, candidate).await
            }));
        }

        let mut derivatives = Vec::new();
        for handle in handles {
            if let Ok(Some(member)) = handle.await {
                derivatives.push(member);
            }
        }

        // Step 6: select root across query + derivatives.
        let mut family: Vec<LineageMember> = derivatives.clone();
        family.push(LineageMember { token: query_token.clone(), composite_score: 1.0 });

        let root = family
            .iter()
            .max_by(|a, b| root_sort_key(&a.token).partial_cmp(&root_sort_key(&b.token)).unwrap_or(std::cmp::Ordering::Equal))
            .map(|m| m.token.clone())
            .unwrap_or_else(|| query_token.clone());

        // Step 7: derivatives = family minus root, sorted desc, truncated.
        derivatives.retain(|m| m.token.mint != root.mint);
        derivatives.sort_by(|a, b| b.composite_score.partial_cmp(&a.composite_score).unwrap_or(std::cmp::Ordering::Equal));
        derivatives.truncate(self.similarity.max_derivatives);

        let family_size = derivatives.len() + 1;

        // Step 8: confidence.
        let confidence = compute_confidence(&root, &derivatives);

        LineageResult {
            query_token,
            root,
            derivatives,
            family_size,
            confidence,
            signals: Default::default(),
        }
    }
}

fn best_pair_token(mint: &str, pairs: &[crate::model::DexPair]) -> Token {
    let best = pairs.iter().max_by(|a, b| {
        a.liquidity_usd.unwrap_or(0.0).partial_cmp(&b.liquidity_usd.unwrap_or(0.0)).unwrap_or(std::cmp::Ordering::Equal)
    });

    match best {
        Some(p) => pair_to_token(p),
        None => Token::empty(mint),
    }
}

fn pair_to_token(pair: &crate::model::DexPair) -> Token {
    Token {
        mint: pair.mint.clone(),
        name: pair.name.clone(),
        symbol: pair.symbol.clone(),
        image_uri: pair.image_url.clone(),
        deployer: None,
        created_at: pair.pair_created_at_ms.and_then(|ms| DateTime::<Utc>::from_timestamp_millis(ms)),
        market_cap_usd: pair.market_cap_usd,
        liquidity_usd: pair.liquidity_usd,
        dex_url: pair.dex_url.clone(),
        metadata_uri: None,
        chain_id: Some(pair.chain_id.clone()),
    }
}

async fn enrich_and_score(
    rpc: &RpcClient,
    shell: &HttpShell,
    store: &EventStore,
    config: &SimilarityConfig,
    query: &Token,
    mut candidate: Token,
) -> Option<LineageMember> {
    if let Some((deployer, created_at)) = rpc.get_deployer_and_timestamp(&candidate.mint).await {
        candidate.deployer = Some(deployer);
        candidate.created_at = DateTime::<Utc>::from_timestamp(created_at, 0);
    }

    let image_sim = match (query.image_uri.as_deref(), candidate.image_uri.as_deref()) {
        (Some(a), Some(b)) => {
            let fa = crate::similarity::fetch_image_fingerprint(&shell.pool, a).await;
            let fb = crate::similarity::fetch_image_fingerprint(&shell.pool, b).await;
            match (fa, fb) {
                (Some(fa), Some(fb)) => Some(crate::similarity::image_similarity_from_fingerprints(fa, fb)),
                _ => None,
            }
        }
        _ => None,
    };

    let shares_dna = match (&query.deployer, &candidate.deployer) {
        (Some(a), Some(b)) if a != b => store
            .operator_fingerprint_groups()
            .await
            .unwrap_or_default()
            .into_iter()
            .any(|(_, wallets)| wallets.contains(a) && wallets.contains(b)),
        _ => false,
    };

    let inputs = CompositeInputs {
        name_sim: similarity::text_similarity(&query.name, &candidate.name),
        symbol_sim: similarity::text_similarity(&query.symbol, &candidate.symbol),
        image_sim,
        deployer_sim: similarity::deployer_score(&query.deployer, &candidate.deployer, shares_dna),
        temporal_sim: similarity::temporal_score(query.created_at, candidate.created_at),
    };

    let composite_score = similarity::composite_score(config, &inputs);
    Some(LineageMember { token: candidate, composite_score })
}

/// `(−created_at, liquidity, market_cap)` maximum — ties broken toward
/// older, higher-liquidity, higher-mcap (SPEC_FULL.md §4.4 step 6).
fn root_sort_key(token: &Token) -> (f64, f64, f64) {
    let neg_created_at = token.created_at.map(|t| -(t.timestamp() as f64)).unwrap_or(f64::MIN);
    (neg_created_at, token.liquidity_usd.unwrap_or(0.0), token.market_cap_usd.unwrap_or(0.0))
}

/// `0.4*temporal + 0.35*liquidity + 0.25*(1 - ambiguity)` (SPEC_FULL.md §4.4 step 8).
fn compute_confidence(root: &Token, derivatives: &[LineageMember]) -> f64 {
    if derivatives.is_empty() {
        return 0.0;
    }

    let newer_than_root = derivatives
        .iter()
        .filter(|d| match (d.token.created_at, root.created_at) {
            (Some(dc), Some(rc)) => dc > rc,
            _ => false,
        })
        .count();
    let temporal = newer_than_root as f64 / derivatives.len() as f64;

    let total_liq: f64 = derivatives.iter().map(|d| d.token.liquidity_usd.unwrap_or(0.0)).sum::<f64>() + root.liquidity_usd.unwrap_or(0.0);
    let liquidity = if total_liq > 0.0 { root.liquidity_usd.unwrap_or(0.0) / total_liq } else { 0.0 };

    let ambiguous = derivatives.iter().filter(|d| d.composite_score > 0.8).count();
    let ambiguity = ambiguous as f64 / derivatives.len() as f64;

    (0.4 * temporal + 0.35 * liquidity + 0.25 * (1.0 - ambiguity)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_sort_key_prefers_older_token() {
        let older = Token { created_at: Some(Utc.timestamp_opt(100, 0).unwrap()), ..Token::empty("a") };
        let newer = Token { created_at: Some(Utc.timestamp_opt(200, 0).unwrap()), ..Token::empty("b") };
        assert!(root_sort_key(&older) > root_sort_key(&newer));
    }

    use chrono::TimeZone;

    #[test]
    fn confidence_is_zero_with_no_derivatives() {
        assert_eq!(compute_confidence(&Token::empty("root"), &[]), 0.0);
    }
}

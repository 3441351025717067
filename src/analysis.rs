/// Top-level forensic facade (SPEC_FULL.md §2 "Control flow", §6 "Exposed
/// operations"). Owns every long-lived dependency — HTTP shell, circuit
/// breaker manager, RPC/market clients, event store, and the per-component
/// engines — as explicit values created once at startup and threaded into
/// every operation, in place of a global service registry: one struct a
/// caller constructs once and holds for the life of the process.
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::bundle::BundleForensics;
use crate::cartel::CartelBuilder;
use crate::config::{self, Config};
use crate::derivations;
use crate::http::{self, ClientPool, HttpShell};
use crate::lineage::LineageEngine;
use crate::logger::{self, LogTag};
use crate::market::MarketClient;
use crate::model::{AlertSubscription, EventType, LineageResult, SolFlowReport, SubscriptionType, TokenEvent, TokenSearchResult};
use crate::rpc::circuit_breaker::{CircuitBreakerManager, CircuitBreakerStatus};
use crate::rpc_client::RpcClient;
use crate::similarity;
use crate::sol_flow::SolFlowTracer;
use crate::store::EventStore;
use crate::sweeps::Sweeper;

/// The forensic pipeline's dependency container. One instance lives for
/// the life of the process; `analyze`/`search`/... borrow `&self`.
pub struct Forensics {
    rpc: Arc<RpcClient>,
    market: Arc<MarketClient>,
    store: Arc<EventStore>,
    shell: Arc<HttpShell>,
    breakers: Arc<CircuitBreakerManager>,
    lineage: LineageEngine,
    bundle: BundleForensics,
    sol_flow: Arc<SolFlowTracer>,
    cartel: Arc<CartelBuilder>,
    config: Config,
}

impl Forensics {
    /// Builds every dependency from `config` and opens the Event Store.
    /// Does not start the background sweeps — call [`Forensics::sweeper`]
    /// and `start_all` for that once the caller is ready to run them.
    pub async fn new(config: Config) -> Result<Self, String> {
        let breakers = Arc::new(CircuitBreakerManager::with_config(http::default_breaker_config(
            config.circuit_breaker.failure_threshold,
            config.circuit_breaker.success_threshold,
            Duration::from_secs(config.circuit_breaker.recovery_timeout_secs),
        )));

        let shell = Arc::new(HttpShell::new(
            breakers.clone(),
            config.rpc.max_retries,
            Duration::from_secs_f64(config.rpc.backoff_base_secs),
        ));

        let rpc = Arc::new(RpcClient::new(shell.clone(), config.rpc.endpoint.clone()));
        let market = Arc::new(MarketClient::new(shell.clone(), config.rpc.dexscreener_base_url.clone(), config.rpc.jupiter_base_url.clone()));
        let store = Arc::new(EventStore::new(&config.cache.sqlite_path).await?);

        let lineage = LineageEngine::new(rpc.clone(), market.clone(), store.clone(), shell.clone(), config.similarity.clone());
        let bundle = BundleForensics::new(rpc.clone(), store.clone(), config.bundle.clone());
        let sol_flow = Arc::new(SolFlowTracer::new(rpc.clone(), market.clone(), store.clone(), config.sol_flow.clone(), None));
        let cartel = Arc::new(CartelBuilder::new(rpc.clone(), store.clone(), config.cartel.clone()));

        Ok(Self { rpc, market, store, shell, breakers, lineage, bundle, sol_flow, cartel, config })
    }

    /// Loads the global config (hot-reloadable) and builds a `Forensics`
    /// from it. The usual way to construct one at process startup.
    pub async fn from_global_config() -> Result<Self, String> {
        Self::new(config::get_config_clone()).await
    }

    pub fn store(&self) -> Arc<EventStore> {
        self.store.clone()
    }

    pub fn client_pool(&self) -> &ClientPool {
        &self.shell.pool
    }

    /// Background sweep loops (SPEC_FULL.md §4.8). Not started automatically
    /// so short-lived callers (a one-shot CLI, a test) don't pay for them.
    pub fn sweeper(&self) -> Sweeper {
        Sweeper::new(
            self.store.clone(),
            self.market.clone(),
            self.sol_flow.clone(),
            self.cartel.clone(),
            self.config.sweeps.clone(),
            self.config.cartel.clone(),
            self.config.events.clone(),
        )
    }

    /// `analyze(mint) -> LineageResult` (SPEC_FULL.md §6). Runs the lineage
    /// engine first (it alone determines the token family and the query
    /// token's deployer), then attaches every forensic signal that depends
    /// on that family: bundle forensics and SOL flow for the query token,
    /// the eight derivations, and the deployer's cartel community.
    pub async fn analyze(&self, mint: &str) -> LineageResult {
        let mut result = self.lineage.detect_lineage(mint).await;

        let Some(deployer) = result.query_token.deployer.clone() else {
            return result;
        };
        let now = Utc::now();

        let narrative = crate::narrative::classify(&result.query_token.name, &result.query_token.symbol);
        self.record_token_created(&result.query_token, &deployer, &narrative).await;

        let (bundle_report, sol_flow_report) =
            tokio::join!(self.bundle.analyze(mint, &deployer), self.sol_flow_report_or_trace(mint, &deployer));

        let linked_wallets: Vec<String> = bundle_report
            .as_ref()
            .map(|r| r.wallets.iter().map(|w| w.wallet.clone()).collect())
            .unwrap_or_default();

        let family: Vec<crate::model::Token> = std::iter::once(result.query_token.clone())
            .chain(result.derivatives.iter().map(|d| d.token.clone()))
            .collect();

        let (zombie_alert, death_clock, factory_rhythm, on_chain_risk, operator_fingerprint) = tokio::join!(
            derivations::zombie::detect(&self.shell.pool, &family, now, &self.config.derivations),
            derivations::death_clock::compute(&self.store, &deployer, result.query_token.created_at.unwrap_or(now), now),
            derivations::factory_rhythm::compute(&self.store, &deployer, &self.config.derivations),
            derivations::on_chain_risk::compute(&self.rpc, mint, &deployer, &self.config.derivations),
            derivations::operator_fingerprint::signal_for_deployer(&self.store, &deployer),
        );

        let narrative_timing = derivations::narrative_timing::compute(
            &self.store,
            &narrative,
            result.query_token.created_at.unwrap_or(now),
            now,
            &self.config.derivations,
        )
        .await;

        let pairs = self.market.get_pairs_for_mint(mint).await;
        let insider_sell = derivations::insider_sell::compute(&self.rpc, &pairs, mint, &deployer, &linked_wallets).await;
        let liquidity_architecture = derivations::liquidity_architecture::compute(&pairs, false);

        let community = self.cartel.community_report(&deployer).await;
        let operator_impact = match &community {
            Some(c) => self.cartel.operator_impact(c, now, &self.config.derivations).await,
            None => None,
        };

        result.signals.zombie_alert = zombie_alert;
        result.signals.death_clock = death_clock;
        result.signals.factory_rhythm = factory_rhythm;
        result.signals.narrative_timing = narrative_timing;
        result.signals.operator_fingerprint = operator_fingerprint;
        result.signals.on_chain_risk = on_chain_risk;
        result.signals.insider_sell = insider_sell;
        result.signals.liquidity_architecture = liquidity_architecture;
        result.signals.bundle_report = bundle_report;
        result.signals.sol_flow_report = sol_flow_report;
        result.signals.cartel_report = community;
        result.signals.operator_impact = operator_impact;

        result
    }

    /// Writes the one `token_created` row a mint ever gets (SPEC_FULL.md
    /// §4.7 "the eight cartel signals ... read the `token_created` log");
    /// every deployer-history and timing/narrative derivation reads this
    /// log, so skipping the write leaves them all querying an empty table.
    /// A no-op once the row exists. Fetches the content fingerprint for
    /// signal 4 (`phash_cluster`) at creation time, since the image is
    /// cheapest to fetch while the token is already in hand.
    async fn record_token_created(&self, token: &crate::model::Token, deployer: &str, narrative: &str) {
        if matches!(self.store.get_token_created_event(&token.mint).await, Ok(Some(_))) {
            return;
        }

        let phash = match &token.image_uri {
            Some(url) => similarity::fetch_image_fingerprint(&self.shell.pool, url).await,
            None => None,
        };

        let mut event = TokenEvent::new(EventType::TokenCreated, token.mint.clone());
        event.deployer = Some(deployer.to_string());
        event.name = Some(token.name.clone());
        event.symbol = Some(token.symbol.clone());
        event.narrative = Some(narrative.to_string());
        event.mcap_usd = token.market_cap_usd;
        event.liq_usd = token.liquidity_usd;
        event.created_at = token.created_at;
        event.extra = serde_json::json!({ "phash": phash });

        if let Err(e) = self.store.insert_event(&event).await {
            logger::warning(LogTag::System, &format!("record_token_created({}) failed: {}", token.mint, e));
        }
    }

    async fn sol_flow_report_or_trace(&self, mint: &str, deployer: &str) -> Option<SolFlowReport> {
        if let Some(cached) = self.sol_flow.get_sol_flow_report(mint).await {
            return Some(cached);
        }
        Some(self.sol_flow.trace(mint, deployer).await)
    }

    /// `search(query) -> list[TokenSearchResult]` (SPEC_FULL.md §6).
    pub async fn search(&self, query: &str) -> Vec<TokenSearchResult> {
        self.market
            .search_pairs(query)
            .await
            .into_iter()
            .filter(|p| p.chain_id == "solana")
            .map(|p| TokenSearchResult {
                mint: p.mint,
                name: p.name,
                symbol: p.symbol,
                market_cap_usd: p.market_cap_usd,
                liquidity_usd: p.liquidity_usd,
            })
            .collect()
    }

    /// `get_sol_flow_report(mint)` (SPEC_FULL.md §6).
    pub async fn get_sol_flow_report(&self, mint: &str) -> Option<SolFlowReport> {
        self.sol_flow.get_sol_flow_report(mint).await
    }

    /// `get_cached_bundle_report(mint)` (SPEC_FULL.md §6).
    pub async fn get_cached_bundle_report(&self, mint: &str) -> Option<crate::model::BundleExtractionReport> {
        self.store.bundle_report_get_fresh(mint).await.ok().flatten()
    }

    /// `subscribe(chat_id, sub_type, value)` (SPEC_FULL.md §6).
    pub async fn subscribe(&self, chat_id: i64, sub_type: SubscriptionType, value: &str) -> Result<(), String> {
        self.store.subscribe(chat_id, sub_type, value).await
    }

    /// `unsubscribe(chat_id, sub_type, value)` (SPEC_FULL.md §6).
    pub async fn unsubscribe(&self, chat_id: i64, sub_type: SubscriptionType, value: &str) -> Result<(), String> {
        self.store.unsubscribe(chat_id, sub_type, value).await
    }

    /// `list_subscriptions(chat_id)` (SPEC_FULL.md §6).
    pub async fn list_subscriptions(&self, chat_id: i64) -> Result<Vec<AlertSubscription>, String> {
        self.store.list_subscriptions(chat_id).await
    }

    /// `health()` (SPEC_FULL.md §6 "returning circuit-breaker statuses").
    pub async fn health(&self) -> Vec<CircuitBreakerStatus> {
        http::health(&self.breakers).await
    }
}

/// Logs a one-line summary of a completed `analyze` call without
/// duplicating the full report.
pub fn log_analysis(mint: &str, result: &LineageResult) {
    logger::info(
        LogTag::System,
        &format!(
            "analyze({}): family_size={} confidence={:.2} root={}",
            mint, result.family_size, result.confidence, result.root.mint
        ),
    );
}

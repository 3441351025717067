/// All configuration structures, defined once with embedded defaults via
/// `config_struct!`. One struct per component named in the external
/// interfaces section of the design: RPC/circuit-breaker, event store,
/// SOL-flow tracer, bundle forensics, cartel builder, similarity weights,
/// sweeps, and logging.
use crate::config_struct;

config_struct! {
    pub struct Config {
        rpc: RpcConfig = RpcConfig::default(),
        circuit_breaker: CircuitBreakerConfig = CircuitBreakerConfig::default(),
        cache: CacheConfig = CacheConfig::default(),
        events: EventsConfig = EventsConfig::default(),
        sol_flow: SolFlowConfig = SolFlowConfig::default(),
        bundle: BundleConfig = BundleConfig::default(),
        cartel: CartelConfig = CartelConfig::default(),
        similarity: SimilarityConfig = SimilarityConfig::default(),
        sweeps: SweepConfig = SweepConfig::default(),
        logging: LoggingConfig = LoggingConfig::default(),
        derivations: DerivationsConfig = DerivationsConfig::default(),
    }
}

config_struct! {
    pub struct RpcConfig {
        endpoint: String = "https://api.mainnet-beta.solana.com".to_string(),
        dexscreener_base_url: String = "https://api.dexscreener.com".to_string(),
        jupiter_base_url: String = "https://price.jup.ag".to_string(),
        request_timeout_secs: u64 = 15,
        max_retries: u32 = 3,
        backoff_base_secs: f64 = 1.0,
    }
}

config_struct! {
    pub struct CircuitBreakerConfig {
        failure_threshold: u32 = 5,
        success_threshold: u32 = 2,
        recovery_timeout_secs: u64 = 30,
    }
}

config_struct! {
    pub struct CacheConfig {
        backend: String = "sqlite".to_string(),
        sqlite_path: String = "data/events.db".to_string(),
        default_ttl_secs: u64 = 300,
    }
}

config_struct! {
    pub struct EventsConfig {
        max_event_age_days: i64 = 180,
        max_sol_flow_age_days: i64 = 90,
        maintenance_interval_secs: u64 = 6 * 3600,
        vacuum_interval_secs: u64 = 24 * 3600,
    }
}

config_struct! {
    pub struct SolFlowConfig {
        max_hops: usize = 3,
        max_txn_per_wallet: usize = 50,
        min_transfer_lamports: u64 = 100_000_000,
        hop_concurrency: usize = 3,
        trace_timeout_secs: u64 = 20,
    }
}

config_struct! {
    pub struct BundleConfig {
        max_launch_sigs: usize = 50,
        bundle_window_slots: u64 = 4,
        min_buy_sol: f64 = 0.001,
        max_bundle_wallets: usize = 20,
        pre_sell_sig_limit: usize = 100,
        pre_launch_window_hours: i64 = 72,
        min_prefund_sol: f64 = 0.01,
        dormant_threshold_days: i64 = 30,
        post_sell_scan_limit: usize = 30,
        post_sell_outflow_limit: usize = 20,
        min_outflow_sol: f64 = 0.05,
        second_hop_wallets: usize = 5,
        second_hop_sig_limit: usize = 30,
        second_hop_tx_limit: usize = 10,
        coordinated_sell_window_slots: u64 = 5,
        analysis_timeout_secs: u64 = 45,
        cache_ttl_hours: i64 = 24,
    }
}

config_struct! {
    pub struct CartelConfig {
        min_tokens_for_scan: usize = 2,
        timing_sync_window_secs: i64 = 1800,
        phash_hamming_threshold: u32 = 8,
        min_transfer_sol: f64 = 0.1,
        funding_window_hours: i64 = 72,
        min_funding_sol: f64 = 0.05,
        min_sniper_overlap: usize = 2,
        community_timeout_secs: u64 = 15,
        sweep_batch_size: usize = 10,
        lp_scan_sig_limit: usize = 40,
        sniper_scan_sig_limit: usize = 25,
    }
}

config_struct! {
    pub struct SimilarityConfig {
        weight_name: f64 = 0.25,
        weight_symbol: f64 = 0.20,
        weight_image: f64 = 0.30,
        weight_deployer: f64 = 0.15,
        weight_temporal: f64 = 0.10,
        name_similarity_threshold: f64 = 0.55,
        symbol_similarity_threshold: f64 = 0.60,
        image_similarity_threshold: f64 = 0.80,
        max_derivatives: usize = 20,
        candidate_enrichment_concurrency: usize = 5,
    }
}

config_struct! {
    pub struct SweepConfig {
        rug_sweep_interval_secs: u64 = 15 * 60,
        rug_liquidity_threshold_usd: f64 = 100.0,
        rug_sweep_concurrency: usize = 3,
        rug_sweep_lookback_hours: i64 = 48,
        cartel_sweep_interval_secs: u64 = 3600,
        alert_sweep_interval_secs: u64 = 300,
        alert_sweep_lookback_secs: i64 = 360,
    }
}

config_struct! {
    pub struct LoggingConfig {
        level: String = "info".to_string(),
        format: String = "text".to_string(),
        verbose: bool = false,
    }
}

config_struct! {
    pub struct DerivationsConfig {
        min_death_clock_history: usize = 2,
        min_factory_rhythm_history: usize = 3,
        factory_score_threshold: f64 = 0.65,
        min_narrative_history: usize = 10,
        narrative_lookback_days: i64 = 90,
        zombie_dead_liquidity_usd: f64 = 100.0,
        zombie_dead_age_hours: i64 = 24,
        fingerprint_fetch_concurrency: usize = 3,
        fingerprint_fetch_timeout_secs: u64 = 5,
        on_chain_risk_holder_limit: usize = 100,
        on_chain_risk_timeout_secs: u64 = 8,
        operator_impact_per_wallet_timeout_secs: u64 = 15,
        operator_impact_overall_timeout_secs: u64 = 20,
        operator_impact_campaign_active_hours: i64 = 6,
        operator_impact_peak_window_hours: i64 = 24,
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cartel::CartelReport;
use super::token::Token;
use super::{BundleExtractionReport, OperatorImpact, SolFlowReport};

/// A candidate/root token carrying its composite similarity score against
/// the query token (SPEC_FULL.md §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageMember {
    pub token: Token,
    pub composite_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZombieConfidence {
    Confirmed,
    Probable,
    Possible,
}

/// Resurrection signal: an alive token that looks like a relaunch of a
/// previously dead one (SPEC_FULL.md §4.9 "Zombie detector").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZombieAlert {
    pub dead_mint: String,
    pub resurrection_mint: String,
    pub same_deployer: bool,
    pub image_similarity: f64,
    pub confidence: ZombieConfidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeathClockBucket {
    Low,
    Medium,
    High,
    Critical,
}

/// Predicts remaining lifespan from the deployer's own rug-history
/// (SPEC_FULL.md §4.9 "Death clock").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeathClock {
    pub median_lifespan_secs: f64,
    pub stdev_lifespan_secs: f64,
    pub elapsed_secs: f64,
    pub ratio: f64,
    pub bucket: DeathClockBucket,
}

/// Plain history-derived profile of a deployer wallet
/// (SPEC_FULL.md §4.9, feeds factory rhythm / death clock / narrative timing).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeployerProfile {
    pub wallet: String,
    pub tokens_launched: u64,
    pub tokens_rugged: u64,
    pub first_launch: Option<DateTime<Utc>>,
    pub last_launch: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingPattern {
    Incremental,
    Themed,
    Random,
}

/// Serial-launcher signal (SPEC_FULL.md §4.9 "Factory rhythm").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactoryRhythm {
    pub median_interval_secs: f64,
    pub regularity: f64,
    pub naming_pattern: NamingPattern,
    pub factory_score: f64,
    pub is_factory: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeStatus {
    Early,
    Rising,
    Peak,
    Late,
}

/// Where the current token sits in its narrative category's hype cycle
/// (SPEC_FULL.md §4.9 "Narrative timing").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeTiming {
    pub narrative: String,
    pub cycle_percentile: f64,
    pub peak_window_count: u64,
    pub momentum: f64,
    pub status: NarrativeStatus,
}

/// Operator identity signal derived from shared off-chain metadata phrasing
/// (SPEC_FULL.md §4.9 "Operator fingerprint (DNA)").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorFingerprintSignal {
    pub fingerprint: String,
    pub upload_service: String,
    pub shared_with: Vec<String>,
}

/// Holder-concentration risk score (SPEC_FULL.md §4.9 "On-chain risk").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnChainRisk {
    pub top10_pct: f64,
    pub top1_pct: f64,
    pub deployer_held_pct: f64,
    pub score: f64,
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsiderSellVerdict {
    InsiderDump,
    Suspicious,
    Clean,
}

/// Market-behavior signal combining DEX volume/price data with on-chain
/// deployer/linked-wallet balances (SPEC_FULL.md §4.9 "Insider sell").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsiderSellReport {
    pub flags: Vec<String>,
    pub risk_score: f64,
    pub verdict: InsiderSellVerdict,
}

/// Pool-concentration/authenticity signal over all of a token's DEX pairs
/// (SPEC_FULL.md §4.9 "Liquidity architecture").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityArchitecture {
    pub hhi: f64,
    pub liq_to_volume_ratio: f64,
    pub authenticity_score: f64,
    pub flags: Vec<String>,
}

/// Every forensic signal attached to a lineage result, each independently
/// optional per the best-effort propagation policy (SPEC_FULL.md §7).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ForensicSignals {
    pub zombie_alert: Option<ZombieAlert>,
    pub death_clock: Option<DeathClock>,
    pub deployer_profile: Option<DeployerProfile>,
    pub operator_fingerprint: Option<OperatorFingerprintSignal>,
    pub liquidity_architecture: Option<LiquidityArchitecture>,
    pub on_chain_risk: Option<OnChainRisk>,
    pub insider_sell: Option<InsiderSellReport>,
    pub factory_rhythm: Option<FactoryRhythm>,
    pub narrative_timing: Option<NarrativeTiming>,
    pub cartel_report: Option<CartelReport>,
    pub operator_impact: Option<OperatorImpact>,
    pub bundle_report: Option<BundleExtractionReport>,
    pub sol_flow_report: Option<SolFlowReport>,
}

/// Top-level, ephemeral output of `analyze(mint)` (SPEC_FULL.md §3
/// `LineageResult`). Composed fresh on every call (modulo caching); never
/// persisted as its own row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageResult {
    pub query_token: Token,
    pub root: Token,
    pub derivatives: Vec<LineageMember>,
    pub family_size: usize,
    pub confidence: f64,
    pub signals: ForensicSignals,
}

impl LineageResult {
    pub fn solo(query_token: Token) -> Self {
        let root = query_token.clone();
        Self {
            query_token,
            root,
            derivatives: Vec::new(),
            family_size: 1,
            confidence: 0.0,
            signals: ForensicSignals::default(),
        }
    }
}

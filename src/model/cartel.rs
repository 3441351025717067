use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordered wallet-pair coordination edge (SPEC_FULL.md §3 `CartelEdge`).
///
/// Invariant: `wallet_a < wallet_b` lexicographically — enforced by
/// [`CartelEdge::new`], never by callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartelEdge {
    pub wallet_a: String,
    pub wallet_b: String,
    pub signal_type: SignalType,
    pub signal_strength: f64,
    pub evidence: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

impl CartelEdge {
    /// Normalises wallet ordering and clamps strength to `[0, 1]`.
    pub fn new(
        wallet_x: impl Into<String>,
        wallet_y: impl Into<String>,
        signal_type: SignalType,
        signal_strength: f64,
        evidence: serde_json::Value,
    ) -> Self {
        let (a, b) = Self::normalize_pair(wallet_x.into(), wallet_y.into());
        Self {
            wallet_a: a,
            wallet_b: b,
            signal_type,
            signal_strength: signal_strength.clamp(0.0, 1.0),
            evidence,
            recorded_at: Utc::now(),
        }
    }

    /// Normalises `(x, y)` into `(a, b)` with `a < b` lexicographically, so
    /// `(X, Y)` and `(Y, X)` collapse onto one edge regardless of call order.
    pub fn normalize_pair(x: String, y: String) -> (String, String) {
        if x <= y {
            (x, y)
        } else {
            (y, x)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    DnaMatch,
    SolTransfer,
    TimingSync,
    PhashCluster,
    CrossHolding,
    FundingLink,
    SharedLp,
    SniperRing,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::DnaMatch => "dna_match",
            SignalType::SolTransfer => "sol_transfer",
            SignalType::TimingSync => "timing_sync",
            SignalType::PhashCluster => "phash_cluster",
            SignalType::CrossHolding => "cross_holding",
            SignalType::FundingLink => "funding_link",
            SignalType::SharedLp => "shared_lp",
            SignalType::SniperRing => "sniper_ring",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "dna_match" => SignalType::DnaMatch,
            "sol_transfer" => SignalType::SolTransfer,
            "timing_sync" => SignalType::TimingSync,
            "phash_cluster" => SignalType::PhashCluster,
            "cross_holding" => SignalType::CrossHolding,
            "funding_link" => SignalType::FundingLink,
            "shared_lp" => SignalType::SharedLp,
            "sniper_ring" => SignalType::SniperRing,
            _ => return None,
        })
    }
}

/// Confidence bucket for a detected community (SPEC_FULL.md §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartelConfidence {
    High,
    Medium,
    Low,
}

/// Aggregate report for a single deployer's detected community
/// (SPEC_FULL.md §4.7 "Community detection").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartelReport {
    pub community_id: String,
    pub wallets: Vec<String>,
    pub edges: Vec<CartelEdge>,
    pub total_tokens_launched: u64,
    pub total_rugs: u64,
    pub estimated_extracted_usd: f64,
    pub earliest_activity: Option<DateTime<Utc>>,
    pub strongest_signal: Option<SignalType>,
    pub confidence: CartelConfidence,
}

/// One entry in an operator's narrative progression, ordered by first
/// appearance (SPEC_FULL.md §4.9 "Operator impact").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeTimelineEntry {
    pub narrative: String,
    pub first_seen: DateTime<Utc>,
    pub token_count: u64,
}

/// Aggregate impact of the cartel community on a deployer's tokens,
/// combining the extraction-rate estimator over every rug in the
/// community (SPEC_FULL.md §4.8 "Tiered extraction estimator", §4.9
/// "Operator impact").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorImpact {
    pub community_id: String,
    pub tokens_launched: u64,
    pub tokens_rugged: u64,
    pub estimated_extracted_usd: f64,
    pub narrative_timeline: Vec<NarrativeTimelineEntry>,
    pub peak_concurrent_tokens: u64,
    pub campaign_active: bool,
}

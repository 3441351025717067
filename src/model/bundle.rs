use serde::{Deserialize, Serialize};

/// Where a bundle wallet's pre-launch SOL came from (SPEC_FULL.md §4.5 Phase 2).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PreSellBehavior {
    pub wallet_age_days: f64,
    pub is_dormant: bool,
    pub pre_launch_tx_count: usize,
    pub prefund_source: Option<String>,
    pub prefund_source_is_deployer: bool,
    pub prefund_source_is_known_funder: bool,
    pub pre_launch_unique_tokens: usize,
    /// Count of prior `token_created` events by this wallet's deployer in the
    /// Event Store (SPEC_FULL.md §9 open question #2) — evidence-only.
    pub same_deployer_prior_launches: u64,
    /// Count of prior bundle reports this wallet has appeared in
    /// (SPEC_FULL.md §9 open question #2) — evidence-only.
    pub prior_bundle_count: u64,
}

/// A single post-sell outflow destination (SPEC_FULL.md §4.5 Phase 3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundDestination {
    pub address: String,
    pub amount_lamports: u64,
    pub hop: usize,
    pub link_to_deployer: bool,
    pub direct_transfer_to_deployer: bool,
    pub transfer_to_deployer_linked_wallet: bool,
    pub indirect_via_intermediary: bool,
    pub seen_in_other_bundles: bool,
}

/// What a bundle wallet did after buying (SPEC_FULL.md §4.5 Phase 3).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PostSellBehavior {
    pub full_sell_detected: bool,
    pub sell_slot: Option<u64>,
    pub sell_signature: Option<String>,
    pub sol_received_at_sell: u64,
    pub destinations: Vec<FundDestination>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleWalletVerdict {
    ConfirmedTeam,
    SuspectedTeam,
    CoordinatedDump,
    EarlyBuyer,
}

impl BundleWalletVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleWalletVerdict::ConfirmedTeam => "confirmed_team",
            BundleWalletVerdict::SuspectedTeam => "suspected_team",
            BundleWalletVerdict::CoordinatedDump => "coordinated_dump",
            BundleWalletVerdict::EarlyBuyer => "early_buyer",
        }
    }
}

/// Evidence tags accumulated across Phases 2-4, consumed by the Phase 5
/// verdict rules (SPEC_FULL.md §4.5 Phase 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedFlag {
    DirectTransferToDeployer,
    PrefundedByDeployer,
    TransferredToLinked,
    IndirectLink,
    FundedByCommon,
    DormantBeforeLaunch,
    CommonSink,
    RepeatBundlerSameDeployer,
    ProfessionalBundler,
}

impl RedFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedFlag::DirectTransferToDeployer => "DIRECT_TRANSFER_TO_DEPLOYER",
            RedFlag::PrefundedByDeployer => "PREFUNDED_BY_DEPLOYER",
            RedFlag::TransferredToLinked => "TRANSFERRED_TO_LINKED",
            RedFlag::IndirectLink => "INDIRECT_LINK",
            RedFlag::FundedByCommon => "FUNDED_BY_COMMON",
            RedFlag::DormantBeforeLaunch => "DORMANT_BEFORE_LAUNCH",
            RedFlag::CommonSink => "COMMON_SINK",
            RedFlag::RepeatBundlerSameDeployer => "REPEAT_BUNDLER_SAME_DEPLOYER",
            RedFlag::ProfessionalBundler => "PROFESSIONAL_BUNDLER",
        }
    }
}

/// Per-wallet analysis attached to a [`BundleExtractionReport`]
/// (SPEC_FULL.md §3, §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleWalletAnalysis {
    pub wallet: String,
    pub sol_spent: f64,
    pub pre_sell: PreSellBehavior,
    pub post_sell: PostSellBehavior,
    pub red_flags: Vec<RedFlag>,
    pub verdict: BundleWalletVerdict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleOverallVerdict {
    ConfirmedTeamExtraction,
    SuspectedTeamExtraction,
    CoordinatedDumpUnknownTeam,
    EarlyBuyersNoLinkProven,
}

impl BundleOverallVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleOverallVerdict::ConfirmedTeamExtraction => "confirmed_team_extraction",
            BundleOverallVerdict::SuspectedTeamExtraction => "suspected_team_extraction",
            BundleOverallVerdict::CoordinatedDumpUnknownTeam => "coordinated_dump_unknown_team",
            BundleOverallVerdict::EarlyBuyersNoLinkProven => "early_buyers_no_link_proven",
        }
    }
}

/// Top-level result of the bundle forensics pipeline
/// (SPEC_FULL.md §3 `BundleExtractionReport`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleExtractionReport {
    pub mint: String,
    pub deployer: String,
    pub launch_slot: u64,
    pub wallets: Vec<BundleWalletAnalysis>,
    pub verdict: BundleOverallVerdict,
    pub total_sol_spent_by_bundle: f64,
    pub total_sol_extracted_confirmed: f64,
    pub evidence_chain: Vec<String>,
}

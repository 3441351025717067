use serde::{Deserialize, Serialize};

/// A persistent graph edge written by the SOL-flow tracer
/// (SPEC_FULL.md §3 `SolFlowEdge`).
///
/// Invariants enforced at construction: `from_address != to_address`,
/// `amount_lamports >= MIN_TRANSFER_LAMPORTS` (checked by the tracer before
/// the edge is built, not re-validated here), `hop < MAX_HOPS`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolFlowEdge {
    pub mint: String,
    pub from_address: String,
    pub to_address: String,
    pub amount_lamports: u64,
    pub signature: String,
    pub slot: u64,
    pub block_time: Option<i64>,
    pub hop: usize,
}

impl SolFlowEdge {
    pub fn amount_sol(&self) -> f64 {
        self.amount_lamports as f64 / 1_000_000_000.0
    }
}

/// Wallet/entity label attached to a flow edge endpoint at render time
/// (SPEC_FULL.md §4.6 step 5, §4.11).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EntityType {
    Cex,
    Dex,
    Bridge,
    System,
    Mev,
    Launchpad,
    Mixer,
    Wallet,
    Contract,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledEdge {
    pub edge: SolFlowEdge,
    pub from_label: Option<String>,
    pub to_label: Option<String>,
    pub entity_type: Option<EntityType>,
}

/// A cross-chain exit resolved via the bridge attestation API, best-effort
/// (SPEC_FULL.md §4.6 step 3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossChainExit {
    pub bridge_program: String,
    pub source_wallet: String,
    pub to_chain: Option<String>,
    pub to_address: Option<String>,
}

/// Ephemeral report composed from `SolFlowEdge` rows
/// (SPEC_FULL.md §3 `SolFlowReport`). Entirely derivable from stored edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolFlowReport {
    pub deployer: String,
    pub flows: Vec<LabeledEdge>,
    pub terminal_wallets: Vec<String>,
    pub known_cex_detected: bool,
    pub hop_count: usize,
    pub total_extracted_sol: f64,
    pub total_extracted_usd: Option<f64>,
    pub rug_timestamp: Option<i64>,
    pub cross_chain_exits: Vec<CrossChainExit>,
}

impl SolFlowReport {
    pub fn empty(deployer: impl Into<String>) -> Self {
        Self {
            deployer: deployer.into(),
            flows: Vec::new(),
            terminal_wallets: Vec::new(),
            known_cex_detected: false,
            hop_count: 0,
            total_extracted_sol: 0.0,
            total_extracted_usd: None,
            rug_timestamp: None,
            cross_chain_exits: Vec::new(),
        }
    }
}

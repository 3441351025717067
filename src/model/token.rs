use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A token mint as observed on-chain plus the market snapshot attached to
/// it at enrichment time. Immutable except `market_cap_usd`/`liquidity_usd`,
/// which are ephemeral and refreshed on every lookup (SPEC_FULL.md §3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    /// Base58, 32-44 chars. Primary key.
    pub mint: String,
    pub name: String,
    pub symbol: String,
    pub image_uri: Option<String>,
    pub deployer: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub market_cap_usd: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub dex_url: Option<String>,
    pub metadata_uri: Option<String>,
    pub chain_id: Option<String>,
}

/// Cheap boundary check for the primary-key invariant in SPEC_FULL.md §3
/// ("mint (primary key; base58, 32-44 chars)"). Only called at the entry
/// point of the public pipeline — internal code trusts mints it already
/// carries.
pub fn is_valid_mint(mint: &str) -> bool {
    (32..=44).contains(&mint.len()) && bs58::decode(mint).into_vec().is_ok()
}

impl Token {
    pub fn empty(mint: impl Into<String>) -> Self {
        Self {
            mint: mint.into(),
            name: String::new(),
            symbol: String::new(),
            image_uri: None,
            deployer: None,
            created_at: None,
            market_cap_usd: None,
            liquidity_usd: None,
            dex_url: None,
            metadata_uri: None,
            chain_id: None,
        }
    }

    /// A token is too thin to enrich further if it carries neither a name
    /// nor a symbol (SPEC_FULL.md §4.4 step 2).
    pub fn has_no_identity(&self) -> bool {
        self.name.trim().is_empty() && self.symbol.trim().is_empty()
    }
}

/// A single DEX pair as returned by the aggregator, already narrowed to the
/// fields the rest of the pipeline consumes (SPEC_FULL.md §6).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DexPair {
    pub mint: String,
    pub name: String,
    pub symbol: String,
    pub image_url: Option<String>,
    pub price_usd: Option<f64>,
    pub market_cap_usd: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub volume_h1: Option<f64>,
    pub volume_h24: Option<f64>,
    pub buys_h24: Option<u64>,
    pub sells_h24: Option<u64>,
    pub price_change_h1: Option<f64>,
    pub price_change_h6: Option<f64>,
    pub price_change_h24: Option<f64>,
    pub pair_created_at_ms: Option<i64>,
    pub chain_id: String,
    pub dex_url: Option<String>,
}

/// A search hit returned to API/bot callers (SPEC_FULL.md §6 `search`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSearchResult {
    pub mint: String,
    pub name: String,
    pub symbol: String,
    pub market_cap_usd: Option<f64>,
    pub liquidity_usd: Option<f64>,
}

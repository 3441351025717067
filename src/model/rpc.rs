use serde::{Deserialize, Serialize};

/// An `accountKeys` entry from `getTransaction(jsonParsed)`.
///
/// The Solana RPC returns this either as a bare base58 string (legacy
/// encoding) or as `{pubkey, signer, writable}` (jsonParsed encoding) —
/// this tagged union is the parsing-boundary adapter named in
/// SPEC_FULL.md §9 ("Dynamically typed records -> typed sum variants").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccountKey {
    Legacy(String),
    Parsed {
        pubkey: String,
        #[serde(default)]
        signer: bool,
        #[serde(default)]
        writable: bool,
    },
}

impl AccountKey {
    pub fn pubkey(&self) -> &str {
        match self {
            AccountKey::Legacy(s) => s,
            AccountKey::Parsed { pubkey, .. } => pubkey,
        }
    }

    pub fn is_signer(&self) -> bool {
        match self {
            // Legacy encoding carries no signer flag; callers that need it
            // fall back to positional convention (signers come first).
            AccountKey::Legacy(_) => false,
            AccountKey::Parsed { signer, .. } => *signer,
        }
    }
}

/// One page entry from `getSignaturesForAddress` (SPEC_FULL.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub signature: String,
    pub slot: u64,
    #[serde(rename = "blockTime")]
    pub block_time: Option<i64>,
    pub err: Option<serde_json::Value>,
    pub memo: Option<String>,
}

impl SignatureInfo {
    pub fn succeeded(&self) -> bool {
        self.err.is_none()
    }
}

/// Per-account pre/post token balance as returned under
/// `meta.preTokenBalances` / `meta.postTokenBalances`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBalanceEntry {
    #[serde(rename = "accountIndex")]
    pub account_index: usize,
    pub mint: String,
    pub owner: Option<String>,
    #[serde(rename = "uiTokenAmount")]
    pub ui_token_amount: UiTokenAmount,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiTokenAmount {
    #[serde(default)]
    pub amount: String,
    #[serde(default, rename = "uiAmount")]
    pub ui_amount: Option<f64>,
    pub decimals: Option<u8>,
}

impl UiTokenAmount {
    pub fn amount_f64(&self) -> f64 {
        self.ui_amount
            .unwrap_or_else(|| self.amount.parse::<f64>().unwrap_or(0.0))
    }
}

/// A parsed transaction, narrowed to the fields the bundle/flow/risk
/// engines need: signer set, SOL balance deltas, and token balance deltas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub signature: String,
    pub slot: u64,
    pub block_time: Option<i64>,
    pub success: bool,
    pub account_keys: Vec<AccountKey>,
    pub pre_balances: Vec<u64>,
    pub post_balances: Vec<u64>,
    pub pre_token_balances: Vec<TokenBalanceEntry>,
    pub post_token_balances: Vec<TokenBalanceEntry>,
    pub log_messages: Vec<String>,
}

impl ParsedTransaction {
    /// Lamport delta (post - pre) for account at `index`, or 0 if the
    /// account doesn't appear in both balance vectors.
    pub fn lamport_delta(&self, index: usize) -> i128 {
        let pre = self.pre_balances.get(index).copied().unwrap_or(0) as i128;
        let post = self.post_balances.get(index).copied().unwrap_or(0) as i128;
        post - pre
    }

    pub fn signers(&self) -> impl Iterator<Item = &str> {
        self.account_keys
            .iter()
            .enumerate()
            .filter(move |(i, key)| key.is_signer() || *i == 0)
            .map(|(_, key)| key.pubkey())
    }
}

/// Result of `getAsset` (DAS), when the provider supports it
/// (SPEC_FULL.md §4.3, §6).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DasAsset {
    pub mint: String,
    pub verified_creators: Vec<String>,
    pub image_url: Option<String>,
}

/// Stateless Solana JSON-RPC client (SPEC_FULL.md §4.3).
///
/// Unlike the teacher's multi-provider `rpc::manager` stack, this talks to a
/// single configured endpoint and leans entirely on [`crate::http::HttpShell`]
/// for retry/backoff and circuit-breaking. The only state it carries is an
/// incrementing JSON-RPC request id and a handle to the shared shell.
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};

use crate::http::{HttpShell, BREAKER_RPC};
use crate::logger::{self, LogTag};
use crate::model::rpc::{AccountKey, DasAsset, ParsedTransaction, SignatureInfo, TokenBalanceEntry, UiTokenAmount};
use crate::wallet_labels;

const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";

/// A signature-walk page size cap and a hard page-count cap, both drawn from
/// the Solana RPC's own per-call limit (SPEC_FULL.md §4.3, §6).
const SIGNATURES_PAGE_SIZE: u64 = 1000;
const SIGNATURES_MAX_PAGES: u32 = 10;

pub struct RpcClient {
    shell: Arc<HttpShell>,
    endpoint: String,
    das_endpoint: String,
    request_id: AtomicU64,
}

impl RpcClient {
    pub fn new(shell: Arc<HttpShell>, endpoint: String) -> Self {
        let das_endpoint = endpoint.clone();
        Self { shell, endpoint, das_endpoint, request_id: AtomicU64::new(1) }
    }

    /// Use a separate DAS-capable endpoint (e.g. a Helius RPC URL) for
    /// `getAsset`/`searchAssets` when it differs from the primary endpoint.
    pub fn with_das_endpoint(mut self, das_endpoint: String) -> Self {
        self.das_endpoint = das_endpoint;
        self
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Generic JSON-RPC call. `circuit_protect = false` bypasses the shared
    /// RPC breaker (SPEC_FULL.md §4.1, §4.3 "MUST bypass the shared RPC
    /// breaker" for optional DAS enrichment).
    async fn call(&self, endpoint: &str, method: &str, params: Value, circuit_protect: bool) -> Option<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.next_id(),
            "method": method,
            "params": params,
        });

        match self.shell.post_json(BREAKER_RPC, endpoint, &body, !circuit_protect).await {
            Ok(value) => value.get("result").cloned(),
            Err(e) => {
                logger::debug(LogTag::Rpc, &format!("{} failed: {}", method, e));
                None
            }
        }
    }

    async fn rpc(&self, method: &str, params: Value) -> Option<Value> {
        self.call(&self.endpoint, method, params, true).await
    }

    /// Walks `getSignaturesForAddress` backwards via the `before` cursor,
    /// stopping at a short page or after the page-count cap, and returns the
    /// oldest (tail) entry of the final page.
    pub async fn get_oldest_signature(&self, address: &str) -> Option<SignatureInfo> {
        self.walk_to_oldest_page(address).await?.into_iter().last()
    }

    /// Walks `getSignaturesForAddress` backwards the same way as
    /// [`get_oldest_signature`](Self::get_oldest_signature), but returns the
    /// whole final page (newest-first within that page) instead of just its
    /// tail entry.
    async fn walk_to_oldest_page(&self, address: &str) -> Option<Vec<SignatureInfo>> {
        let mut before: Option<String> = None;
        let mut last_page: Vec<SignatureInfo> = Vec::new();

        for _ in 0..SIGNATURES_MAX_PAGES {
            let mut opts = serde_json::Map::new();
            opts.insert("limit".to_string(), json!(SIGNATURES_PAGE_SIZE));
            if let Some(cursor) = &before {
                opts.insert("before".to_string(), json!(cursor));
            }

            let result = self.rpc("getSignaturesForAddress", json!([address, opts])).await?;
            let page: Vec<SignatureInfo> = serde_json::from_value(result).ok()?;

            if page.is_empty() {
                break;
            }

            let short_page = page.len() < SIGNATURES_PAGE_SIZE as usize;
            before = page.last().map(|s| s.signature.clone());
            last_page = page;

            if short_page {
                break;
            }
        }

        Some(last_page)
    }

    /// The earliest `limit` signatures for `address`, oldest-first
    /// (SPEC_FULL.md §4.5 Phase 1 "Fetch up to MAX_LAUNCH_SIGS signatures
    /// for mint, reversed into oldest-first").
    pub async fn get_launch_signatures(&self, address: &str, limit: usize) -> Vec<SignatureInfo> {
        let mut page = self.walk_to_oldest_page(address).await.unwrap_or_default();
        page.reverse();
        page.truncate(limit);
        page
    }

    /// Single-page `getSignaturesForAddress`, newest-first, capped at
    /// `limit` (SPEC_FULL.md §4.5 Phase 1-3, §4.6 step 2a "fetch recent
    /// signatures"). Unlike [`get_oldest_signature`](Self::get_oldest_signature)
    /// this does not paginate backwards — callers that need the full
    /// history use that method instead.
    pub async fn get_recent_signatures(&self, address: &str, limit: usize) -> Vec<SignatureInfo> {
        let opts = json!({ "limit": limit });
        let result = match self.rpc("getSignaturesForAddress", json!([address, opts])).await {
            Some(r) => r,
            None => return Vec::new(),
        };
        serde_json::from_value(result).unwrap_or_default()
    }

    /// Fetches a `jsonParsed` transaction, narrowed to the fields the
    /// forensic pipeline needs.
    pub async fn get_transaction(&self, signature: &str) -> Option<ParsedTransaction> {
        let params = json!([
            signature,
            { "encoding": "jsonParsed", "maxSupportedTransactionVersion": 0 }
        ]);
        let result = self.rpc("getTransaction", params).await?;
        parse_transaction(&result)
    }

    /// Combines the oldest signature with its parsed transaction to return
    /// the deployer address and creation timestamp.
    pub async fn get_deployer_and_timestamp(&self, mint: &str) -> Option<(String, i64)> {
        let oldest = self.get_oldest_signature(mint).await?;
        let block_time = oldest.block_time?;
        let tx = self.get_transaction(&oldest.signature).await?;

        let deployer = tx
            .account_keys
            .iter()
            .map(|k| k.pubkey())
            .find(|addr| !wallet_labels::is_skip_address(addr))?;

        Some((deployer.to_string(), block_time))
    }

    /// DAS `getAsset`. Its absence (unsupported provider) resolves to `None`
    /// without affecting anything downstream.
    pub async fn get_asset(&self, mint: &str) -> Option<DasAsset> {
        let result = self.call(&self.das_endpoint, "getAsset", json!({ "id": mint }), true).await?;

        let verified_creators = result
            .get("creators")
            .and_then(|c| c.as_array())
            .map(|arr| {
                arr.iter()
                    .filter(|c| c.get("verified").and_then(|v| v.as_bool()).unwrap_or(false))
                    .filter_map(|c| c.get("address").and_then(|a| a.as_str()).map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        let image_url = result
            .get("content")
            .and_then(|c| c.get("links"))
            .and_then(|l| l.get("image"))
            .and_then(|i| i.as_str())
            .map(|s| s.to_string());

        Some(DasAsset { mint: mint.to_string(), verified_creators, image_url })
    }

    /// Optional DAS enrichment by creator address. MUST bypass the shared
    /// RPC breaker (SPEC_FULL.md §4.3) so its flakiness never trips the
    /// breaker guarding signature-walk/transaction calls.
    pub async fn search_assets_by_creator(&self, creator: &str) -> Vec<String> {
        let params = json!({ "creatorAddress": creator, "onlyVerified": true, "limit": 1000 });
        let result = self.call(&self.das_endpoint, "searchAssets", params, false).await;

        result
            .and_then(|v| v.get("items").cloned())
            .and_then(|items| items.as_array().cloned())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("id").and_then(|id| id.as_str()).map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Sums `uiAmount` over every token account a wallet holds for `mint`.
    /// Returns `0.0` when the wallet has fully exited the position.
    pub async fn get_wallet_token_balance(&self, wallet: &str, mint: &str) -> f64 {
        let params = json!([
            wallet,
            { "mint": mint },
            { "encoding": "jsonParsed" }
        ]);

        let result = match self.rpc("getTokenAccountsByOwner", params).await {
            Some(r) => r,
            None => return 0.0,
        };

        result
            .get("value")
            .and_then(|v| v.as_array())
            .map(|accounts| {
                accounts
                    .iter()
                    .filter_map(|acc| {
                        acc.get("account")?
                            .get("data")?
                            .get("parsed")?
                            .get("info")?
                            .get("tokenAmount")?
                            .get("uiAmount")?
                            .as_f64()
                    })
                    .sum()
            })
            .unwrap_or(0.0)
    }

    /// Every mint a wallet currently holds with a non-zero balance.
    pub async fn get_deployer_token_holdings(&self, wallet: &str) -> Vec<String> {
        let params = json!([
            wallet,
            { "programId": TOKEN_PROGRAM_ID },
            { "encoding": "jsonParsed" }
        ]);

        let result = match self.rpc("getTokenAccountsByOwner", params).await {
            Some(r) => r,
            None => return Vec::new(),
        };

        result
            .get("value")
            .and_then(|v| v.as_array())
            .map(|accounts| {
                accounts
                    .iter()
                    .filter_map(|acc| {
                        let info = acc.get("account")?.get("data")?.get("parsed")?.get("info")?;
                        let ui_amount = info.get("tokenAmount")?.get("uiAmount")?.as_f64().unwrap_or(0.0);
                        if ui_amount <= 0.0 {
                            return None;
                        }
                        info.get("mint")?.as_str().map(|s| s.to_string())
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Enumerates up to `limit` holder token-accounts for `mint`, used by
    /// on-chain risk scoring (SPEC_FULL.md §4.3, §9 resolved open question).
    ///
    /// Tries `getProgramAccounts` (Token then Token-2022 program) with a
    /// mint memcmp filter first; falls back to `getTokenLargestAccounts`
    /// (top-20 only — a degraded-precision path) when the provider disables
    /// `getProgramAccounts`.
    pub async fn get_token_accounts(&self, mint: &str, limit: usize) -> Vec<TokenBalanceEntry> {
        for program_id in [TOKEN_PROGRAM_ID, TOKEN_2022_PROGRAM_ID] {
            if let Some(entries) = self.get_program_accounts_for_mint(program_id, mint, limit).await {
                if !entries.is_empty() {
                    return entries;
                }
            }
        }

        self.get_token_largest_accounts(mint).await
    }

    async fn get_program_accounts_for_mint(&self, program_id: &str, mint: &str, limit: usize) -> Option<Vec<TokenBalanceEntry>> {
        let params = json!([
            program_id,
            {
                "encoding": "jsonParsed",
                "filters": [
                    { "dataSize": 165 },
                    { "memcmp": { "offset": 0, "bytes": mint } },
                ],
            }
        ]);

        let result = self.rpc("getProgramAccounts", params).await?;
        let accounts = result.as_array()?;

        let entries = accounts
            .iter()
            .take(limit)
            .enumerate()
            .filter_map(|(index, acc)| {
                let info = acc.get("account")?.get("data")?.get("parsed")?.get("info")?;
                let owner = info.get("owner").and_then(|o| o.as_str()).map(|s| s.to_string());
                let ui_token_amount: UiTokenAmount =
                    serde_json::from_value(info.get("tokenAmount")?.clone()).ok()?;
                Some(TokenBalanceEntry {
                    account_index: index,
                    mint: mint.to_string(),
                    owner,
                    ui_token_amount,
                })
            })
            .collect();

        Some(entries)
    }

    /// LP-provider fee-payers: signers of `mint`'s earliest transactions
    /// that invoke a known DEX/AMM program, excluding `deployer` (SPEC_FULL.md
    /// §4.7 signal 7, cache-miss path for `shared_lp`).
    pub async fn get_lp_providers(&self, mint: &str, deployer: &str, sig_limit: usize) -> Vec<String> {
        let sigs = self.get_launch_signatures(mint, sig_limit).await;
        let mut providers = HashSet::new();

        for sig in sigs.iter().filter(|s| s.succeeded()) {
            let Some(tx) = self.get_transaction(&sig.signature).await else { continue };
            if !tx.account_keys.iter().any(|k| wallet_labels::is_dex_program(k.pubkey())) {
                continue;
            }
            if let Some(fee_payer) = tx.account_keys.first().map(|k| k.pubkey()) {
                if fee_payer != deployer {
                    providers.insert(fee_payer.to_string());
                }
            }
        }

        providers.into_iter().collect()
    }

    /// Early-buyer wallets: owners whose post-balance for `mint` exceeds
    /// their pre-balance within the first `sig_limit` signatures after
    /// launch, excluding `deployer` (SPEC_FULL.md §4.7 signal 8, cache-miss
    /// path for `sniper_ring`).
    pub async fn get_early_buyers(&self, mint: &str, deployer: &str, sig_limit: usize) -> Vec<String> {
        let sigs = self.get_launch_signatures(mint, sig_limit).await;
        let mut buyers = HashSet::new();

        for sig in sigs.iter().filter(|s| s.succeeded()) {
            let Some(tx) = self.get_transaction(&sig.signature).await else { continue };
            for post in tx.post_token_balances.iter().filter(|b| b.mint == mint) {
                let Some(owner) = &post.owner else { continue };
                if owner == deployer {
                    continue;
                }
                let pre_amount = tx
                    .pre_token_balances
                    .iter()
                    .find(|b| b.account_index == post.account_index && b.mint == mint)
                    .map(|b| b.ui_token_amount.amount_f64())
                    .unwrap_or(0.0);
                if post.ui_token_amount.amount_f64() > pre_amount {
                    buyers.insert(owner.clone());
                }
            }
        }

        buyers.into_iter().collect()
    }

    async fn get_token_largest_accounts(&self, mint: &str) -> Vec<TokenBalanceEntry> {
        let result = match self.rpc("getTokenLargestAccounts", json!([mint])).await {
            Some(r) => r,
            None => return Vec::new(),
        };

        result
            .get("value")
            .and_then(|v| v.as_array())
            .map(|accounts| {
                accounts
                    .iter()
                    .enumerate()
                    .filter_map(|(index, acc)| {
                        let ui_token_amount: UiTokenAmount = serde_json::from_value(acc.clone()).ok()?;
                        Some(TokenBalanceEntry {
                            account_index: index,
                            mint: mint.to_string(),
                            owner: None,
                            ui_token_amount,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn parse_transaction(result: &Value) -> Option<ParsedTransaction> {
    let signature = result
        .get("transaction")?
        .get("signatures")?
        .as_array()?
        .first()?
        .as_str()?
        .to_string();

    let slot = result.get("slot")?.as_u64()?;
    let block_time = result.get("blockTime").and_then(|v| v.as_i64());

    let meta = result.get("meta")?;
    let success = meta.get("err").map(|e| e.is_null()).unwrap_or(true);

    let account_keys_raw = result
        .get("transaction")?
        .get("message")?
        .get("accountKeys")?
        .clone();
    let account_keys: Vec<AccountKey> = serde_json::from_value(account_keys_raw).ok()?;

    let pre_balances: Vec<u64> = serde_json::from_value(meta.get("preBalances")?.clone()).ok()?;
    let post_balances: Vec<u64> = serde_json::from_value(meta.get("postBalances")?.clone()).ok()?;

    let pre_token_balances: Vec<TokenBalanceEntry> = meta
        .get("preTokenBalances")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();
    let post_token_balances: Vec<TokenBalanceEntry> = meta
        .get("postTokenBalances")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();

    let log_messages: Vec<String> = meta
        .get("logMessages")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();

    Some(ParsedTransaction {
        signature,
        slot,
        block_time,
        success,
        account_keys,
        pre_balances,
        post_balances,
        pre_token_balances,
        post_token_balances,
        log_messages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_transaction() {
        let raw = json!({
            "slot": 42,
            "blockTime": 1_700_000_000,
            "transaction": {
                "signatures": ["abc123"],
                "message": {
                    "accountKeys": [
                        { "pubkey": "Signer1111111111111111111111111111111111", "signer": true, "writable": true },
                        "11111111111111111111111111111111"
                    ]
                }
            },
            "meta": {
                "err": null,
                "preBalances": [1000, 0],
                "postBalances": [900, 100],
                "preTokenBalances": [],
                "postTokenBalances": [],
                "logMessages": []
            }
        });

        let tx = parse_transaction(&raw).expect("transaction parses");
        assert_eq!(tx.signature, "abc123");
        assert_eq!(tx.slot, 42);
        assert!(tx.success);
        assert_eq!(tx.lamport_delta(0), -100);
        assert_eq!(tx.lamport_delta(1), 100);
        assert_eq!(tx.signers().count(), 1);
    }

    #[test]
    fn parses_failed_transaction() {
        let raw = json!({
            "slot": 7,
            "blockTime": null,
            "transaction": {
                "signatures": ["xyz"],
                "message": { "accountKeys": ["11111111111111111111111111111111"] }
            },
            "meta": {
                "err": { "InstructionError": [0, "Custom"] },
                "preBalances": [1],
                "postBalances": [1],
                "preTokenBalances": [],
                "postTokenBalances": [],
                "logMessages": []
            }
        });

        let tx = parse_transaction(&raw).expect("transaction parses");
        assert!(!tx.success);
    }
}

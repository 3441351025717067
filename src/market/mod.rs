/// DEX/price/bridge market data client (SPEC_FULL.md §6 "DEX aggregator",
/// "Token-price aggregator", "Bridge attestation API").
///
/// Sibling of [`crate::rpc_client::RpcClient`]: same `HttpShell`-backed
/// dispatch discipline, same best-effort contract — every method resolves
/// to an empty/`None` result rather than propagating a transport error.
use std::sync::Arc;

use serde_json::Value;

use crate::http::{HttpShell, BREAKER_DEX_AGGREGATOR, BREAKER_TOKEN_AGGREGATOR};
use crate::logger::{self, LogTag};
use crate::model::{CrossChainExit, DexPair};

pub struct MarketClient {
    shell: Arc<HttpShell>,
    dexscreener_base_url: String,
    jupiter_base_url: String,
}

impl MarketClient {
    pub fn new(shell: Arc<HttpShell>, dexscreener_base_url: String, jupiter_base_url: String) -> Self {
        Self { shell, dexscreener_base_url, jupiter_base_url }
    }

    /// Pair list for a single mint (SPEC_FULL.md §4.4 step 1).
    pub async fn get_pairs_for_mint(&self, mint: &str) -> Vec<DexPair> {
        let url = format!("{}/latest/dex/tokens/{}", self.dexscreener_base_url, mint);
        match self.shell.get_json(BREAKER_DEX_AGGREGATOR, &url, false).await {
            Ok(body) => parse_pairs(&body),
            Err(e) => {
                logger::debug(LogTag::MarketClient, &format!("get_pairs_for_mint({}) failed: {}", mint, e));
                Vec::new()
            }
        }
    }

    /// Free-text search by name/symbol (SPEC_FULL.md §4.4 step 3).
    pub async fn search_pairs(&self, query: &str) -> Vec<DexPair> {
        let url = format!("{}/latest/dex/search?q={}", self.dexscreener_base_url, urlencode(query));
        match self.shell.get_json(BREAKER_DEX_AGGREGATOR, &url, false).await {
            Ok(body) => parse_pairs(&body),
            Err(e) => {
                logger::debug(LogTag::MarketClient, &format!("search_pairs({}) failed: {}", query, e));
                Vec::new()
            }
        }
    }

    /// SOL/USD (or arbitrary mint) price via the token-price aggregator.
    /// Accepts a comma-separated ID list; returns `{data: {mint: {price}}}`.
    pub async fn get_prices(&self, mints: &[&str]) -> std::collections::HashMap<String, f64> {
        if mints.is_empty() {
            return Default::default();
        }
        let ids = mints.join(",");
        let url = format!("{}/v6/price?ids={}", self.jupiter_base_url, urlencode(&ids));

        let body = match self.shell.get_json(BREAKER_TOKEN_AGGREGATOR, &url, false).await {
            Ok(b) => b,
            Err(e) => {
                logger::debug(LogTag::MarketClient, &format!("get_prices failed: {}", e));
                return Default::default();
            }
        };

        body.get("data")
            .and_then(|d| d.as_object())
            .map(|obj| {
                obj.iter()
                    .filter_map(|(mint, entry)| {
                        let price = entry.get("price")?.as_str()?.parse::<f64>().ok()?;
                        Some((mint.clone(), price))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn get_sol_usd_price(&self) -> Option<f64> {
        const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";
        self.get_prices(&[WSOL_MINT]).await.get(WSOL_MINT).copied()
    }

    /// Best-effort bridge attestation lookup (SPEC_FULL.md §4.6 step 3, §6).
    pub async fn get_bridge_exit(&self, bridge_api_base: &str, source_wallet: &str, bridge_program: &str) -> Option<CrossChainExit> {
        let url = format!("{}/operations?address={}&limit=10", bridge_api_base, source_wallet);
        let body = self.shell.get_json(BREAKER_TOKEN_AGGREGATOR, &url, true).await.ok()?;

        let op = body.get("operations")?.as_array()?.first()?;
        let props = op.get("content")?.get("standarizedProperties")?;

        Some(CrossChainExit {
            bridge_program: bridge_program.to_string(),
            source_wallet: source_wallet.to_string(),
            to_chain: props.get("toChain").and_then(|v| v.as_str()).map(|s| s.to_string()),
            to_address: props.get("toAddress").and_then(|v| v.as_str()).map(|s| s.to_string()),
        })
    }
}

fn parse_pairs(body: &Value) -> Vec<DexPair> {
    body.get("pairs")
        .and_then(|p| p.as_array())
        .map(|arr| arr.iter().filter_map(parse_pair).collect())
        .unwrap_or_default()
}

fn parse_pair(raw: &Value) -> Option<DexPair> {
    let base = raw.get("baseToken")?;
    let mint = base.get("address")?.as_str()?.to_string();
    let name = base.get("name").and_then(|v| v.as_str()).unwrap_or_default().to_string();
    let symbol = base.get("symbol").and_then(|v| v.as_str()).unwrap_or_default().to_string();
    let chain_id = raw.get("chainId").and_then(|v| v.as_str()).unwrap_or_default().to_string();

    let parse_f64 = |v: Option<&Value>| -> Option<f64> {
        v.and_then(|x| x.as_f64().or_else(|| x.as_str().and_then(|s| s.parse().ok())))
    };

    Some(DexPair {
        mint,
        name,
        symbol,
        image_url: raw.get("info").and_then(|i| i.get("imageUrl")).and_then(|v| v.as_str()).map(|s| s.to_string()),
        price_usd: parse_f64(raw.get("priceUsd")),
        market_cap_usd: parse_f64(raw.get("marketCap")),
        liquidity_usd: parse_f64(raw.get("liquidity").and_then(|l| l.get("usd"))),
        volume_h1: parse_f64(raw.get("volume").and_then(|v| v.get("h1"))),
        volume_h24: parse_f64(raw.get("volume").and_then(|v| v.get("h24"))),
        buys_h24: raw.get("txns").and_then(|t| t.get("h24")).and_then(|h| h.get("buys")).and_then(|v| v.as_u64()),
        sells_h24: raw.get("txns").and_then(|t| t.get("h24")).and_then(|h| h.get("sells")).and_then(|v| v.as_u64()),
        price_change_h1: parse_f64(raw.get("priceChange").and_then(|p| p.get("h1"))),
        price_change_h6: parse_f64(raw.get("priceChange").and_then(|p| p.get("h6"))),
        price_change_h24: parse_f64(raw.get("priceChange").and_then(|p| p.get("h24"))),
        pair_created_at_ms: raw.get("pairCreatedAt").and_then(|v| v.as_i64()),
        chain_id,
        dex_url: raw.get("url").and_then(|v| v.as_str()).map(|s| s.to_string()),
    })
}

fn urlencode(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~') {
                c.to_string()
            } else {
                format!("%{:02X}", c as u32)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_pair_with_nested_fields() {
        let raw = json!({
            "chainId": "solana",
            "baseToken": { "address": "Mint111", "name": "Foo", "symbol": "FOO" },
            "info": { "imageUrl": "http://img" },
            "priceUsd": "0.01",
            "marketCap": 50000,
            "liquidity": { "usd": 12000.5 },
            "volume": { "h1": 100.0, "h24": 2000.0 },
            "txns": { "h24": { "buys": 10, "sells": 3 } },
            "priceChange": { "h1": 1.0, "h6": 2.0, "h24": 3.0 },
            "pairCreatedAt": 1_700_000_000_000i64,
        });

        let pair = parse_pair(&raw).expect("pair parses");
        assert_eq!(pair.mint, "Mint111");
        assert_eq!(pair.market_cap_usd, Some(50000.0));
        assert_eq!(pair.liquidity_usd, Some(12000.5));
        assert_eq!(pair.buys_h24, Some(10));
    }

    #[test]
    fn urlencode_escapes_spaces_and_symbols() {
        assert_eq!(urlencode("pepe coin"), "pepe%20coin");
    }
}

/// Insider sell (SPEC_FULL.md §4.9): combines DEX aggregator buy/sell and
/// price-change data with on-chain deployer/linked-wallet balance checks to
/// flag a team dumping on its own launch.
use crate::model::{DexPair, InsiderSellReport, InsiderSellVerdict};
use crate::rpc_client::RpcClient;

const FLAG_HIGH_SELL_PRESSURE: &str = "HIGH_SELL_PRESSURE";
const FLAG_ELEVATED_SELL_PRESSURE: &str = "ELEVATED_SELL_PRESSURE";
const FLAG_PRICE_CRASH: &str = "PRICE_CRASH";
const FLAG_PRICE_DECLINING: &str = "PRICE_DECLINING";
const FLAG_SELL_BURST: &str = "SELL_BURST";
const FLAG_DEPLOYER_EXITED: &str = "DEPLOYER_EXITED";
const FLAG_INSIDER_DUMP_CONFIRMED: &str = "INSIDER_DUMP_CONFIRMED";

/// Picks the highest-liquidity pair, checks the deployer and up to 3
/// bundle-linked wallets for a zero on-chain balance, then scores.
pub async fn compute(rpc: &RpcClient, pairs: &[DexPair], mint: &str, deployer: &str, linked_wallets: &[String]) -> Option<InsiderSellReport> {
    let pair = pairs.iter().max_by(|a, b| a.liquidity_usd.unwrap_or(0.0).partial_cmp(&b.liquidity_usd.unwrap_or(0.0)).unwrap_or(std::cmp::Ordering::Equal))?;

    let deployer_balance = rpc.get_wallet_token_balance(deployer, mint).await;
    let mut linked_exited = 0usize;
    for wallet in linked_wallets.iter().take(3) {
        if rpc.get_wallet_token_balance(wallet, mint).await <= 0.0 {
            linked_exited += 1;
        }
    }

    Some(from_signals(pair, deployer_balance <= 0.0, linked_exited))
}

fn from_signals(pair: &DexPair, deployer_exited: bool, linked_exited: usize) -> InsiderSellReport {
    let buys = pair.buys_h24.unwrap_or(0) as f64;
    let sells = pair.sells_h24.unwrap_or(0) as f64;
    let sell_ratio = if buys + sells > 0.0 { sells / (buys + sells) } else { 0.0 };

    let mut flags = Vec::new();
    let mut risk_score = 0.0;

    if sell_ratio >= 0.75 {
        flags.push(FLAG_HIGH_SELL_PRESSURE.to_string());
        risk_score += 0.30;
    } else if sell_ratio >= 0.60 {
        flags.push(FLAG_ELEVATED_SELL_PRESSURE.to_string());
        risk_score += 0.15;
    }

    let price_change = pair.price_change_h1.unwrap_or(0.0);
    if price_change <= -50.0 {
        flags.push(FLAG_PRICE_CRASH.to_string());
        risk_score += 0.25;
    } else if price_change <= -20.0 {
        flags.push(FLAG_PRICE_DECLINING.to_string());
        risk_score += 0.10;
    }

    if sells >= 20.0 && pair.volume_h1.unwrap_or(0.0) > 0.0 {
        flags.push(FLAG_SELL_BURST.to_string());
        risk_score += 0.15;
    }

    if deployer_exited {
        flags.push(FLAG_DEPLOYER_EXITED.to_string());
        risk_score += 0.20;
    }

    let has_high_pressure = flags.iter().any(|f| f == FLAG_HIGH_SELL_PRESSURE);
    if deployer_exited && linked_exited >= 2 && has_high_pressure {
        flags.push(FLAG_INSIDER_DUMP_CONFIRMED.to_string());
    }

    let risk_score = risk_score.min(1.0);
    let has_severe_flag = flags.iter().any(|f| f == FLAG_HIGH_SELL_PRESSURE || f == FLAG_PRICE_CRASH);

    let verdict = if flags.iter().any(|f| f == FLAG_INSIDER_DUMP_CONFIRMED) {
        InsiderSellVerdict::InsiderDump
    } else if risk_score >= 0.45 || has_severe_flag {
        InsiderSellVerdict::Suspicious
    } else {
        InsiderSellVerdict::Clean
    };

    InsiderSellReport { flags, risk_score, verdict }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(buys: u64, sells: u64, price_change_h1: f64, volume_h1: f64) -> DexPair {
        DexPair { buys_h24: Some(buys), sells_h24: Some(sells), price_change_h1: Some(price_change_h1), volume_h1: Some(volume_h1), ..DexPair::default() }
    }

    #[test]
    fn healthy_pair_with_no_exit_is_clean() {
        let p = pair(100, 20, 5.0, 1000.0);
        let report = from_signals(&p, false, 0);
        assert_eq!(report.verdict, InsiderSellVerdict::Clean);
    }

    #[test]
    fn heavy_selling_with_crash_is_suspicious_even_without_exit() {
        let p = pair(10, 90, -60.0, 1000.0);
        let report = from_signals(&p, false, 0);
        assert_ne!(report.verdict, InsiderSellVerdict::Clean);
    }

    #[test]
    fn deployer_and_linked_exit_with_high_pressure_confirms_dump() {
        let p = pair(5, 95, -70.0, 500.0);
        let report = from_signals(&p, true, 2);
        assert_eq!(report.verdict, InsiderSellVerdict::InsiderDump);
        assert!(report.flags.contains(&FLAG_INSIDER_DUMP_CONFIRMED.to_string()));
    }
}

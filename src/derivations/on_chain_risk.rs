/// On-chain risk (SPEC_FULL.md §4.9): holder-concentration risk scored from
/// up to `on_chain_risk_holder_limit` holder accounts.
use crate::config::DerivationsConfig;
use crate::model::{OnChainRisk, TokenBalanceEntry};
use crate::rpc_client::RpcClient;

const FLAG_TOP10_HIGH: &str = "TOP10_CONCENTRATION_HIGH";
const FLAG_TOP1_HIGH: &str = "TOP1_HOLDER_DOMINANT";
const FLAG_DEPLOYER_HOLDS: &str = "DEPLOYER_HOLDS_SIGNIFICANT_SUPPLY";
const FLAG_FEW_HOLDERS: &str = "FEW_HOLDERS";

pub async fn compute(rpc: &RpcClient, mint: &str, deployer: &str, config: &DerivationsConfig) -> Option<OnChainRisk> {
    let deadline = std::time::Duration::from_secs(config.on_chain_risk_timeout_secs);
    let holders = tokio::time::timeout(deadline, rpc.get_token_accounts(mint, config.on_chain_risk_holder_limit)).await.ok()?;
    from_holders(&holders, deployer)
}

/// Pure scoring step, separated for testing without RPC I/O. Cutoffs are not
/// spelled out numerically in SPEC_FULL.md §8 for this derivation; these
/// conventional holder-concentration bands are recorded as an Open Question
/// decision in DESIGN.md.
fn from_holders(holders: &[TokenBalanceEntry], deployer: &str) -> Option<OnChainRisk> {
    if holders.is_empty() {
        return None;
    }

    let mut balances: Vec<(Option<String>, f64)> = holders.iter().map(|h| (h.owner.clone(), h.ui_token_amount.amount_f64())).collect();
    balances.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let total: f64 = balances.iter().map(|(_, amt)| amt).sum();
    if total <= 0.0 {
        return None;
    }

    let top1_pct = balances.first().map(|(_, amt)| amt / total * 100.0).unwrap_or(0.0);
    let top10_pct = balances.iter().take(10).map(|(_, amt)| amt).sum::<f64>() / total * 100.0;
    let deployer_held_pct = balances.iter().filter(|(owner, _)| owner.as_deref() == Some(deployer)).map(|(_, amt)| amt).sum::<f64>() / total * 100.0;

    let mut flags = Vec::new();
    let mut score = 0.0;

    if top10_pct >= 70.0 {
        flags.push(FLAG_TOP10_HIGH.to_string());
        score += 35.0;
    } else if top10_pct >= 50.0 {
        score += 15.0;
    }

    if top1_pct >= 30.0 {
        flags.push(FLAG_TOP1_HIGH.to_string());
        score += 30.0;
    } else if top1_pct >= 15.0 {
        score += 10.0;
    }

    if deployer_held_pct >= 10.0 {
        flags.push(FLAG_DEPLOYER_HOLDS.to_string());
        score += 25.0;
    }

    if balances.len() < 20 {
        flags.push(FLAG_FEW_HOLDERS.to_string());
        score += 10.0;
    }

    Some(OnChainRisk { top10_pct, top1_pct, deployer_held_pct, score: score.min(100.0), flags })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UiTokenAmount;

    fn holder(owner: &str, amount: f64) -> TokenBalanceEntry {
        TokenBalanceEntry {
            account_index: 0,
            mint: "mint".to_string(),
            owner: Some(owner.to_string()),
            ui_token_amount: UiTokenAmount { amount: amount.to_string(), ui_amount: Some(amount), decimals: Some(6) },
        }
    }

    #[test]
    fn empty_holder_list_returns_none() {
        assert!(from_holders(&[], "deployer").is_none());
    }

    #[test]
    fn concentrated_single_holder_flags_dominance() {
        let holders = vec![holder("whale", 900.0), holder("b", 50.0), holder("c", 50.0)];
        let risk = from_holders(&holders, "deployer").unwrap();
        assert!(risk.flags.contains(&FLAG_TOP1_HIGH.to_string()));
        assert!(risk.flags.contains(&FLAG_TOP10_HIGH.to_string()));
        assert!(risk.score > 50.0);
    }

    #[test]
    fn deployer_holding_supply_is_flagged() {
        let mut holders: Vec<TokenBalanceEntry> = (0..30).map(|i| holder(&format!("holder{}", i), 10.0)).collect();
        holders.push(holder("deployer", 200.0));
        let risk = from_holders(&holders, "deployer").unwrap();
        assert!(risk.flags.contains(&FLAG_DEPLOYER_HOLDS.to_string()));
        assert!(risk.deployer_held_pct > 10.0);
    }

    #[test]
    fn well_distributed_holders_score_low() {
        let holders: Vec<TokenBalanceEntry> = (0..50).map(|i| holder(&format!("holder{}", i), 20.0)).collect();
        let risk = from_holders(&holders, "deployer").unwrap();
        assert!(risk.flags.is_empty());
        assert_eq!(risk.score, 0.0);
    }
}

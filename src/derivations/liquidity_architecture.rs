/// Liquidity architecture (SPEC_FULL.md §4.9): pool-concentration and
/// authenticity signal computed over every DEX pair backing a token.
use crate::model::{DexPair, LiquidityArchitecture};

const FLAG_FRAGMENTED: &str = "FRAGMENTED_LIQUIDITY";
const FLAG_ZERO_VOLUME: &str = "ZERO_VOLUME";
const FLAG_DEPLOYER_LP_ONLY: &str = "DEPLOYER_LP_ONLY";

/// `deployer_is_sole_lp` is supplied by the caller — determining LP
/// ownership requires enumerating pool-token holders, which the orchestrator
/// does not do for every `analyze(mint)` call, so callers without that
/// evidence pass `false` and the flag is simply never raised.
pub fn compute(pairs: &[DexPair], deployer_is_sole_lp: bool) -> Option<LiquidityArchitecture> {
    if pairs.is_empty() {
        return None;
    }

    let total_liq: f64 = pairs.iter().map(|p| p.liquidity_usd.unwrap_or(0.0)).sum();
    let total_vol: f64 = pairs.iter().map(|p| p.volume_h24.unwrap_or(0.0)).sum();

    let hhi = if total_liq > 0.0 {
        pairs
            .iter()
            .map(|p| {
                let share = p.liquidity_usd.unwrap_or(0.0) / total_liq;
                share * share
            })
            .sum::<f64>()
            * 10_000.0
    } else {
        0.0
    };

    let liq_to_volume_ratio = if total_vol > 0.0 { total_liq / total_vol } else { 0.0 };

    let mut flags = Vec::new();
    if hhi < 2500.0 && pairs.len() > 1 {
        flags.push(FLAG_FRAGMENTED.to_string());
    }
    if total_vol <= 0.0 {
        flags.push(FLAG_ZERO_VOLUME.to_string());
    }
    if deployer_is_sole_lp {
        flags.push(FLAG_DEPLOYER_LP_ONLY.to_string());
    }

    let mut authenticity_score = 1.0;
    if flags.iter().any(|f| f == FLAG_FRAGMENTED) {
        authenticity_score -= 0.2;
    }
    if flags.iter().any(|f| f == FLAG_ZERO_VOLUME) {
        authenticity_score -= 0.4;
    }
    if flags.iter().any(|f| f == FLAG_DEPLOYER_LP_ONLY) {
        authenticity_score -= 0.3;
    }

    Some(LiquidityArchitecture { hhi, liq_to_volume_ratio, authenticity_score: authenticity_score.clamp(0.0, 1.0), flags })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(liquidity: f64, volume: f64) -> DexPair {
        DexPair { liquidity_usd: Some(liquidity), volume_h24: Some(volume), ..DexPair::default() }
    }

    #[test]
    fn empty_pairs_returns_none() {
        assert!(compute(&[], false).is_none());
    }

    #[test]
    fn single_concentrated_pair_has_max_hhi() {
        let arch = compute(&[pair(10_000.0, 5000.0)], false).unwrap();
        assert_eq!(arch.hhi, 10_000.0);
        assert!(arch.flags.is_empty());
    }

    #[test]
    fn evenly_split_pairs_are_fragmented() {
        let pairs = vec![pair(5000.0, 1000.0), pair(5000.0, 1000.0), pair(5000.0, 1000.0)];
        let arch = compute(&pairs, false).unwrap();
        assert!(arch.flags.contains(&FLAG_FRAGMENTED.to_string()));
    }

    #[test]
    fn zero_volume_penalizes_authenticity() {
        let arch = compute(&[pair(5000.0, 0.0)], false).unwrap();
        assert!(arch.flags.contains(&FLAG_ZERO_VOLUME.to_string()));
        assert!(arch.authenticity_score < 1.0);
    }
}

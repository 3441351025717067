/// Zombie detector (SPEC_FULL.md §4.9): flags an alive token in a lineage
/// family that looks like a relaunch of a previously dead one, by image
/// fingerprint similarity weighted against whether the deployer matches.
use chrono::{DateTime, Utc};

use crate::config::DerivationsConfig;
use crate::http::ClientPool;
use crate::model::{Token, ZombieAlert, ZombieConfidence};
use crate::similarity;

/// A token is "dead" once its liquidity has fallen below the configured
/// floor and it has aged past the configured window (SPEC_FULL.md §4.9
/// "liquidity < $100 AND age >= 24h").
pub fn is_dead(token: &Token, now: DateTime<Utc>, config: &DerivationsConfig) -> bool {
    let liq_dead = token.liquidity_usd.unwrap_or(0.0) < config.zombie_dead_liquidity_usd;
    let age_hours = token
        .created_at
        .map(|created| (now - created).num_seconds() as f64 / 3600.0)
        .unwrap_or(0.0);
    liq_dead && age_hours >= config.zombie_dead_age_hours as f64
}

/// Scans `family` (the query token plus every lineage derivative) for a dead
/// token whose image closely matches a still-alive, later-created one,
/// fetching fresh fingerprints for each candidate pair.
pub async fn detect(pool: &ClientPool, family: &[Token], now: DateTime<Utc>, config: &DerivationsConfig) -> Option<ZombieAlert> {
    let mut best: Option<ZombieAlert> = None;

    for dead in family.iter().filter(|t| is_dead(t, now, config)) {
        for alive in family.iter().filter(|t| t.mint != dead.mint && !is_dead(t, now, config)) {
            let (Some(dead_created), Some(alive_created)) = (dead.created_at, alive.created_at) else { continue };
            if alive_created <= dead_created {
                continue;
            }

            let (Some(dead_img), Some(alive_img)) = (dead.image_uri.as_deref(), alive.image_uri.as_deref()) else { continue };
            let (Some(fa), Some(fb)) = (
                similarity::fetch_image_fingerprint(pool, dead_img).await,
                similarity::fetch_image_fingerprint(pool, alive_img).await,
            ) else {
                continue;
            };
            let image_similarity = similarity::image_similarity_from_fingerprints(fa, fb);
            let same_deployer = matches!((&dead.deployer, &alive.deployer), (Some(a), Some(b)) if a == b);

            let Some(candidate) = evaluate(&dead.mint, &alive.mint, same_deployer, image_similarity) else { continue };

            let better = match &best {
                None => true,
                Some(b) => rank(candidate.confidence) > rank(b.confidence)
                    || (rank(candidate.confidence) == rank(b.confidence) && candidate.image_similarity > b.image_similarity),
            };
            if better {
                best = Some(candidate);
            }
        }
    }

    best
}

/// Pure classification step, separated out for testing without network I/O
/// (SPEC_FULL.md §4.9 thresholds: same-deployer >= 0.72 confirmed,
/// different-deployer >= 0.92 probable, >= 0.80 possible).
fn evaluate(dead_mint: &str, resurrection_mint: &str, same_deployer: bool, image_similarity: f64) -> Option<ZombieAlert> {
    let confidence = if same_deployer && image_similarity >= 0.72 {
        ZombieConfidence::Confirmed
    } else if !same_deployer && image_similarity >= 0.92 {
        ZombieConfidence::Probable
    } else if image_similarity >= 0.80 {
        ZombieConfidence::Possible
    } else {
        return None;
    };

    Some(ZombieAlert {
        dead_mint: dead_mint.to_string(),
        resurrection_mint: resurrection_mint.to_string(),
        same_deployer,
        image_similarity,
        confidence,
    })
}

fn rank(confidence: ZombieConfidence) -> u8 {
    match confidence {
        ZombieConfidence::Confirmed => 2,
        ZombieConfidence::Probable => 1,
        ZombieConfidence::Possible => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config() -> DerivationsConfig {
        DerivationsConfig::default()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn dead_requires_both_low_liquidity_and_age() {
        let config = config();
        let now = at(100 * 3600);

        let thin_but_young = Token { liquidity_usd: Some(10.0), created_at: Some(at(99 * 3600)), ..Token::empty("a") };
        assert!(!is_dead(&thin_but_young, now, &config));

        let old_but_liquid = Token { liquidity_usd: Some(5000.0), created_at: Some(at(0)), ..Token::empty("b") };
        assert!(!is_dead(&old_but_liquid, now, &config));

        let dead = Token { liquidity_usd: Some(10.0), created_at: Some(at(0)), ..Token::empty("c") };
        assert!(is_dead(&dead, now, &config));
    }

    #[test]
    fn same_deployer_high_similarity_is_confirmed() {
        let alert = evaluate("dead", "alive", true, 0.95).unwrap();
        assert_eq!(alert.confidence, ZombieConfidence::Confirmed);
    }

    #[test]
    fn different_deployer_needs_very_high_similarity_for_probable() {
        assert!(evaluate("dead", "alive", false, 0.85).unwrap().confidence == ZombieConfidence::Possible);
        assert_eq!(evaluate("dead", "alive", false, 0.93).unwrap().confidence, ZombieConfidence::Probable);
    }

    #[test]
    fn low_similarity_yields_no_alert() {
        assert!(evaluate("dead", "alive", true, 0.5).is_none());
    }
}

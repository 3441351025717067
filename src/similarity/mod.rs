/// Token/lineage similarity scoring (SPEC_FULL.md §4.4 steps 4-5, §4.7
/// signal 4 "phash_cluster").
///
/// Name/symbol similarity is a normalised Levenshtein ratio; image
/// similarity is a 64-bit content fingerprint (SHA-256 folded down to 64
/// bits via XOR, compared by Hamming distance) rather than a true
/// perceptual hash — the corpus carries `sha2` but no image-decoding crate,
/// so this stays within the dependency stack while still producing a
/// stable, comparable per-image fingerprint.
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::config::SimilarityConfig;
use crate::http::ClientPool;
use crate::logger::{self, LogTag};
use crate::model::Token;

pub fn normalize(s: &str) -> String {
    s.to_lowercase().chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Normalised Levenshtein similarity in `[0, 1]`; `1.0` for equal strings,
/// `0.0` when both are empty-after-normalisation but differ, `1.0` when
/// both are empty.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein(&a, &b) as f64 / max_len as f64)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (n, m) = (a.len(), b.len());
    let mut row: Vec<usize> = (0..=m).collect();

    for i in 1..=n {
        let mut prev = row[0];
        row[0] = i;
        for j in 1..=m {
            let tmp = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                prev
            } else {
                1 + prev.min(row[j]).min(row[j - 1])
            };
            prev = tmp;
        }
    }
    row[m]
}

/// 64-bit content fingerprint of arbitrary bytes, used as the token image's
/// comparable "phash" (SPEC_FULL.md §4.7 signal 4 stores this under
/// `extra_json.phash`).
pub fn content_fingerprint(bytes: &[u8]) -> u64 {
    let digest = Sha256::digest(bytes);
    digest.chunks(8).fold(0u64, |acc, chunk| {
        let mut buf = [0u8; 8];
        buf[..chunk.len()].copy_from_slice(chunk);
        acc ^ u64::from_le_bytes(buf)
    })
}

pub fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// Best-effort image fetch + fingerprint; resolves to `None` on any failure
/// (network, 404, ...) so lineage enrichment never blocks on it.
pub async fn fetch_image_fingerprint(pool: &ClientPool, image_url: &str) -> Option<u64> {
    let client = pool.shared();
    let resp = client
        .get(image_url)
        .timeout(Duration::from_secs(8))
        .send()
        .await
        .map_err(|e| logger::debug(LogTag::Similarity, &format!("image fetch failed: {}", e)))
        .ok()?;
    let bytes = resp.bytes().await.ok()?;
    Some(content_fingerprint(&bytes))
}

/// Hamming-distance-derived similarity in `[0, 1]` over 64-bit fingerprints.
pub fn image_similarity_from_fingerprints(a: u64, b: u64) -> f64 {
    1.0 - (hamming_distance(a, b) as f64 / 64.0)
}

/// `0.8` partial credit when two wallets share an operator-fingerprint DNA
/// group, `1.0` for an exact address match, else `0.0`
/// (SPEC_FULL.md §4.4 step 5).
pub fn deployer_score(a: &Option<String>, b: &Option<String>, shares_dna_fingerprint: bool) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) if a == b => 1.0,
        _ if shares_dna_fingerprint => 0.8,
        _ => 0.0,
    }
}

/// Closer creation timestamps score higher; decays to 0 over 30 days.
pub fn temporal_score(a: Option<chrono::DateTime<chrono::Utc>>, b: Option<chrono::DateTime<chrono::Utc>>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => {
            let delta_secs = (a - b).num_seconds().unsigned_abs() as f64;
            let window_secs = 30.0 * 24.0 * 3600.0;
            (1.0 - delta_secs / window_secs).clamp(0.0, 1.0)
        }
        _ => 0.0,
    }
}

/// Weighted composite over the five sub-scores (SPEC_FULL.md §4.4 step 5).
pub struct CompositeInputs {
    pub name_sim: f64,
    pub symbol_sim: f64,
    pub image_sim: Option<f64>,
    pub deployer_sim: f64,
    pub temporal_sim: f64,
}

pub fn composite_score(config: &SimilarityConfig, inputs: &CompositeInputs) -> f64 {
    let image_sim = inputs.image_sim.unwrap_or(0.0);
    config.weight_name * inputs.name_sim
        + config.weight_symbol * inputs.symbol_sim
        + config.weight_image * image_sim
        + config.weight_deployer * inputs.deployer_sim
        + config.weight_temporal * inputs.temporal_sim
}

/// Cheap name/symbol pre-filter (SPEC_FULL.md §4.4 step 4) run before the
/// expensive per-candidate enrichment fan-out.
pub fn passes_prefilter(config: &SimilarityConfig, query: &Token, candidate: &Token) -> bool {
    text_similarity(&query.name, &candidate.name) >= config.name_similarity_threshold
        || text_similarity(&query.symbol, &candidate.symbol) >= config.symbol_similarity_threshold
}

pub type SharedClientPool = Arc<ClientPool>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(text_similarity("Pepe", "pepe"), 1.0);
    }

    #[test]
    fn completely_different_strings_score_low() {
        assert!(text_similarity("abcdef", "zyxwvu") < 0.2);
    }

    #[test]
    fn hamming_distance_of_equal_hashes_is_zero() {
        assert_eq!(hamming_distance(42, 42), 0);
        assert_eq!(image_similarity_from_fingerprints(42, 42), 1.0);
    }

    #[test]
    fn deployer_score_exact_match_beats_dna_partial_credit() {
        let a = Some("wallet1".to_string());
        assert_eq!(deployer_score(&a, &a, true), 1.0);
        assert_eq!(deployer_score(&a, &Some("wallet2".to_string()), true), 0.8);
        assert_eq!(deployer_score(&a, &Some("wallet2".to_string()), false), 0.0);
    }
}

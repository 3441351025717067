/// Operator fingerprint / DNA (SPEC_FULL.md §4.9): derives a stable
/// fingerprint from a token's off-chain metadata phrasing, grouping
/// deployers that recognizably reuse the same description text.
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::sync::Semaphore;

use crate::config::DerivationsConfig;
use crate::http::HttpShell;
use crate::logger::{self, LogTag};
use crate::model::OperatorFingerprintSignal;
use crate::store::EventStore;

/// A single (mint, deployer, metadata_uri) triple awaiting fingerprinting.
pub struct FingerprintInput {
    pub deployer: String,
    pub metadata_uri: String,
}

/// Classifies the hosting service from the metadata URI, best-effort
/// (SPEC_FULL.md §4.9 "arweave|ipfs|cloudflare|pinata|pumpfun|other").
pub fn upload_service_of(uri: &str) -> &'static str {
    let lower = uri.to_lowercase();
    if lower.contains("arweave.net") || lower.contains("ar://") {
        "arweave"
    } else if lower.contains("ipfs") {
        "ipfs"
    } else if lower.contains("cloudflare") {
        "cloudflare"
    } else if lower.contains("pinata") {
        "pinata"
    } else if lower.contains("pump.fun") || lower.contains("pumpfun") {
        "pumpfun"
    } else {
        "other"
    }
}

/// Lowercased, alphanumeric-only, truncated to the first 60 characters
/// (SPEC_FULL.md §4.9).
pub fn normalize_description(description: &str) -> String {
    description.to_lowercase().chars().filter(|c| c.is_ascii_alphanumeric()).take(60).collect()
}

/// 16-hex fingerprint over `"{upload_service}:{normalized_description}"`.
pub fn fingerprint_of(upload_service: &str, normalized_description: &str) -> String {
    let payload = format!("{}:{}", upload_service, normalized_description);
    let digest = Sha256::digest(payload.as_bytes());
    digest.iter().take(8).map(|b| format!("{:02x}", b)).collect()
}

/// Fetches each input's off-chain metadata JSON under bounded concurrency
/// and a per-fetch timeout, then records the (fingerprint, deployer)
/// mapping in the Event Store. The per-fingerprint upload service is not
/// persisted — `operator_mappings` is canonically a (fingerprint, wallet)
/// table (SPEC_FULL.md §3) — so it is re-derived best-effort at read time.
pub async fn fingerprint_and_record(shell: &Arc<HttpShell>, store: &EventStore, config: &DerivationsConfig, inputs: Vec<FingerprintInput>) {
    let semaphore = Arc::new(Semaphore::new(config.fingerprint_fetch_concurrency));
    let mut handles = Vec::new();

    for input in inputs {
        let shell = shell.clone();
        let permit = semaphore.clone();
        let timeout_secs = config.fingerprint_fetch_timeout_secs;

        handles.push(tokio::spawn(async move {
            let _permit = permit.acquire_owned().await.ok()?;
            fetch_fingerprint(&shell, &input.metadata_uri, timeout_secs).await.map(|fp| (fp, input.deployer))
        }));
    }

    for handle in handles {
        if let Ok(Some((fingerprint, deployer))) = handle.await {
            if let Err(e) = store.record_operator_mapping(&fingerprint, &deployer).await {
                logger::debug(LogTag::Derivations, &format!("record_operator_mapping failed: {}", e));
            }
        }
    }
}

async fn fetch_fingerprint(shell: &HttpShell, metadata_uri: &str, timeout_secs: u64) -> Option<String> {
    let deadline = Duration::from_secs(timeout_secs);
    let response = tokio::time::timeout(deadline, shell.pool.shared().get(metadata_uri).send()).await.ok()?.ok()?;
    let json: serde_json::Value = response.json().await.ok()?;
    let description = json.get("description").and_then(|d| d.as_str())?;

    let upload_service = upload_service_of(metadata_uri);
    let normalized = normalize_description(description);
    Some(fingerprint_of(upload_service, &normalized))
}

/// Signal for `deployer` iff its fingerprint group spans >= 2 distinct
/// deployers (SPEC_FULL.md §4.9 "Emit ... iff >= 2 distinct deployers share
/// a fingerprint").
pub async fn signal_for_deployer(store: &EventStore, deployer: &str) -> Option<OperatorFingerprintSignal> {
    let groups = store.operator_fingerprint_groups().await.ok()?;
    let (fingerprint, wallets) = groups.into_iter().find(|(_, wallets)| wallets.iter().any(|w| w == deployer))?;

    let shared_with: Vec<String> = wallets.into_iter().filter(|w| w != deployer).collect();
    if shared_with.is_empty() {
        return None;
    }

    Some(OperatorFingerprintSignal { fingerprint, upload_service: "unknown".to_string(), shared_with })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_upload_services() {
        assert_eq!(upload_service_of("https://arweave.net/abc123"), "arweave");
        assert_eq!(upload_service_of("https://ipfs.io/ipfs/Qm..."), "ipfs");
        assert_eq!(upload_service_of("https://pump.fun/meta/x"), "pumpfun");
        assert_eq!(upload_service_of("https://example.com/x"), "other");
    }

    #[test]
    fn normalize_strips_punctuation_and_case_and_truncates() {
        let long = "A".repeat(100);
        assert_eq!(normalize_description(&long).len(), 60);
        assert_eq!(normalize_description("The Best Coin! #1"), "thebestcoin1");
    }

    #[test]
    fn fingerprint_is_stable_and_service_sensitive() {
        let a = fingerprint_of("arweave", "bestcoin");
        let b = fingerprint_of("arweave", "bestcoin");
        let c = fingerprint_of("ipfs", "bestcoin");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }
}

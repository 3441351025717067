/// Uniform wrapper around every outbound call (SPEC_FULL.md §4.1 "HTTP Shell").
///
/// Three separable layers, same as the teacher's RPC stack: retry/backoff,
/// a circuit breaker per external service, and a small client pool. Unlike
/// the teacher's multi-provider failover RPC manager, the forensic shell
/// talks to exactly one endpoint per service — there is nothing to select
/// between, only to protect.
pub mod dispatch;
pub mod pool;

pub use dispatch::{DispatchError, HttpShell};
pub use pool::ClientPool;

use crate::rpc::circuit_breaker::{CircuitBreakerConfig, CircuitBreakerManager, CircuitBreakerStatus};
use std::sync::Arc;
use std::time::Duration;

/// Canonical breaker names — one per external service named in
/// SPEC_FULL.md §4.1 ("One breaker per external service").
pub const BREAKER_RPC: &str = "rpc";
pub const BREAKER_DEX_AGGREGATOR: &str = "dex_aggregator";
pub const BREAKER_TOKEN_AGGREGATOR: &str = "token_aggregator";

pub fn default_breaker_config(failure_threshold: u32, success_threshold: u32, recovery_timeout: Duration) -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        failure_threshold,
        success_threshold,
        open_duration: recovery_timeout,
        ..CircuitBreakerConfig::default()
    }
}

/// Admin-facing health snapshot (SPEC_FULL.md §6 `health()`).
pub async fn health(breakers: &Arc<CircuitBreakerManager>) -> Vec<CircuitBreakerStatus> {
    breakers.get_all_status().await
}

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Response, StatusCode};
use tokio::sync::RwLock;

use crate::logger::{self, LogTag};
use crate::rpc::circuit_breaker::{CircuitBreakerConfig, CircuitBreakerManager};

use super::pool::ClientPool;

/// Why a dispatched call produced no result. The dispatcher never panics or
/// propagates this upward past the component that issued the call — it is
/// logged and converted to `None` (SPEC_FULL.md §4.1, §7).
#[derive(Debug, Clone)]
pub enum DispatchError {
    CircuitOpen { service: String, retry_after: Duration },
    Forbidden { status: u16 },
    ExhaustedRetries { attempts: u32 },
    RpcLevelError { message: String },
    Transport { message: String },
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::CircuitOpen { service, retry_after } => {
                write!(f, "circuit open for {} (retry in {:?})", service, retry_after)
            }
            DispatchError::Forbidden { status } => write!(f, "forbidden (HTTP {})", status),
            DispatchError::ExhaustedRetries { attempts } => {
                write!(f, "exhausted retries after {} attempts", attempts)
            }
            DispatchError::RpcLevelError { message } => write!(f, "rpc-level error: {}", message),
            DispatchError::Transport { message } => write!(f, "transport error: {}", message),
        }
    }
}

#[derive(Debug, Default)]
struct BreakerCounters {
    total: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
}

/// Retry/backoff + circuit-breaker dispatcher shared by the RPC and market
/// clients (SPEC_FULL.md §4.1). One instance per process; the services it
/// protects are named by string key (`BREAKER_RPC`, ...).
pub struct HttpShell {
    pub pool: ClientPool,
    breakers: Arc<CircuitBreakerManager>,
    counters: RwLock<HashMap<String, Arc<BreakerCounters>>>,
    max_retries: u32,
    backoff_base: Duration,
}

impl HttpShell {
    pub fn new(breakers: Arc<CircuitBreakerManager>, max_retries: u32, backoff_base: Duration) -> Self {
        Self {
            pool: ClientPool::new(),
            breakers,
            counters: RwLock::new(HashMap::new()),
            max_retries,
            backoff_base,
        }
    }

    pub fn breakers(&self) -> Arc<CircuitBreakerManager> {
        self.breakers.clone()
    }

    async fn counters_for(&self, service: &str) -> Arc<BreakerCounters> {
        if let Some(c) = self.counters.read().await.get(service) {
            return c.clone();
        }
        let mut map = self.counters.write().await;
        map.entry(service.to_string())
            .or_insert_with(|| Arc::new(BreakerCounters::default()))
            .clone()
    }

    /// Counters surfaced by the admin health endpoint
    /// (SPEC_FULL.md §4.1 "total/successful/failed/rejected").
    pub async fn counter_snapshot(&self, service: &str) -> (u64, u64, u64, u64) {
        let c = self.counters_for(service).await;
        (
            c.total.load(Ordering::Relaxed),
            c.successful.load(Ordering::Relaxed),
            c.failed.load(Ordering::Relaxed),
            c.rejected.load(Ordering::Relaxed),
        )
    }

    /// Issue a POST with a JSON body, protected by the named service's
    /// circuit breaker, with retry/backoff on 429/5xx/transient I/O error.
    ///
    /// `bypass_breaker` lets optional enrichment paths (DAS `searchAssets`,
    /// ...) skip the breaker so their flakiness doesn't trip it for
    /// critical calls sharing the same service name (SPEC_FULL.md §4.1,
    /// §4.3).
    pub async fn post_json(
        &self,
        service: &str,
        url: &str,
        body: &serde_json::Value,
        bypass_breaker: bool,
    ) -> Result<serde_json::Value, DispatchError> {
        let breaker = self.breakers.get_breaker(service).await;
        let counters = self.counters_for(service).await;

        if !bypass_breaker {
            if let Err(wait) = breaker.can_execute().await {
                counters.rejected.fetch_add(1, Ordering::Relaxed);
                return Err(DispatchError::CircuitOpen {
                    service: service.to_string(),
                    retry_after: wait,
                });
            }
        }

        let client = self.pool.client_for(service);
        let mut attempt = 0u32;

        loop {
            counters.total.fetch_add(1, Ordering::Relaxed);
            let send_result = client.post(url).json(body).send().await;

            match send_result {
                Ok(resp) => match self.handle_response(resp, attempt).await {
                    Ok(value) => {
                        counters.successful.fetch_add(1, Ordering::Relaxed);
                        if !bypass_breaker {
                            breaker.record_success().await;
                        }
                        return Ok(value);
                    }
                    Err(ResponseOutcome::Forbidden(status)) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        if !bypass_breaker {
                            breaker.record_failure("forbidden", false).await;
                        }
                        return Err(DispatchError::Forbidden { status });
                    }
                    Err(ResponseOutcome::RpcLevel(message)) => {
                        // RPC-level error object: "no result", not retried.
                        counters.successful.fetch_add(1, Ordering::Relaxed);
                        if !bypass_breaker {
                            breaker.record_success().await;
                        }
                        return Err(DispatchError::RpcLevelError { message });
                    }
                    Err(ResponseOutcome::RateLimited(retry_after)) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        if !bypass_breaker {
                            breaker.record_failure("rate limited", true).await;
                        }
                        if attempt >= self.max_retries {
                            return Err(DispatchError::ExhaustedRetries { attempts: attempt + 1 });
                        }
                        tokio::time::sleep(retry_after).await;
                        attempt += 1;
                    }
                    Err(ResponseOutcome::ServerError(status)) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        if !bypass_breaker {
                            breaker.record_failure(&format!("HTTP {}", status), false).await;
                        }
                        if attempt >= self.max_retries {
                            return Err(DispatchError::ExhaustedRetries { attempts: attempt + 1 });
                        }
                        tokio::time::sleep(self.backoff_base * 2u32.pow(attempt)).await;
                        attempt += 1;
                    }
                    Err(ResponseOutcome::ParseError(message)) => {
                        logger::debug(LogTag::Rpc, &format!("parse error from {}: {}", service, message));
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        if !bypass_breaker {
                            breaker.record_failure(&message, false).await;
                        }
                        if attempt >= self.max_retries {
                            return Err(DispatchError::Transport { message });
                        }
                        tokio::time::sleep(self.backoff_base * 2u32.pow(attempt)).await;
                        attempt += 1;
                    }
                },
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    if !bypass_breaker {
                        breaker.record_failure(&e.to_string(), false).await;
                    }
                    if attempt >= self.max_retries {
                        return Err(DispatchError::Transport { message: e.to_string() });
                    }
                    tokio::time::sleep(self.backoff_base * 2u32.pow(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Issue a GET, same retry/breaker discipline as `post_json`.
    pub async fn get_json(
        &self,
        service: &str,
        url: &str,
        bypass_breaker: bool,
    ) -> Result<serde_json::Value, DispatchError> {
        let breaker = self.breakers.get_breaker(service).await;
        let counters = self.counters_for(service).await;

        if !bypass_breaker {
            if let Err(wait) = breaker.can_execute().await {
                counters.rejected.fetch_add(1, Ordering::Relaxed);
                return Err(DispatchError::CircuitOpen {
                    service: service.to_string(),
                    retry_after: wait,
                });
            }
        }

        let client = self.pool.client_for(service);
        let mut attempt = 0u32;

        loop {
            counters.total.fetch_add(1, Ordering::Relaxed);
            match client.get(url).send().await {
                Ok(resp) => match self.handle_response(resp, attempt).await {
                    Ok(value) => {
                        counters.successful.fetch_add(1, Ordering::Relaxed);
                        if !bypass_breaker {
                            breaker.record_success().await;
                        }
                        return Ok(value);
                    }
                    Err(ResponseOutcome::Forbidden(status)) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        if !bypass_breaker {
                            breaker.record_failure("forbidden", false).await;
                        }
                        return Err(DispatchError::Forbidden { status });
                    }
                    Err(ResponseOutcome::RpcLevel(message)) => {
                        counters.successful.fetch_add(1, Ordering::Relaxed);
                        if !bypass_breaker {
                            breaker.record_success().await;
                        }
                        return Err(DispatchError::RpcLevelError { message });
                    }
                    Err(ResponseOutcome::RateLimited(retry_after)) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        if !bypass_breaker {
                            breaker.record_failure("rate limited", true).await;
                        }
                        if attempt >= self.max_retries {
                            return Err(DispatchError::ExhaustedRetries { attempts: attempt + 1 });
                        }
                        tokio::time::sleep(retry_after).await;
                        attempt += 1;
                    }
                    Err(ResponseOutcome::ServerError(status)) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        if !bypass_breaker {
                            breaker.record_failure(&format!("HTTP {}", status), false).await;
                        }
                        if attempt >= self.max_retries {
                            return Err(DispatchError::ExhaustedRetries { attempts: attempt + 1 });
                        }
                        tokio::time::sleep(self.backoff_base * 2u32.pow(attempt)).await;
                        attempt += 1;
                    }
                    Err(ResponseOutcome::ParseError(message)) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        if !bypass_breaker {
                            breaker.record_failure(&message, false).await;
                        }
                        if attempt >= self.max_retries {
                            return Err(DispatchError::Transport { message });
                        }
                        tokio::time::sleep(self.backoff_base * 2u32.pow(attempt)).await;
                        attempt += 1;
                    }
                },
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    if !bypass_breaker {
                        breaker.record_failure(&e.to_string(), false).await;
                    }
                    if attempt >= self.max_retries {
                        return Err(DispatchError::Transport { message: e.to_string() });
                    }
                    tokio::time::sleep(self.backoff_base * 2u32.pow(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn handle_response(&self, resp: Response, attempt: u32) -> Result<serde_json::Value, ResponseOutcome> {
        let status = resp.status();

        if status == StatusCode::FORBIDDEN {
            return Err(ResponseOutcome::Forbidden(status.as_u16()));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(self.backoff_base * 2u32.pow(attempt));
            return Err(ResponseOutcome::RateLimited(retry_after));
        }

        if status.is_server_error() {
            return Err(ResponseOutcome::ServerError(status.as_u16()));
        }

        if !status.is_success() {
            return Err(ResponseOutcome::ServerError(status.as_u16()));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| ResponseOutcome::ParseError(e.to_string()))?;

        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| ResponseOutcome::ParseError(e.to_string()))?;

        if let Some(err) = value.get("error") {
            let message = err
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown rpc error")
                .to_string();
            return Err(ResponseOutcome::RpcLevel(message));
        }

        Ok(value)
    }
}

enum ResponseOutcome {
    Forbidden(u16),
    RateLimited(Duration),
    ServerError(u16),
    RpcLevel(String),
    ParseError(String),
}

//! Circuit breaker primitives shared by the HTTP shell (SPEC_FULL.md §4.1).
//!
//! The teacher's original `rpc` module was a full multi-provider failover
//! stack (rate limiters, provider selection, SQLite-backed stats). The
//! forensic pipeline talks to exactly one endpoint per external service, so
//! only the circuit breaker state machine survives here; `src/rpc_client`
//! and `src/market` own the typed request/response shapes instead.

pub mod circuit_breaker;

pub use circuit_breaker::{CircuitBreakerConfig, CircuitBreakerManager, CircuitBreakerStatus, CircuitState, ProviderCircuitBreaker};

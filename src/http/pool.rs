use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use reqwest::Client;

use crate::http::{BREAKER_DEX_AGGREGATOR, BREAKER_RPC, BREAKER_TOKEN_AGGREGATOR};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(8);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(25);

/// One long-lived [`reqwest::Client`] per backend plus a shared client for
/// generic fetches (image downloads for phash, bridge attestation lookups),
/// created at startup and dropped at shutdown (SPEC_FULL.md §4.1 "Client
/// pool"). Grounded on the single-client-with-connection-reuse pattern in
/// `examples/IdrisAbdulwadud900-ONCHAIN_BEAST/src/core/rpc_client.rs`.
pub struct ClientPool {
    clients: RwLock<HashMap<String, Client>>,
    shared: Client,
}

impl ClientPool {
    pub fn new() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            shared: build_client(),
        }
    }

    /// Returns the client dedicated to `service`, creating it on first use.
    pub fn client_for(&self, service: &str) -> Client {
        if let Some(c) = self.clients.read().unwrap().get(service) {
            return c.clone();
        }
        let mut clients = self.clients.write().unwrap();
        clients
            .entry(service.to_string())
            .or_insert_with(build_client)
            .clone()
    }

    /// Shared client for ad hoc fetches not tied to a breaker-protected
    /// service (image downloads, etc).
    pub fn shared(&self) -> Client {
        self.shared.clone()
    }

    /// Pre-warm the three canonical backends named in SPEC_FULL.md §4.1.
    pub fn warm(&self) {
        for name in [BREAKER_RPC, BREAKER_DEX_AGGREGATOR, BREAKER_TOKEN_AGGREGATOR] {
            let _ = self.client_for(name);
        }
    }
}

impl Default for ClientPool {
    fn default() -> Self {
        Self::new()
    }
}

fn build_client() -> Client {
    Client::builder()
        .no_proxy()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("reqwest client builder with static config never fails")
}

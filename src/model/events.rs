use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only log row (SPEC_FULL.md §3 `TokenEvent`, §6 `intelligence_events`).
///
/// `extra` is an opaque JSON blob used to cache per-token enrichments
/// (`lp_providers`, `early_buyers`, `phash`, ...). Readers defensively
/// re-parse it if they encounter a doubly-encoded JSON string, since that
/// shape has been observed on records written by older pipeline versions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEvent {
    pub id: Option<i64>,
    pub event_type: EventType,
    pub mint: String,
    pub deployer: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub narrative: Option<String>,
    pub mcap_usd: Option<f64>,
    pub liq_usd: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    pub rugged_at: Option<DateTime<Utc>>,
    pub recorded_at: DateTime<Utc>,
    pub extra: serde_json::Value,
}

impl TokenEvent {
    pub fn new(event_type: EventType, mint: impl Into<String>) -> Self {
        Self {
            id: None,
            event_type,
            mint: mint.into(),
            deployer: None,
            name: None,
            symbol: None,
            narrative: None,
            mcap_usd: None,
            liq_usd: None,
            created_at: None,
            rugged_at: None,
            recorded_at: Utc::now(),
            extra: serde_json::Value::Null,
        }
    }

    /// Re-parse `extra` defensively: some historical rows stored the blob
    /// as a JSON string containing JSON rather than a JSON object
    /// (SPEC_FULL.md §9 "opaque extra_json field").
    pub fn extra_object(&self) -> serde_json::Value {
        match &self.extra {
            serde_json::Value::String(s) => {
                serde_json::from_str(s).unwrap_or(serde_json::Value::Null)
            }
            other => other.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    TokenCreated,
    TokenRugged,
    SolFlowEmitted,
    BundleAnalyzed,
    CartelEdgeEmitted,
    AlertDispatched,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::TokenCreated => "token_created",
            EventType::TokenRugged => "token_rugged",
            EventType::SolFlowEmitted => "sol_flow_emitted",
            EventType::BundleAnalyzed => "bundle_analyzed",
            EventType::CartelEdgeEmitted => "cartel_edge_emitted",
            EventType::AlertDispatched => "alert_dispatched",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "token_created" => EventType::TokenCreated,
            "token_rugged" => EventType::TokenRugged,
            "sol_flow_emitted" => EventType::SolFlowEmitted,
            "bundle_analyzed" => EventType::BundleAnalyzed,
            "cartel_edge_emitted" => EventType::CartelEdgeEmitted,
            "alert_dispatched" => EventType::AlertDispatched,
            _ => return None,
        })
    }
}

/// TTL cache row (SPEC_FULL.md §3 `CacheEntry`).
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub value: Vec<u8>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Telegram/bot alert subscription row (SPEC_FULL.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertSubscription {
    pub id: Option<i64>,
    pub chat_id: i64,
    pub sub_type: SubscriptionType,
    pub value: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionType {
    Deployer,
    Narrative,
}

impl SubscriptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionType::Deployer => "deployer",
            SubscriptionType::Narrative => "narrative",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "deployer" => SubscriptionType::Deployer,
            "narrative" => SubscriptionType::Narrative,
            _ => return None,
        })
    }
}

/// (fingerprint, wallet) row — candidates for the same human operator
/// (SPEC_FULL.md §3 `OperatorMapping`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorMapping {
    pub fingerprint: String,
    pub wallet: String,
    pub recorded_at: DateTime<Utc>,
}

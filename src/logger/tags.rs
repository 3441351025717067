/// Log tags for categorizing log messages by pipeline component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogTag {
    Rpc,
    MarketClient,
    CircuitBreaker,
    EventStore,
    Cache,
    WalletLabels,
    Similarity,
    Lineage,
    Bundle,
    SolFlow,
    Cartel,
    Derivations,
    Sweep,
    Config,
    System,
    Other(String),
}

impl LogTag {
    /// Key used for `--debug-<module>` / `--verbose-<module>` CLI flags.
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::Rpc => "rpc",
            LogTag::MarketClient => "market",
            LogTag::CircuitBreaker => "circuit_breaker",
            LogTag::EventStore => "events",
            LogTag::Cache => "cache",
            LogTag::WalletLabels => "wallet_labels",
            LogTag::Similarity => "similarity",
            LogTag::Lineage => "lineage",
            LogTag::Bundle => "bundle",
            LogTag::SolFlow => "sol_flow",
            LogTag::Cartel => "cartel",
            LogTag::Derivations => "derivations",
            LogTag::Sweep => "sweep",
            LogTag::Config => "config",
            LogTag::System => "system",
            LogTag::Other(s) => return s.to_lowercase(),
        }.to_string()
    }

    /// Clean (non-colored) tag label, written to the log file.
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::Rpc => "RPC",
            LogTag::MarketClient => "MARKET",
            LogTag::CircuitBreaker => "CIRCUIT",
            LogTag::EventStore => "EVENTS",
            LogTag::Cache => "CACHE",
            LogTag::WalletLabels => "LABELS",
            LogTag::Similarity => "SIMILARITY",
            LogTag::Lineage => "LINEAGE",
            LogTag::Bundle => "BUNDLE",
            LogTag::SolFlow => "SOLFLOW",
            LogTag::Cartel => "CARTEL",
            LogTag::Derivations => "DERIVE",
            LogTag::Sweep => "SWEEP",
            LogTag::Config => "CONFIG",
            LogTag::System => "SYSTEM",
            LogTag::Other(s) => return s.clone(),
        }.to_string()
    }
}

/// Structured error taxonomy for the forensic pipeline.
///
/// Mirrors the error-handling design: external-unavailable, stale/absent
/// data, timeout, parsing, and internal-invariant kinds all nest under
/// [`ForensicError`]. Library-boundary functions never leak this type —
/// they resolve to `Option<T>` per the best-effort propagation policy and
/// only use this enum internally for logging/diagnostics.
use chrono::{DateTime, Utc};

pub mod blockchain;
pub use blockchain::*;

#[derive(Debug, Clone)]
pub enum ForensicError {
    Blockchain(BlockchainError),
    Network(NetworkError),
    RpcProvider(RpcProviderError),
    Configuration(ConfigurationError),
    Data(DataError),
    RateLimit(RateLimitError),
}

impl std::fmt::Display for ForensicError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForensicError::Blockchain(e) => write!(f, "blockchain error: {}", e),
            ForensicError::Network(e) => write!(f, "network error: {}", e),
            ForensicError::RpcProvider(e) => write!(f, "rpc provider error: {}", e),
            ForensicError::Configuration(e) => write!(f, "configuration error: {}", e),
            ForensicError::Data(e) => write!(f, "data error: {}", e),
            ForensicError::RateLimit(e) => write!(f, "rate limit error: {}", e),
        }
    }
}

impl std::error::Error for ForensicError {}

#[derive(Debug, Clone)]
pub enum NetworkError {
    ConnectionTimeout { endpoint: String, timeout_ms: u64 },
    HttpStatusError { endpoint: String, status: u16, body: Option<String> },
    CircuitOpen { provider: String },
    Generic { message: String },
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkError::ConnectionTimeout { endpoint, timeout_ms } => {
                write!(f, "connection timeout to {} after {}ms", endpoint, timeout_ms)
            }
            NetworkError::HttpStatusError { endpoint, status, body } => write!(
                f,
                "HTTP {} from {}: {}",
                status,
                endpoint,
                body.as_deref().unwrap_or("no body")
            ),
            NetworkError::CircuitOpen { provider } => write!(f, "circuit open for {}", provider),
            NetworkError::Generic { message } => write!(f, "{}", message),
        }
    }
}

#[derive(Debug, Clone)]
pub enum RpcProviderError {
    ProviderDown { provider_name: String, since: DateTime<Utc> },
    MalformedResponse { provider_name: String, endpoint: String },
    RpcLevelError { method: String, message: String },
    Generic { provider_name: String, message: String },
}

impl std::fmt::Display for RpcProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RpcProviderError::ProviderDown { provider_name, since } => {
                write!(f, "provider {} down since {}", provider_name, since)
            }
            RpcProviderError::MalformedResponse { provider_name, endpoint } => {
                write!(f, "malformed response from {} at {}", provider_name, endpoint)
            }
            RpcProviderError::RpcLevelError { method, message } => {
                write!(f, "rpc error calling {}: {}", method, message)
            }
            RpcProviderError::Generic { provider_name, message } => {
                write!(f, "provider {} error: {}", provider_name, message)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum ConfigurationError {
    InvalidConfig { field: String, reason: String },
    MissingConfig { field: String },
    FileNotFound { path: String },
    Generic { message: String },
}

impl std::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationError::InvalidConfig { field, reason } => {
                write!(f, "invalid config field '{}': {}", field, reason)
            }
            ConfigurationError::MissingConfig { field } => write!(f, "missing config field '{}'", field),
            ConfigurationError::FileNotFound { path } => write!(f, "config file not found: {}", path),
            ConfigurationError::Generic { message } => write!(f, "{}", message),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DataError {
    ParseError { data_type: String, error: String },
    ValidationError { field: String, reason: String },
    InvalidFormat { expected: String, received: String },
    Generic { message: String },
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::ParseError { data_type, error } => write!(f, "failed to parse {}: {}", data_type, error),
            DataError::ValidationError { field, reason } => write!(f, "invalid {}: {}", field, reason),
            DataError::InvalidFormat { expected, received } => {
                write!(f, "expected {}, got {}", expected, received)
            }
            DataError::Generic { message } => write!(f, "{}", message),
        }
    }
}

#[derive(Debug, Clone)]
pub enum RateLimitError {
    ExceededLimit { limit_type: String },
    TemporaryThrottle { duration_seconds: u64 },
}

impl std::fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateLimitError::ExceededLimit { limit_type } => write!(f, "rate limit exceeded for {}", limit_type),
            RateLimitError::TemporaryThrottle { duration_seconds } => {
                write!(f, "throttled for {}s", duration_seconds)
            }
        }
    }
}

impl From<reqwest::Error> for ForensicError {
    fn from(err: reqwest::Error) -> Self {
        ForensicError::Network(NetworkError::Generic { message: err.to_string() })
    }
}

impl From<serde_json::Error> for ForensicError {
    fn from(err: serde_json::Error) -> Self {
        ForensicError::Data(DataError::ParseError {
            data_type: "json".to_string(),
            error: err.to_string(),
        })
    }
}

impl From<rusqlite::Error> for ForensicError {
    fn from(err: rusqlite::Error) -> Self {
        ForensicError::Data(DataError::Generic { message: format!("sqlite: {}", err) })
    }
}

impl ForensicError {
    pub fn network(message: impl Into<String>) -> Self {
        ForensicError::Network(NetworkError::Generic { message: message.into() })
    }

    pub fn rpc(provider_name: impl Into<String>, message: impl Into<String>) -> Self {
        ForensicError::RpcProvider(RpcProviderError::Generic {
            provider_name: provider_name.into(),
            message: message.into(),
        })
    }

    pub fn parse(data_type: impl Into<String>, error: impl Into<String>) -> Self {
        ForensicError::Data(DataError::ParseError { data_type: data_type.into(), error: error.into() })
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        ForensicError::Configuration(ConfigurationError::Generic { message: message.into() })
    }
}

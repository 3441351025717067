/// On-chain/transport-shape errors distinct from the generic RPC-provider
/// failure kinds — things that are valid RPC responses but invalid from a
/// forensic-parsing point of view.
#[derive(Debug, Clone)]
pub enum BlockchainError {
    InvalidAddress {
        address: String,
        reason: String,
    },
    TransactionNotFound {
        signature: String,
    },
    AccountKeysMismatch {
        signature: String,
        expected: usize,
        got: usize,
    },
    MissingBalanceArrays {
        signature: String,
    },
    Generic {
        message: String,
    },
}

impl std::fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockchainError::InvalidAddress { address, reason } => {
                write!(f, "invalid address '{}': {}", address, reason)
            }
            BlockchainError::TransactionNotFound { signature } => {
                write!(f, "transaction not found: {}", signature)
            }
            BlockchainError::AccountKeysMismatch { signature, expected, got } => write!(
                f,
                "account keys length mismatch in {}: expected {}, got {}",
                signature, expected, got
            ),
            BlockchainError::MissingBalanceArrays { signature } => {
                write!(f, "missing pre/post balance arrays in {}", signature)
            }
            BlockchainError::Generic { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for BlockchainError {}

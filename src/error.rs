//! Error types for deferred transactions and confirmation waits

use ethers::providers::ProviderError;
use ethers::types::{Address, H256};
use thiserror::Error;

/// Main error type for transaction and confirmation operations
#[derive(Error, Debug)]
pub enum TxError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The node rejected `eth_sendTransaction`
    #[error("Transaction send rejected: {0}")]
    Send(#[source] ProviderError),

    /// The node could not simulate the transaction
    #[error("Gas estimation error: {0}")]
    Estimation(#[source] ProviderError),

    #[error(
        "Contract code was not stored at {address:?} (tx {tx_hash:?}), \
         most likely because the transaction ran out of gas"
    )]
    ContractDeploymentFailed { address: Address, tx_hash: H256 },

    #[error("Receipt for tx {tx_hash:?} has no contract address")]
    NotContractCreation { tx_hash: H256 },

    #[error("Block filter error: {0}")]
    Subscription(#[source] ProviderError),

    #[error("Provider error: {0}")]
    Provider(#[source] ProviderError),

    #[error("Timeout waiting for {operation}")]
    Timeout { operation: String },

    #[error("Cancelled while waiting for {operation}")]
    Cancelled { operation: String },

    #[error("Invalid transaction option {key}: {message}")]
    InvalidOption { key: String, message: String },

    /// Raised by caller-supplied continuations and mapping functions
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TxError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, TxError::Timeout { .. } | TxError::Subscription(_))
    }
}

/// Result type for transaction operations
pub type TxResult<T> = Result<T, TxError>;

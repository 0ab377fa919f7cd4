//! Chain-specific types and error definitions.

use std::path::PathBuf;
use thiserror::Error;

// Lives with the rest of the configuration schema
pub use crate::config::schema::BlockchainConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// Credential file does not exist.
    #[error("Credential file not found: {}", path.display())]
    MissingCredential { path: PathBuf },

    /// A local file exists but could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Credential content is not a valid secp256k1 private key.
    #[error("Invalid private key format: {0}")]
    MalformedKey(String),

    /// Contract descriptor file does not exist.
    #[error("Contract descriptor not found: {}", path.display())]
    MissingDescriptor { path: PathBuf },

    /// Contract descriptor is not a JSON ABI.
    #[error("Malformed contract descriptor {}: {reason}", path.display())]
    MalformedDescriptor { path: PathBuf, reason: String },

    /// Call parameters do not fit the descriptor.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Signing the transaction failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// The node answered the broadcast with a JSON-RPC error.
    #[error("Submission failed: {0}")]
    Submission(String),

    /// The broadcast was sent but no answer came back; the node may have
    /// accepted it.
    #[error("Broadcast outcome unknown: {0}")]
    BroadcastUnknown(String),

    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Transaction was not confirmed within expected time.
    #[error("Transaction not confirmed after {0} blocks")]
    ConfirmationTimeout(u32),

    /// Gas price exceeded maximum allowed.
    #[error("Gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u64, max_gwei: u64 },

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Transaction confirmation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Transaction was broadcast; nobody waited for a receipt.
    Pending,
    /// Transaction is confirmed with required block depth.
    Confirmed { block_number: u64 },
    /// Transaction was mined but reverted.
    Failed(String),
}

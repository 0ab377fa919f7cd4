//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! key file       → wallet.rs (Credential: load, generate, sign)
//! ABI file       → abi.rs (ContractDescriptor)
//! call arguments → transaction.rs (TxBuilder → UnsignedEnvelope → SignedEnvelope)
//! signed bytes   → client.rs (chain checks, nonce, broadcast, confirmation)
//! ```
//!
//! # Security Constraints
//! - Never log private keys or the full RPC URL (hosted endpoints embed API keys)
//! - All RPC calls have configurable timeouts
//! - Signing and encoding are delegated to alloy

pub mod abi;
pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use abi::ContractDescriptor;
pub use client::BlockchainClient;
pub use transaction::{CallArgument, FeeSettings, SignedEnvelope, TxBuilder, UnsignedEnvelope};
pub use types::{BlockchainConfig, BlockchainError, BlockchainResult, ChainId, ConfirmationStatus};
pub use wallet::Credential;

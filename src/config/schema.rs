//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the submitter.
//! All types derive Serde traits for deserialization from config files.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::dca::types::DcaType;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SubmitterConfig {
    /// Endpoint, chain and fee settings.
    pub blockchain: BlockchainConfig,

    /// Target contract.
    pub contract: ContractConfig,

    /// Parameters of the DCA schedule to create.
    pub dca: DcaConfig,

    /// Where keys and the submission journal live.
    pub secrets: SecretsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Blockchain integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL. Usually supplied through `RPC_ENDPOINT`.
    pub rpc_url: String,

    /// Chain ID (e.g., 11155111 for Sepolia, 31337 for local Anvil).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Gas limit for the contract call.
    pub gas_limit: u64,

    /// Fixed gas price in gwei; 0 asks the node.
    pub gas_price_gwei: u64,

    /// Maximum node-quoted gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,

    /// Number of block confirmations required when waiting.
    pub confirmation_blocks: u32,

    /// How long `--wait` polls for a receipt, in seconds.
    pub confirmation_timeout_secs: u64,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            chain_id: 11155111,
            rpc_timeout_secs: 10,
            gas_limit: 300_000,
            gas_price_gwei: 30,
            max_gas_price_gwei: 500,
            confirmation_blocks: 1,
            confirmation_timeout_secs: 120,
        }
    }
}

/// Target contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Deployed DCA contract address.
    pub address: Option<Address>,

    /// JSON ABI (or compiler artifact) describing the contract.
    pub abi_path: PathBuf,

    /// Function to call.
    pub function: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            address: None,
            abi_path: PathBuf::from("DCAContract.json"),
            function: "createDCA".to_string(),
        }
    }
}

/// DCA schedule parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DcaConfig {
    /// Token bought or sold on each iteration.
    pub token: Option<Address>,

    /// Seconds between iterations.
    pub interval_secs: u64,

    /// Amount per iteration, in ether (decimal string).
    pub amount_ether: String,

    /// Buy or sell.
    pub dca_type: DcaType,

    /// Total number of iterations.
    pub total_iterations: u64,
}

impl Default for DcaConfig {
    fn default() -> Self {
        Self {
            token: None,
            interval_secs: 60,
            amount_ether: "0.0001".to_string(),
            dca_type: DcaType::Buy,
            total_iterations: 10,
        }
    }
}

/// Key and journal locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecretsConfig {
    /// File holding the operator's hex private key.
    pub key_file: PathBuf,

    /// Directory receiving `<address>_key.txt` deposit key files.
    pub deposit_key_dir: PathBuf,

    /// Submission journal; empty disables it.
    pub journal_path: PathBuf,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            key_file: PathBuf::from(".privateKey.txt"),
            deposit_key_dir: PathBuf::from("."),
            journal_path: PathBuf::from("dca-journal.json"),
        }
    }
}

impl SecretsConfig {
    /// Journal path, if journaling is enabled.
    pub fn journal(&self) -> Option<&std::path::Path> {
        if self.journal_path.as_os_str().is_empty() {
            None
        } else {
            Some(&self.journal_path)
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

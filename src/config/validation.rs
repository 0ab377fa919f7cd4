//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check required values are present (endpoint, contract, token)
//! - Validate value ranges (timeouts > 0, gas limit, iteration counts)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SubmitterConfig → Result<(), Vec<ValidationError>>
//! - Runs before any file is read or request made

use alloy::primitives::utils::parse_ether;
use alloy::primitives::U256;

use crate::config::schema::SubmitterConfig;

/// A single failed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted config key, e.g. `blockchain.rpc_url`.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Minimum gas for any transaction.
const MIN_GAS_LIMIT: u64 = 21_000;

pub fn validate_config(config: &SubmitterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let chain = &config.blockchain;

    if chain.rpc_url.trim().is_empty() {
        errors.push(ValidationError::new(
            "blockchain.rpc_url",
            "not set (use the config file or RPC_ENDPOINT)",
        ));
    } else if url::Url::parse(&chain.rpc_url).is_err() {
        errors.push(ValidationError::new("blockchain.rpc_url", "not a valid URL"));
    }

    if chain.chain_id == 0 {
        errors.push(ValidationError::new("blockchain.chain_id", "must be non-zero"));
    }
    if chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("blockchain.rpc_timeout_secs", "must be > 0"));
    }
    if chain.gas_limit < MIN_GAS_LIMIT {
        errors.push(ValidationError::new(
            "blockchain.gas_limit",
            format!("must be at least {}", MIN_GAS_LIMIT),
        ));
    }
    if chain.gas_price_gwei > chain.max_gas_price_gwei {
        errors.push(ValidationError::new(
            "blockchain.gas_price_gwei",
            format!("exceeds max_gas_price_gwei ({})", chain.max_gas_price_gwei),
        ));
    }

    if config.contract.address.is_none() {
        errors.push(ValidationError::new(
            "contract.address",
            "not set (use the config file or DCA_CONTRACT_ADDRESS)",
        ));
    }
    if config.contract.function.trim().is_empty() {
        errors.push(ValidationError::new("contract.function", "must not be empty"));
    }

    let dca = &config.dca;
    if dca.token.is_none() {
        errors.push(ValidationError::new("dca.token", "not set"));
    }
    if dca.interval_secs == 0 {
        errors.push(ValidationError::new("dca.interval_secs", "must be > 0"));
    }
    if dca.total_iterations == 0 {
        errors.push(ValidationError::new("dca.total_iterations", "must be > 0"));
    }
    match parse_ether(&dca.amount_ether) {
        Ok(amount) if amount == U256::ZERO => {
            errors.push(ValidationError::new("dca.amount_ether", "must be > 0"));
        }
        Ok(_) => {}
        Err(e) => {
            errors.push(ValidationError::new(
                "dca.amount_ether",
                format!("'{}' is not an ether amount: {}", dca.amount_ether, e),
            ));
        }
    }

    if config.secrets.key_file.as_os_str().is_empty() {
        errors.push(ValidationError::new("secrets.key_file", "must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! DCA schedule types.

use alloy::primitives::utils::parse_ether;
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::transaction::CallArgument;
use crate::config::schema::DcaConfig;

/// Direction of a DCA schedule. Encoded on-chain as its discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DcaType {
    #[default]
    Buy = 0,
    Sell = 1,
}

impl DcaType {
    pub fn discriminant(self) -> u8 {
        self as u8
    }
}

/// Configured schedule values that cannot become call arguments.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParameterError {
    #[error("dca.token is not set")]
    MissingToken,

    #[error("dca.amount_ether '{value}': {reason}")]
    InvalidAmount { value: String, reason: String },
}

/// Arguments of one `createDCA` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallParameters {
    pub token: Address,
    /// Seconds between iterations.
    pub interval: u64,
    /// Amount per iteration in wei.
    pub amount: U256,
    pub dca_type: DcaType,
    pub deposit_address: Address,
    pub total_iterations: u64,
}

impl CallParameters {
    /// Combine the configured schedule with a freshly generated deposit address.
    pub fn from_config(
        config: &DcaConfig,
        deposit_address: Address,
    ) -> Result<Self, ParameterError> {
        let token = config.token.ok_or(ParameterError::MissingToken)?;
        let amount =
            parse_ether(&config.amount_ether).map_err(|e| ParameterError::InvalidAmount {
                value: config.amount_ether.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            token,
            interval: config.interval_secs,
            amount,
            dca_type: config.dca_type,
            deposit_address,
            total_iterations: config.total_iterations,
        })
    }

    /// Arguments in canonical `createDCA` order, with the parameter names each
    /// one answers to.
    pub fn arguments(&self) -> Vec<CallArgument> {
        vec![
            CallArgument::new(&["token", "tokenaddress", "asset"], self.token),
            CallArgument::new(&["interval", "intervalseconds", "period"], self.interval),
            CallArgument::new(&["amount", "amountperinterval", "amountper"], self.amount),
            CallArgument::new(&["dcatype", "type", "side", "ordertype"], self.dca_type.discriminant()),
            CallArgument::new(&["depositaddress", "deposit", "depositor"], self.deposit_address),
            CallArgument::new(
                &["totaliterations", "iterations", "totalbuys", "totalexecutions"],
                self.total_iterations,
            ),
        ]
    }
}

//! Credential management and transaction signing.
//!
//! # Security
//! - Keys are never logged; `Debug` shows only the address
//! - Raw key material leaves this module only through [`Credential::private_key_hex`],
//!   which exists for key stores

use alloy::hex;
use alloy::network::TxSigner;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::blockchain::transaction::{SignedEnvelope, UnsignedEnvelope};
use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// A private key plus its derived address.
#[derive(Clone)]
pub struct Credential {
    signer: PrivateKeySigner,
}

impl Credential {
    /// Create a credential from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    pub fn from_private_key(private_key_hex: &str) -> BlockchainResult<Self> {
        let trimmed = private_key_hex.trim();
        let key_hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::MalformedKey(format!("{}", e)))?;

        Ok(Self { signer })
    }

    /// Load a credential from a file holding a single hex key.
    pub fn load(path: &Path) -> BlockchainResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => BlockchainError::MissingCredential {
                path: path.to_path_buf(),
            },
            _ => BlockchainError::FileAccess {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let credential = Self::from_private_key(&content)?;
        tracing::info!(
            address = %credential.address(),
            path = %path.display(),
            "Credential loaded"
        );
        Ok(credential)
    }

    /// Generate a fresh random credential.
    pub fn generate() -> Self {
        let signer = PrivateKeySigner::random();
        tracing::debug!(address = %signer.address(), "Generated new key pair");
        Self { signer }
    }

    /// Get the credential's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Lowercase hex of the private key, no `0x` prefix.
    ///
    /// Only key stores should call this.
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.signer.to_bytes())
    }

    /// Sign an unsigned envelope.
    pub async fn sign_transaction(
        &self,
        unsigned: UnsignedEnvelope,
    ) -> BlockchainResult<SignedEnvelope> {
        let mut tx = unsigned.into_inner();
        let signature = self
            .signer
            .sign_transaction(&mut tx)
            .await
            .map_err(|e| BlockchainError::Signing(e.to_string()))?;

        let signed = SignedEnvelope::new(tx, signature);
        tracing::debug!(
            address = %self.address(),
            tx_hash = %signed.tx_hash(),
            "Transaction signed"
        );
        Ok(signed)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("address", &self.address())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

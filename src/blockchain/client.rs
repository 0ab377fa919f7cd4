//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to the JSON-RPC endpoint
//! - Query chain state (chain id, nonce, gas price, receipts)
//! - Broadcast signed transactions, exactly once per call
//! - Bound every request by the configured timeout

use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionReceipt;
use alloy::transports::{RpcError, TransportResult};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::blockchain::transaction::SignedEnvelope;
use crate::blockchain::types::{
    BlockchainConfig, BlockchainError, BlockchainResult, ChainId, ConfirmationStatus,
};

/// Blockchain RPC client wrapper.
#[derive(Clone)]
pub struct BlockchainClient {
    provider: Arc<dyn Provider + Send + Sync>,
    config: BlockchainConfig,
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new blockchain client.
    ///
    /// No request is made until the first query.
    pub fn new(config: BlockchainConfig) -> BlockchainResult<Self> {
        let url: url::Url = config.rpc_url.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", redact_url(&config.rpc_url), e))
        })?;
        let provider = Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>;

        tracing::debug!(
            rpc_url = %redact_url(&config.rpc_url),
            chain_id = config.chain_id,
            "Blockchain client created"
        );

        Ok(Self {
            provider,
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
            config,
        })
    }

    async fn call<T, F>(&self, method: &'static str, request: F) -> BlockchainResult<T>
    where
        F: IntoFuture<Output = TransportResult<T>>,
    {
        match timeout(self.timeout_duration, request).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                tracing::warn!(method = method, error = %e, "RPC error");
                Err(BlockchainError::Rpc(format!("{}: {}", method, e)))
            }
            Err(_) => {
                tracing::warn!(method = method, "RPC timeout");
                Err(BlockchainError::Timeout(self.config.rpc_timeout_secs))
            }
        }
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> BlockchainResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.config.chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: self.config.chain_id,
                actual: chain_id.0,
            });
        }
        tracing::info!(chain_id = chain_id.0, "Connected to expected chain");
        Ok(())
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> BlockchainResult<ChainId> {
        self.call("eth_chainId", self.provider.get_chain_id())
            .await
            .map(ChainId)
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> BlockchainResult<u64> {
        self.call("eth_blockNumber", self.provider.get_block_number())
            .await
    }

    /// Get the transaction count (nonce) for an address.
    pub async fn get_transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        self.call(
            "eth_getTransactionCount",
            self.provider.get_transaction_count(address),
        )
        .await
    }

    /// Get current gas price in wei.
    pub async fn get_gas_price(&self) -> BlockchainResult<u128> {
        self.call("eth_gasPrice", self.provider.get_gas_price())
            .await
    }

    /// Get a transaction receipt by hash.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> BlockchainResult<Option<TransactionReceipt>> {
        self.call(
            "eth_getTransactionReceipt",
            self.provider.get_transaction_receipt(tx_hash),
        )
        .await
    }

    /// Resolve the gas price to use, in wei.
    ///
    /// A configured price wins; otherwise the node is asked and the answer is
    /// checked against `max_gas_price_gwei`.
    pub async fn resolve_gas_price(&self) -> BlockchainResult<u128> {
        if self.config.gas_price_gwei > 0 {
            return Ok(u128::from(self.config.gas_price_gwei) * 1_000_000_000);
        }

        let gas_price = self.get_gas_price().await?;
        let gas_price_gwei = gas_price / 1_000_000_000;
        if gas_price_gwei > u128::from(self.config.max_gas_price_gwei) {
            return Err(BlockchainError::GasPriceTooHigh {
                current_gwei: gas_price_gwei as u64,
                max_gwei: self.config.max_gas_price_gwei,
            });
        }
        Ok(gas_price)
    }

    /// Broadcast a signed transaction.
    ///
    /// A single `eth_sendRawTransaction`. Only a JSON-RPC error response is a
    /// rejection ([`BlockchainError::Submission`], message verbatim). Transport
    /// failures give [`BlockchainError::BroadcastUnknown`] and a timeout gives
    /// [`BlockchainError::Timeout`]: in both cases the node may have accepted it.
    pub async fn submit(&self, envelope: &SignedEnvelope) -> BlockchainResult<TxHash> {
        let raw = envelope.raw();
        match timeout(self.timeout_duration, self.provider.send_raw_transaction(&raw)).await {
            Ok(Ok(pending)) => {
                let tx_hash = *pending.tx_hash();
                if tx_hash != envelope.tx_hash() {
                    tracing::warn!(
                        expected = %envelope.tx_hash(),
                        returned = %tx_hash,
                        "Node returned an unexpected transaction hash"
                    );
                }
                tracing::info!(tx_hash = %tx_hash, nonce = envelope.nonce(), "Transaction broadcast");
                Ok(tx_hash)
            }
            Ok(Err(e @ RpcError::ErrorResp(_))) => {
                tracing::error!(error = %e, "Transaction rejected");
                Err(BlockchainError::Submission(e.to_string()))
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    tx_hash = %envelope.tx_hash(),
                    error = %e,
                    "Broadcast failed without a node answer"
                );
                Err(BlockchainError::BroadcastUnknown(e.to_string()))
            }
            Err(_) => {
                tracing::warn!(tx_hash = %envelope.tx_hash(), "Broadcast timed out");
                Err(BlockchainError::Timeout(self.config.rpc_timeout_secs))
            }
        }
    }

    /// Wait for a transaction to be confirmed.
    ///
    /// # Arguments
    /// * `tx_hash` - Transaction hash to monitor
    /// * `timeout_secs` - Maximum time to wait for confirmation
    pub async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        timeout_secs: u64,
    ) -> BlockchainResult<ConfirmationStatus> {
        let required_confirmations = self.config.confirmation_blocks;
        let timeout_duration = Duration::from_secs(timeout_secs);
        let poll_interval = Duration::from_secs(2);

        let result = timeout(timeout_duration, async {
            let mut ticker = interval(poll_interval);

            loop {
                ticker.tick().await;

                let receipt = match self.get_transaction_receipt(tx_hash).await? {
                    Some(r) => r,
                    None => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                };

                if !receipt.status() {
                    return Ok(ConfirmationStatus::Failed(
                        "Transaction reverted".to_string(),
                    ));
                }

                let current_block = self.get_block_number().await?;
                let tx_block = receipt.block_number.unwrap_or(current_block);
                // The inclusion block counts as the first confirmation
                let confirmations = current_block.saturating_sub(tx_block) as u32 + 1;

                if confirmations >= required_confirmations {
                    return Ok(ConfirmationStatus::Confirmed {
                        block_number: tx_block,
                    });
                }

                tracing::debug!(
                    tx_hash = %tx_hash,
                    confirmations = confirmations,
                    required = required_confirmations,
                    "Waiting for confirmations"
                );
            }
        })
        .await;

        match result {
            Ok(status) => status,
            Err(_) => Err(BlockchainError::ConfirmationTimeout(required_confirmations)),
        }
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &redact_url(&self.config.rpc_url))
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

/// Strip the path and query from an endpoint URL for logging.
///
/// Hosted providers carry the API key in the path.
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(url) => match url.host_str() {
            Some(host) => format!("{}://{}/…", url.scheme(), host),
            None => "<redacted>".to_string(),
        },
        Err(_) => "<invalid url>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> BlockchainConfig {
        BlockchainConfig {
            // Nothing listens on port 1
            rpc_url: "http://127.0.0.1:1".to_string(),
            chain_id: 31337, // Anvil default
            rpc_timeout_secs: 5,
            ..BlockchainConfig::default()
        }
    }

    #[test]
    fn test_client_creation_makes_no_request() {
        assert!(BlockchainClient::new(test_config()).is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let config = BlockchainConfig {
            rpc_url: "not a url".to_string(),
            ..test_config()
        };
        let err = BlockchainClient::new(config).unwrap_err();
        assert!(err.to_string().contains("Invalid RPC URL"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let client = BlockchainClient::new(test_config()).unwrap();
        let result = client.get_chain_id().await;
        assert!(matches!(result, Err(BlockchainError::Rpc(_))));
        assert!(result.unwrap_err().to_string().contains("eth_chainId"));
    }

    #[tokio::test]
    async fn test_configured_gas_price_needs_no_rpc() {
        let config = BlockchainConfig {
            gas_price_gwei: 30,
            ..test_config()
        };
        let client = BlockchainClient::new(config).unwrap();
        assert_eq!(client.resolve_gas_price().await.unwrap(), 30_000_000_000);
    }

    #[test]
    fn test_redact_url_hides_api_key() {
        let redacted = redact_url("https://eth-sepolia.g.alchemy.com/v2/secret-api-key");
        assert_eq!(redacted, "https://eth-sepolia.g.alchemy.com/…");
        assert!(!redacted.contains("secret"));
    }
}

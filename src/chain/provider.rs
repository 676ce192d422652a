//! The node operations this crate relies on, and their JSON-RPC implementation

use crate::config::ProviderConfig;
use crate::error::{TxError, TxResult};
use crate::tx::TxOptions;

use async_trait::async_trait;
use ethers::providers::{Http, JsonRpcClient, Provider, ProviderError, Ws};
use ethers::types::{Address, Bytes, TransactionReceipt, H256, U256};
#[cfg(test)]
use mockall::automock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Shared handle to a node, handed to continuations and mapping functions
pub type DynProvider = Arc<dyn RpcProvider>;

/// A JSON-RPC capable Ethereum node.
///
/// Every method corresponds to exactly one RPC call. Implementations must not
/// retry or reinterpret errors; callers decide which errors are fatal.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RpcProvider: Send + Sync {
    /// `eth_sendTransaction`, returning the transaction hash
    async fn send_transaction(&self, tx: &TxOptions) -> Result<H256, ProviderError>;

    /// `eth_estimateGas`
    async fn estimate_gas(&self, tx: &TxOptions) -> Result<U256, ProviderError>;

    /// `eth_newBlockFilter`, returning the filter id
    async fn new_block_filter(&self) -> Result<U256, ProviderError>;

    /// `eth_getFilterChanges` for a block filter: hashes of blocks since the last poll
    async fn get_filter_changes(&self, filter_id: U256) -> Result<Vec<H256>, ProviderError>;

    /// `eth_uninstallFilter`
    async fn uninstall_filter(&self, filter_id: U256) -> Result<bool, ProviderError>;

    /// `eth_getTransactionReceipt`; `None` while the transaction is pending
    async fn get_transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> Result<Option<TransactionReceipt>, ProviderError>;

    /// `eth_getCode` at the latest block; empty when no code is stored
    async fn get_code(&self, address: Address) -> Result<Bytes, ProviderError>;
}

#[async_trait]
impl<P: JsonRpcClient> RpcProvider for Provider<P> {
    async fn send_transaction(&self, tx: &TxOptions) -> Result<H256, ProviderError> {
        self.request("eth_sendTransaction", [tx]).await
    }

    async fn estimate_gas(&self, tx: &TxOptions) -> Result<U256, ProviderError> {
        self.request("eth_estimateGas", [tx]).await
    }

    async fn new_block_filter(&self) -> Result<U256, ProviderError> {
        self.request("eth_newBlockFilter", ()).await
    }

    async fn get_filter_changes(&self, filter_id: U256) -> Result<Vec<H256>, ProviderError> {
        self.request("eth_getFilterChanges", [filter_id]).await
    }

    async fn uninstall_filter(&self, filter_id: U256) -> Result<bool, ProviderError> {
        self.request("eth_uninstallFilter", [filter_id]).await
    }

    async fn get_transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> Result<Option<TransactionReceipt>, ProviderError> {
        self.request("eth_getTransactionReceipt", [tx_hash]).await
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, ProviderError> {
        self.request("eth_getCode", (address, "latest")).await
    }
}

/// Connect to the configured node, preferring WebSocket when a URL is given
pub async fn connect(config: &ProviderConfig) -> TxResult<DynProvider> {
    if let Some(ref ws_url) = config.ws_url {
        let provider = Provider::<Ws>::connect(ws_url.as_str())
            .await
            .map_err(|e| TxError::Config(format!("WebSocket connection failed: {}", e)))?;
        info!("WebSocket connected to {}", ws_url);
        return Ok(Arc::new(provider));
    }

    let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
        .map_err(|e| TxError::Config(format!("Invalid RPC URL {}: {}", config.rpc_url, e)))?
        .interval(Duration::from_millis(100));
    debug!("Using HTTP provider {}", config.rpc_url);

    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_options, STUB_TX_HASH};
    use ethers::providers::MockProvider;
    use serde_json::json;

    fn mock_node() -> (Provider<MockProvider>, MockProvider) {
        Provider::mocked()
    }

    #[tokio::test]
    async fn test_estimate_gas_sends_options_as_sole_param() {
        let (provider, mock) = mock_node();
        mock.push(U256::from(21_000u64)).unwrap();

        let gas = RpcProvider::estimate_gas(&provider, &sample_options())
            .await
            .unwrap();

        assert_eq!(gas, U256::from(21_000u64));
        mock.assert_request("eth_estimateGas", [sample_options()])
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_transaction_returns_hash() {
        let (provider, mock) = mock_node();
        mock.push(STUB_TX_HASH).unwrap();

        let tx_hash = RpcProvider::send_transaction(&provider, &sample_options())
            .await
            .unwrap();

        assert_eq!(tx_hash, STUB_TX_HASH);
        mock.assert_request("eth_sendTransaction", [sample_options()])
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_code_decodes_to_empty_bytes() {
        let (provider, mock) = mock_node();
        mock.push(json!("0x")).unwrap();

        let code = RpcProvider::get_code(&provider, Address::zero()).await.unwrap();

        assert!(code.is_empty());
        mock.assert_request("eth_getCode", (Address::zero(), "latest"))
            .unwrap();
    }

    #[tokio::test]
    async fn test_pending_receipt_is_none() {
        let (provider, mock) = mock_node();
        mock.push(json!(null)).unwrap();

        let receipt = RpcProvider::get_transaction_receipt(&provider, STUB_TX_HASH)
            .await
            .unwrap();

        assert!(receipt.is_none());
    }
}

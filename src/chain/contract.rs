//! Waiting for a contract deployment
//!
//! A mined contract-creation transaction always carries a contract address in
//! its receipt, even when the deployment ran out of gas. Only the presence of
//! code at that address proves the contract was actually stored.

use super::receipt::{ReceiptWaiter, WaitParams};
use super::RpcProvider;
use crate::error::{TxError, TxResult};

use ethers::types::{Address, H256};
use futures::future;
use std::future::Future;
use tracing::{info, warn};

/// Waits for a contract-creation transaction and verifies the stored code
pub struct ContractWaiter<'a, P: ?Sized> {
    receipts: ReceiptWaiter<'a, P>,
}

impl<'a, P: RpcProvider + ?Sized> ContractWaiter<'a, P> {
    pub fn new(provider: &'a P, tx_hash: H256) -> Self {
        Self {
            receipts: ReceiptWaiter::new(provider, tx_hash),
        }
    }

    pub fn with_params(self, params: WaitParams) -> Self {
        Self {
            receipts: self.receipts.with_params(params),
        }
    }

    /// Resolve to the deployed contract's address
    pub async fn wait(self) -> TxResult<Address> {
        self.wait_until(future::pending()).await
    }

    /// Like [`ContractWaiter::wait`], but give up with [`TxError::Cancelled`]
    /// if `cancel` completes before the transaction is mined
    pub async fn wait_until<C>(self, cancel: C) -> TxResult<Address>
    where
        C: Future<Output = ()>,
    {
        let tx_hash = self.receipts.tx_hash();
        let provider = self.receipts.provider();
        let receipt = self.receipts.wait_until(cancel).await?;

        let address = receipt
            .contract_address
            .ok_or(TxError::NotContractCreation { tx_hash })?;

        let code = provider
            .get_code(address)
            .await
            .map_err(TxError::Provider)?;

        if code.is_empty() {
            warn!("No code stored at {:?} after deployment {:?}", address, tx_hash);
            crate::metrics::record_contract_deployment(false);
            return Err(TxError::ContractDeploymentFailed { address, tx_hash });
        }

        info!("Contract deployed at {:?} ({} bytes)", address, code.len());
        crate::metrics::record_contract_deployment(true);
        Ok(address)
    }
}

/// Wait for the contract created by `tx_hash` with default parameters
pub async fn wait_for_contract<P: RpcProvider + ?Sized>(
    tx_hash: H256,
    provider: &P,
) -> TxResult<Address> {
    ContractWaiter::new(provider, tx_hash).wait().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockRpcProvider;
    use crate::testing::{provider_error, receipt, STUB_TX_HASH};
    use ethers::types::{Bytes, H160, U256};
    use mockall::predicate::eq;
    use tokio_test::{assert_err, assert_ok};

    const CONTRACT: Address = H160([0xc0; 20]);

    /// A node where `STUB_TX_HASH` is already mined with `contract_address`
    fn mined_deployment(contract_address: Option<Address>) -> MockRpcProvider {
        let mut provider = MockRpcProvider::new();
        provider
            .expect_new_block_filter()
            .times(1)
            .returning(|| Ok(U256::one()));
        provider
            .expect_get_filter_changes()
            .returning(|_| Ok(Vec::new()));
        provider
            .expect_get_transaction_receipt()
            .with(eq(STUB_TX_HASH))
            .returning(move |hash| {
                let mut mined = receipt(hash, 5);
                mined.contract_address = contract_address;
                Ok(Some(mined))
            });
        provider
            .expect_uninstall_filter()
            .times(1)
            .returning(|_| Ok(true));
        provider
    }

    #[tokio::test]
    async fn test_resolves_to_address_with_code() {
        let mut provider = mined_deployment(Some(CONTRACT));
        provider
            .expect_get_code()
            .with(eq(CONTRACT))
            .times(1)
            .returning(|_| Ok(Bytes::from(vec![0x60, 0x80, 0x60, 0x40])));

        let address = assert_ok!(wait_for_contract(STUB_TX_HASH, &provider).await);
        assert_eq!(address, CONTRACT);
    }

    #[tokio::test]
    async fn test_empty_code_is_failed_deployment() {
        let mut provider = mined_deployment(Some(CONTRACT));
        provider
            .expect_get_code()
            .with(eq(CONTRACT))
            .times(1)
            .returning(|_| Ok(Bytes::default()));

        let err = assert_err!(wait_for_contract(STUB_TX_HASH, &provider).await);
        match err {
            TxError::ContractDeploymentFailed { address, tx_hash } => {
                assert_eq!(address, CONTRACT);
                assert_eq!(tx_hash, STUB_TX_HASH);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_receipt_without_contract_address() {
        let provider = mined_deployment(None);

        let err = assert_err!(wait_for_contract(STUB_TX_HASH, &provider).await);
        assert!(matches!(err, TxError::NotContractCreation { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_before_mined() {
        let mut provider = MockRpcProvider::new();
        provider
            .expect_new_block_filter()
            .times(1)
            .returning(|| Ok(U256::one()));
        provider
            .expect_get_filter_changes()
            .returning(|_| Ok(Vec::new()));
        provider
            .expect_get_transaction_receipt()
            .returning(|_| Ok(None));
        provider
            .expect_uninstall_filter()
            .times(1)
            .returning(|_| Ok(true));

        let err = assert_err!(
            ContractWaiter::new(&provider, STUB_TX_HASH)
                .wait_until(future::ready(()))
                .await
        );
        assert!(matches!(err, TxError::Cancelled { .. }));
    }

    #[tokio::test]
    async fn test_get_code_error_propagates() {
        let mut provider = mined_deployment(Some(CONTRACT));
        provider
            .expect_get_code()
            .times(1)
            .returning(|_| Err(provider_error("header not found")));

        let err = assert_err!(wait_for_contract(STUB_TX_HASH, &provider).await);
        assert!(matches!(err, TxError::Provider(_)));
    }
}

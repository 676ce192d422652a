//! Gas resolution for transactions that don't carry a gas limit

use super::TxOptions;
use crate::chain::RpcProvider;
use crate::error::{TxError, TxResult};

use ethers::types::U256;
use tracing::debug;

/// Gas estimator for transactions
///
/// Holds the optional expected-gas hint. When the hint is set the quickest
/// estimate skips the `eth_estimateGas` round trip entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GasEstimator {
    expected_gas: Option<U256>,
}

impl GasEstimator {
    /// Create a gas estimator that always asks the node
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a gas estimator that trusts `expected_gas`
    pub fn with_expected_gas(expected_gas: U256) -> Self {
        Self {
            expected_gas: Some(expected_gas),
        }
    }

    pub fn expected_gas(&self) -> Option<U256> {
        self.expected_gas
    }

    /// Dry-run `options` on the node
    pub async fn estimate(&self, provider: &dyn RpcProvider, options: &TxOptions) -> TxResult<U256> {
        let gas = provider
            .estimate_gas(options)
            .await
            .map_err(TxError::Estimation)?;

        debug!("Node estimated {} gas", gas);
        crate::metrics::record_gas_estimate("node");
        Ok(gas)
    }

    /// The expected gas if known, otherwise a node estimate
    pub async fn quickest(&self, provider: &dyn RpcProvider, options: &TxOptions) -> TxResult<U256> {
        match self.expected_gas {
            Some(gas) => {
                debug!("Using expected gas {}", gas);
                crate::metrics::record_gas_estimate("expected");
                Ok(gas)
            }
            None => self.estimate(provider, options).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockRpcProvider;
    use crate::testing::{provider_error, sample_options, GAS_ESTIMATE};
    use mockall::predicate::eq;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_estimate_passes_options_verbatim() {
        let mut provider = MockRpcProvider::new();
        provider
            .expect_estimate_gas()
            .with(eq(sample_options()))
            .times(1)
            .returning(|_| Ok(U256::from(GAS_ESTIMATE)));

        let gas = assert_ok!(GasEstimator::new().estimate(&provider, &sample_options()).await);
        assert_eq!(gas, U256::from(GAS_ESTIMATE));
    }

    #[tokio::test]
    async fn test_quickest_skips_node_with_expected_gas() {
        // no expectations: any provider call fails the test
        let provider = MockRpcProvider::new();
        let estimator = GasEstimator::with_expected_gas(U256::from(50_000));

        let gas = assert_ok!(estimator.quickest(&provider, &sample_options()).await);
        assert_eq!(gas, U256::from(50_000));
    }

    #[tokio::test]
    async fn test_estimation_error_propagates() {
        let mut provider = MockRpcProvider::new();
        provider
            .expect_estimate_gas()
            .times(1)
            .returning(|_| Err(provider_error("execution reverted")));

        let err = assert_err!(GasEstimator::new().quickest(&provider, &sample_options()).await);
        assert!(matches!(err, TxError::Estimation(_)));
    }
}

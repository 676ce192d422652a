//! Deferred, composable transaction computations
//!
//! A [`Transaction`] describes a transaction without sending it. Callers can
//! chain post-processing onto its eventual result with [`Transaction::map`] and
//! [`Transaction::then`] while the pipeline can still be gas-estimated, since
//! every stage keeps the options of the underlying send.

use super::gas::GasEstimator;
use super::TxOptions;
use crate::chain::{DynProvider, RpcProvider};
use crate::error::{TxError, TxResult};

use ethers::types::{H256, U256};
use futures::future::{self, BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::info;

/// A custom way of executing a transaction
pub trait Continuation<T>: Send + Sync {
    fn run<'a>(
        &'a self,
        provider: &'a DynProvider,
        overrides: TxOptions,
    ) -> BoxFuture<'a, TxResult<T>>;
}

/// How `transact` produces its result
enum Execution<T> {
    /// Resolve gas, send, yield the hash. `cast` is the identity on `H256`;
    /// it exists so the variant can live in `Transaction<T>`.
    DefaultSend { cast: fn(H256) -> T },
    CustomContinuation(Arc<dyn Continuation<T>>),
}

/// A transaction-dependent computation. Immutable; composition builds new values.
pub struct Transaction<T = H256> {
    options: TxOptions,
    gas: GasEstimator,
    execution: Execution<T>,
}

impl Transaction<H256> {
    /// A transaction whose result is the hash of the sent transaction
    pub fn new(options: TxOptions) -> Self {
        Self {
            options,
            gas: GasEstimator::new(),
            execution: Execution::DefaultSend {
                cast: std::convert::identity,
            },
        }
    }
}

impl<T: Send + 'static> Transaction<T> {
    /// A transaction whose `transact` runs `f` instead of sending.
    ///
    /// `f` owns all send logic, including gas resolution.
    pub fn with_continuation<F, Fut>(options: TxOptions, f: F) -> Self
    where
        F: Fn(DynProvider, TxOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TxResult<T>> + Send + 'static,
    {
        Self {
            options,
            gas: GasEstimator::new(),
            execution: Execution::CustomContinuation(Arc::new(FnContinuation(f))),
        }
    }

    /// Skip `eth_estimateGas` and assume `expected_gas` instead
    pub fn with_expected_gas(self, expected_gas: U256) -> Self {
        Self {
            gas: GasEstimator::with_expected_gas(expected_gas),
            ..self
        }
    }

    pub fn options(&self) -> &TxOptions {
        &self.options
    }

    pub fn expected_gas(&self) -> Option<U256> {
        self.gas.expected_gas()
    }

    /// Whether `transact` performs the default send
    pub fn is_default_send(&self) -> bool {
        matches!(self.execution, Execution::DefaultSend { .. })
    }

    /// Run the computation without overrides
    pub async fn transact(&self, provider: &DynProvider) -> TxResult<T> {
        self.transact_with(provider, TxOptions::new()).await
    }

    /// Run the computation, applying `overrides` on top of the stored options
    pub async fn transact_with(&self, provider: &DynProvider, overrides: TxOptions) -> TxResult<T> {
        match &self.execution {
            Execution::CustomContinuation(continuation) => {
                continuation.run(provider, overrides).await
            }
            Execution::DefaultSend { cast } => self
                .send(provider.as_ref(), &overrides)
                .await
                .map(*cast),
        }
    }

    async fn send(&self, provider: &dyn RpcProvider, overrides: &TxOptions) -> TxResult<H256> {
        // Caller-supplied gas is sent as given; only an estimate is encoded here
        let mut request = self.options.merged(overrides);
        let gas = match overrides.gas_limit()? {
            Some(gas) => gas,
            None => match self.options.gas_limit()? {
                Some(gas) => gas,
                None => {
                    let estimate = self.quickest_gas_estimate(provider).await?;
                    request = request.gas(estimate);
                    estimate
                }
            },
        };

        let tx_hash = provider
            .send_transaction(&request)
            .await
            .map_err(TxError::Send)?;

        info!("Transaction sent: {:?} (gas {})", tx_hash, gas);
        crate::metrics::record_tx_sent();
        Ok(tx_hash)
    }

    /// Dry-run the stored options, ignoring any overrides
    pub async fn estimate_gas(&self, provider: &dyn RpcProvider) -> TxResult<U256> {
        self.gas.estimate(provider, &self.options).await
    }

    /// `expected_gas` when set, otherwise [`Transaction::estimate_gas`]
    pub async fn quickest_gas_estimate(&self, provider: &dyn RpcProvider) -> TxResult<U256> {
        self.gas.quickest(provider, &self.options).await
    }

    /// Chain an asynchronous, fallible step onto the result.
    ///
    /// `f` receives this stage's result and the provider passed to `transact`.
    pub fn then<U, F, Fut>(&self, f: F) -> Transaction<U>
    where
        U: Send + 'static,
        F: Fn(T, DynProvider) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TxResult<U>> + Send + 'static,
    {
        Transaction {
            options: self.options.clone(),
            gas: self.gas,
            execution: Execution::CustomContinuation(Arc::new(Mapped {
                source: self.clone(),
                f,
            })),
        }
    }

    /// Chain a synchronous step onto the result
    pub fn map<U, F>(&self, f: F) -> Transaction<U>
    where
        U: Send + 'static,
        F: Fn(T, &DynProvider) -> U + Send + Sync + 'static,
    {
        self.then(move |value, provider| future::ready(Ok(f(value, &provider))))
    }
}

impl<T> Clone for Transaction<T> {
    fn clone(&self) -> Self {
        let execution = match &self.execution {
            Execution::DefaultSend { cast } => Execution::DefaultSend { cast: *cast },
            Execution::CustomContinuation(c) => Execution::CustomContinuation(Arc::clone(c)),
        };
        Self {
            options: self.options.clone(),
            gas: self.gas,
            execution,
        }
    }
}

impl<T> fmt::Debug for Transaction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let execution = match self.execution {
            Execution::DefaultSend { .. } => "DefaultSend",
            Execution::CustomContinuation(_) => "CustomContinuation",
        };
        f.debug_struct("Transaction")
            .field("options", &self.options)
            .field("expected_gas", &self.gas.expected_gas())
            .field("execution", &execution)
            .finish()
    }
}

struct FnContinuation<F>(F);

impl<T, F, Fut> Continuation<T> for FnContinuation<F>
where
    F: Fn(DynProvider, TxOptions) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TxResult<T>> + Send + 'static,
{
    fn run<'a>(
        &'a self,
        provider: &'a DynProvider,
        overrides: TxOptions,
    ) -> BoxFuture<'a, TxResult<T>> {
        (self.0)(Arc::clone(provider), overrides).boxed()
    }
}

/// A stage applying `f` to the result of `source`
struct Mapped<S, F> {
    source: Transaction<S>,
    f: F,
}

impl<S, T, F, Fut> Continuation<T> for Mapped<S, F>
where
    S: Send + 'static,
    T: Send + 'static,
    F: Fn(S, DynProvider) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TxResult<T>> + Send + 'static,
{
    fn run<'a>(
        &'a self,
        provider: &'a DynProvider,
        overrides: TxOptions,
    ) -> BoxFuture<'a, TxResult<T>> {
        async move {
            let value = self.source.transact_with(provider, overrides).await?;
            (self.f)(value, Arc::clone(provider)).await
        }
        .boxed()
    }
}

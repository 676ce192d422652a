//! Waiting for a transaction to be mined
//!
//! A wait installs a block filter and then races two paths to the receipt:
//! - an immediate `eth_getTransactionReceipt`, for transactions mined before
//!   the filter existed
//! - a check after every poll of the filter that reports new blocks or fails
//!
//! The first receipt observed wins. Later observations are discarded, and the
//! filter is uninstalled exactly once when the wait ends.

use super::RpcProvider;
use crate::error::{TxError, TxResult};

use ethers::types::{TransactionReceipt, H256, U256};
use futures::future::{self, Either};
use std::future::Future;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Interval between `eth_getFilterChanges` polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Parameters of a receipt wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitParams {
    /// Interval between polls of the block filter
    pub poll_interval: Duration,
    /// Give up after this long. `None` waits for as long as it takes.
    pub timeout: Option<Duration>,
}

impl WaitParams {
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    pub fn with_poll_interval(self, poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..self
        }
    }
}

impl Default for WaitParams {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

/// What caused a receipt check
#[derive(Debug, Clone, Copy)]
enum Trigger {
    Immediate,
    NewBlock,
}

impl Trigger {
    fn label(self) -> &'static str {
        match self {
            Trigger::Immediate => "immediate",
            Trigger::NewBlock => "block",
        }
    }
}

/// Waits for the receipt of a single transaction
pub struct ReceiptWaiter<'a, P: ?Sized> {
    provider: &'a P,
    tx_hash: H256,
    params: WaitParams,
    /// One-shot completion latch; only the first observed receipt is kept
    receipt: OnceLock<TransactionReceipt>,
}

impl<'a, P: RpcProvider + ?Sized> ReceiptWaiter<'a, P> {
    pub fn new(provider: &'a P, tx_hash: H256) -> Self {
        Self {
            provider,
            tx_hash,
            params: WaitParams::default(),
            receipt: OnceLock::new(),
        }
    }

    pub fn with_params(self, params: WaitParams) -> Self {
        Self { params, ..self }
    }

    pub fn tx_hash(&self) -> H256 {
        self.tx_hash
    }

    pub fn provider(&self) -> &'a P {
        self.provider
    }

    /// Resolve to the receipt once the transaction is mined
    pub async fn wait(self) -> TxResult<TransactionReceipt> {
        self.wait_until(future::pending()).await
    }

    /// Like [`ReceiptWaiter::wait`], but give up with [`TxError::Cancelled`]
    /// once `cancel` completes. The block filter is uninstalled either way.
    pub async fn wait_until<C>(self, cancel: C) -> TxResult<TransactionReceipt>
    where
        C: Future<Output = ()>,
    {
        info!("Waiting for transaction {:?} to be mined...", self.tx_hash);
        let started = Instant::now();

        let filter_id = self
            .provider
            .new_block_filter()
            .await
            .map_err(TxError::Subscription)?;
        debug!("Installed block filter {} for {:?}", filter_id, self.tx_hash);

        let bounded = async {
            match self.params.timeout {
                Some(limit) => {
                    if tokio::time::timeout(limit, self.race(filter_id)).await.is_err() {
                        warn!(
                            "Gave up waiting for {:?} after {:?}",
                            self.tx_hash,
                            started.elapsed()
                        );
                    }
                }
                None => self.race(filter_id).await,
            }
        };

        let cancelled = match future::select(Box::pin(bounded), Box::pin(cancel)).await {
            Either::Left(_) => false,
            Either::Right(_) => {
                warn!("Stopped waiting for {:?}", self.tx_hash);
                true
            }
        };

        self.teardown(filter_id).await;

        let operation = format!("receipt of {:?}", self.tx_hash);
        match self.receipt.into_inner() {
            Some(receipt) => {
                crate::metrics::record_receipt_wait(started.elapsed().as_secs_f64());
                Ok(receipt)
            }
            None if cancelled => Err(TxError::Cancelled { operation }),
            None => Err(TxError::Timeout { operation }),
        }
    }

    /// Run both paths until one of them observes the receipt
    async fn race(&self, filter_id: U256) {
        let immediate = Box::pin(self.check(Trigger::Immediate));
        let watch = Box::pin(self.watch(filter_id));

        if let Either::Left(((), watch)) = future::select(immediate, watch).await {
            if !self.is_resolved() {
                watch.await;
            }
        }
    }

    /// Poll the block filter, checking for the receipt whenever blocks arrive
    async fn watch(&self, filter_id: U256) {
        loop {
            tokio::time::sleep(self.params.poll_interval).await;
            if self.is_resolved() {
                return;
            }

            match self.provider.get_filter_changes(filter_id).await {
                Ok(blocks) if blocks.is_empty() => {}
                Ok(blocks) => {
                    trace!("{} new block(s) while waiting for {:?}", blocks.len(), self.tx_hash);
                    self.check(Trigger::NewBlock).await;
                }
                Err(e) => {
                    // a lost filter must not stall the wait
                    debug!("Failed to poll block filter {}: {}", filter_id, e);
                    crate::metrics::record_receipt_poll_error();
                    self.check(Trigger::NewBlock).await;
                }
            }

            if self.is_resolved() {
                return;
            }
        }
    }

    /// Query the receipt once. Errors and pending results leave the wait as is.
    async fn check(&self, trigger: Trigger) {
        match self.provider.get_transaction_receipt(self.tx_hash).await {
            Ok(Some(receipt)) => {
                self.resolve(receipt, trigger);
            }
            Ok(None) => trace!("Transaction {:?} not mined yet", self.tx_hash),
            Err(e) => {
                debug!("Failed to fetch receipt for {:?}: {}", self.tx_hash, e);
                crate::metrics::record_receipt_poll_error();
            }
        }
    }

    /// Latch `receipt` unless an earlier check already did. Returns whether it won.
    fn resolve(&self, receipt: TransactionReceipt, trigger: Trigger) -> bool {
        let block_number = receipt.block_number;
        let won = self.receipt.set(receipt).is_ok();
        if won {
            info!(
                "Transaction {:?} was mined in block {}.",
                self.tx_hash,
                block_number.map_or_else(|| "?".to_string(), |b| b.to_string())
            );
            crate::metrics::record_receipt_observed(trigger.label());
        }
        won
    }

    fn is_resolved(&self) -> bool {
        self.receipt.get().is_some()
    }

    async fn teardown(&self, filter_id: U256) {
        if let Err(e) = self.provider.uninstall_filter(filter_id).await {
            warn!("Failed to uninstall block filter {}: {}", filter_id, e);
        }
    }
}

/// Wait for the receipt of `tx_hash` with default parameters
pub async fn wait_for_receipt<P: RpcProvider + ?Sized>(
    tx_hash: H256,
    provider: &P,
) -> TxResult<TransactionReceipt> {
    ReceiptWaiter::new(provider, tx_hash).wait().await
}
